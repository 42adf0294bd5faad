//! Materialized analytics results, one shape per request kind.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::request::ActionKind;

// ---------------------------------------------------------------------------
// Number
// ---------------------------------------------------------------------------

/// A numeric value that remembers whether it was integral.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(n) => n as f64,
            Self::Float(x) => x,
        }
    }

    /// Integral part, truncated toward zero.
    pub fn as_i64(self) -> i64 {
        match self {
            Self::Int(n) => n,
            Self::Float(x) => x as i64,
        }
    }

    /// Multiply by `factor`, keeping the numeric kind. Integers truncate.
    pub fn scaled(self, factor: f64) -> Self {
        match self {
            Self::Int(n) => Self::Int((n as f64 * factor) as i64),
            Self::Float(x) => Self::Float(x * factor),
        }
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for Number {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

// ---------------------------------------------------------------------------
// Bucketed payloads
// ---------------------------------------------------------------------------

/// One time bucket of a histogram or trend series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketCount {
    /// Bucket start in epoch milliseconds.
    pub period: i64,
    pub count: i64,
}

impl BucketCount {
    pub fn new(period: i64, count: i64) -> Self {
        Self { period, count }
    }
}

/// Aggregate statistics of a field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsValue {
    #[serde(default)]
    pub stats: BTreeMap<String, Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentiles: Option<BTreeMap<String, f64>>,
}

/// Aggregate statistics of one time bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsTrendValue {
    pub period: i64,
    #[serde(default)]
    pub stats: BTreeMap<String, Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentiles: Option<BTreeMap<String, f64>>,
}

/// A nested group-by bucket of a stats result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketResponse<T> {
    pub key: String,
    pub result: T,
    #[serde(default)]
    pub buckets: Vec<BucketResponse<T>>,
}

// ---------------------------------------------------------------------------
// Group trees
// ---------------------------------------------------------------------------

/// A group-by result keyed by the first nesting field.
pub type GroupTree = BTreeMap<String, GroupValue>;

/// A group-by value: a count at the deepest nesting level, or another level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupValue {
    Leaf(Number),
    Node(GroupTree),
}

// ---------------------------------------------------------------------------
// Per-kind responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistogramResponse {
    #[serde(default)]
    pub counts: Vec<BucketCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    #[serde(default)]
    pub documents: Vec<serde_json::Value>,
    #[serde(default)]
    pub total_hits: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistinctResponse {
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub result: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsResponse {
    pub result: StatsValue,
    #[serde(default)]
    pub buckets: Vec<BucketResponse<StatsValue>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsTrendResponse {
    #[serde(default)]
    pub result: Vec<StatsTrendValue>,
    #[serde(default)]
    pub buckets: Vec<BucketResponse<Vec<StatsTrendValue>>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendResponse {
    /// Independent series keyed by a value of the trended field.
    #[serde(default)]
    pub trends: BTreeMap<String, Vec<BucketCount>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupResponse {
    #[serde(default)]
    pub result: GroupTree,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiQueryResponse {
    #[serde(default)]
    pub responses: BTreeMap<String, ActionResponse>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiTimeQueryResponse {
    #[serde(default)]
    pub responses: BTreeMap<String, ActionResponse>,
}

// ---------------------------------------------------------------------------
// ActionResponse
// ---------------------------------------------------------------------------

/// Any analytics result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "opcode", rename_all = "camelCase")]
pub enum ActionResponse {
    Count(CountResponse),
    Histogram(HistogramResponse),
    Stats(StatsResponse),
    StatsTrend(StatsTrendResponse),
    Trend(TrendResponse),
    Group(GroupResponse),
    Query(QueryResponse),
    Distinct(DistinctResponse),
    MultiQuery(MultiQueryResponse),
    MultiTimeQuery(MultiTimeQueryResponse),
}

impl ActionResponse {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Count(_) => ActionKind::Count,
            Self::Histogram(_) => ActionKind::Histogram,
            Self::Stats(_) => ActionKind::Stats,
            Self::StatsTrend(_) => ActionKind::StatsTrend,
            Self::Trend(_) => ActionKind::Trend,
            Self::Group(_) => ActionKind::Group,
            Self::Query(_) => ActionKind::Query,
            Self::Distinct(_) => ActionKind::Distinct,
            Self::MultiQuery(_) => ActionKind::MultiQuery,
            Self::MultiTimeQuery(_) => ActionKind::MultiTimeQuery,
        }
    }
}
