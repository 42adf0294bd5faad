//! Analytics request kinds.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::filter::Filter;

/// Default event-time field used by bucketed requests.
pub const DEFAULT_TIMESTAMP_FIELD: &str = "_timestamp";

fn default_timestamp() -> String {
    DEFAULT_TIMESTAMP_FIELD.to_string()
}

// ---------------------------------------------------------------------------
// Kinds and periods
// ---------------------------------------------------------------------------

/// Discriminant shared by requests and responses.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    Count,
    Histogram,
    Stats,
    StatsTrend,
    Trend,
    Group,
    Query,
    Distinct,
    MultiQuery,
    MultiTimeQuery,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count => write!(f, "count"),
            Self::Histogram => write!(f, "histogram"),
            Self::Stats => write!(f, "stats"),
            Self::StatsTrend => write!(f, "statsTrend"),
            Self::Trend => write!(f, "trend"),
            Self::Group => write!(f, "group"),
            Self::Query => write!(f, "query"),
            Self::Distinct => write!(f, "distinct"),
            Self::MultiQuery => write!(f, "multiQuery"),
            Self::MultiTimeQuery => write!(f, "multiTimeQuery"),
        }
    }
}

/// Time-bucket granularity of bucketed requests.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Seconds,
    Minutes,
    Hours,
    #[default]
    Days,
    Weeks,
    Months,
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seconds => write!(f, "seconds"),
            Self::Minutes => write!(f, "minutes"),
            Self::Hours => write!(f, "hours"),
            Self::Days => write!(f, "days"),
            Self::Weeks => write!(f, "weeks"),
            Self::Months => write!(f, "months"),
        }
    }
}

// ---------------------------------------------------------------------------
// Per-kind requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountRequest {
    pub table: String,
    #[serde(default)]
    pub filters: Vec<Filter>,
    /// Count documents having this field instead of all documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default)]
    pub distinct: bool,
}

impl CountRequest {
    pub fn new(table: impl Into<String>, filters: Vec<Filter>) -> Self {
        Self {
            table: table.into(),
            filters,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramRequest {
    pub table: String,
    #[serde(default)]
    pub filters: Vec<Filter>,
    /// Event-time field the buckets are keyed on.
    #[serde(default = "default_timestamp")]
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_count_field: Option<String>,
    #[serde(default)]
    pub period: Period,
}

impl HistogramRequest {
    pub fn new(
        table: impl Into<String>,
        filters: Vec<Filter>,
        field: impl Into<String>,
        period: Period,
    ) -> Self {
        Self {
            table: table.into(),
            filters,
            field: field.into(),
            unique_count_field: None,
            period,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsRequest {
    pub table: String,
    #[serde(default)]
    pub filters: Vec<Filter>,
    pub field: String,
    /// Statistics to compute; empty means the backend default set.
    #[serde(default)]
    pub stats: Vec<String>,
    #[serde(default)]
    pub nesting: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsTrendRequest {
    pub table: String,
    #[serde(default)]
    pub filters: Vec<Filter>,
    pub field: String,
    #[serde(default)]
    pub stats: Vec<String>,
    #[serde(default)]
    pub nesting: Vec<String>,
    #[serde(default = "default_timestamp")]
    pub timestamp: String,
    #[serde(default)]
    pub period: Period,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendRequest {
    pub table: String,
    #[serde(default)]
    pub filters: Vec<Filter>,
    pub field: String,
    /// Restrict the series to these values of `field`.
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default = "default_timestamp")]
    pub timestamp: String,
    #[serde(default)]
    pub period: Period,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRequest {
    pub table: String,
    #[serde(default)]
    pub filters: Vec<Filter>,
    pub nesting: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub table: String,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub from: usize,
    #[serde(default)]
    pub limit: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistinctRequest {
    pub table: String,
    #[serde(default)]
    pub filters: Vec<Filter>,
    pub nesting: Vec<String>,
}

/// A batch of independent named requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiQueryRequest {
    pub requests: BTreeMap<String, ActionRequest>,
}

/// One request replayed over several consecutive time windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiTimeQueryRequest {
    pub request: Box<ActionRequest>,
    pub sample_size: usize,
    pub skip_duration_ms: i64,
}

// ---------------------------------------------------------------------------
// ActionRequest
// ---------------------------------------------------------------------------

/// Any analytics request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "opcode", rename_all = "camelCase")]
pub enum ActionRequest {
    Count(CountRequest),
    Histogram(HistogramRequest),
    Stats(StatsRequest),
    StatsTrend(StatsTrendRequest),
    Trend(TrendRequest),
    Group(GroupRequest),
    Query(QueryRequest),
    Distinct(DistinctRequest),
    MultiQuery(MultiQueryRequest),
    MultiTimeQuery(MultiTimeQueryRequest),
}

impl ActionRequest {
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

    /// Table the request runs against. Batch envelopes have none.
    pub fn table(&self) -> Option<&str> {
        match self {
            Self::Count(r) => Some(&r.table),
            Self::Histogram(r) => Some(&r.table),
            Self::Stats(r) => Some(&r.table),
            Self::StatsTrend(r) => Some(&r.table),
            Self::Trend(r) => Some(&r.table),
            Self::Group(r) => Some(&r.table),
            Self::Query(r) => Some(&r.table),
            Self::Distinct(r) => Some(&r.table),
            Self::MultiQuery(_) | Self::MultiTimeQuery(_) => None,
        }
    }

    /// Filters carried by the request itself (empty for batch envelopes).
    pub fn filters(&self) -> &[Filter] {
        match self {
            Self::Count(r) => &r.filters,
            Self::Histogram(r) => &r.filters,
            Self::Stats(r) => &r.filters,
            Self::StatsTrend(r) => &r.filters,
            Self::Trend(r) => &r.filters,
            Self::Group(r) => &r.filters,
            Self::Query(r) => &r.filters,
            Self::Distinct(r) => &r.filters,
            Self::MultiQuery(_) | Self::MultiTimeQuery(_) => &[],
        }
    }
}

impl From<CountRequest> for ActionRequest {
    fn from(r: CountRequest) -> Self {
        Self::Count(r)
    }
}

impl From<HistogramRequest> for ActionRequest {
    fn from(r: HistogramRequest) -> Self {
        Self::Histogram(r)
    }
}
