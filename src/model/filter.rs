//! Filter predicates.
//!
//! Requests carry an ordered list of filters. The engine never evaluates
//! them; it only copies the temporal ones onto the base-event queries it
//! synthesizes and appends a few filters of its own.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A scalar operand of a filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl FilterValue {
    /// Render the value as an identifier (used for funnel ids).
    ///
    /// Integral floats render without a fractional part so `7.0` and `7`
    /// name the same funnel.
    pub fn as_identifier(&self) -> Option<String> {
        match self {
            Self::Int(n) => Some(n.to_string()),
            Self::Float(x) if x.fract() == 0.0 && x.is_finite() => Some(format!("{}", *x as i64)),
            Self::Text(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for FilterValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// Comparison applied by a filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operator", rename_all = "snake_case")]
pub enum FilterOp {
    Equals { value: FilterValue },
    NotEquals { value: FilterValue },
    GreaterThan { value: FilterValue },
    GreaterEqual { value: FilterValue },
    LessThan { value: FilterValue },
    LessEqual { value: FilterValue },
    Between { from: FilterValue, to: FilterValue },
    In { values: Vec<FilterValue> },
    /// Trailing time window ending now.
    Last {
        #[serde(rename = "durationMs")]
        duration_ms: i64,
    },
}

impl FilterOp {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Equals { .. } => "equals",
            Self::NotEquals { .. } => "not_equals",
            Self::GreaterThan { .. } => "greater_than",
            Self::GreaterEqual { .. } => "greater_equal",
            Self::LessThan { .. } => "less_than",
            Self::LessEqual { .. } => "less_equal",
            Self::Between { .. } => "between",
            Self::In { .. } => "in",
            Self::Last { .. } => "last",
        }
    }
}

/// A single predicate on a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    #[serde(flatten)]
    pub op: FilterOp,
    /// Whether the predicate bounds event time.
    #[serde(default)]
    pub temporal: bool,
}

impl Filter {
    pub fn new(field: impl Into<String>, op: FilterOp) -> Self {
        Self {
            field: field.into(),
            op,
            temporal: false,
        }
    }

    pub fn equals(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(
            field,
            FilterOp::Equals {
                value: value.into(),
            },
        )
    }

    pub fn greater_equal(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(
            field,
            FilterOp::GreaterEqual {
                value: value.into(),
            },
        )
    }

    pub fn between(
        field: impl Into<String>,
        from: impl Into<FilterValue>,
        to: impl Into<FilterValue>,
    ) -> Self {
        Self::new(
            field,
            FilterOp::Between {
                from: from.into(),
                to: to.into(),
            },
        )
    }

    pub fn last(field: impl Into<String>, duration_ms: i64) -> Self {
        Self::new(field, FilterOp::Last { duration_ms }).temporal()
    }

    /// Mark the filter as bounding event time.
    pub fn temporal(mut self) -> Self {
        self.temporal = true;
        self
    }

    pub fn is_temporal(&self) -> bool {
        self.temporal
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.op {
            FilterOp::Equals { value } => write!(f, "{} = {value}", self.field),
            FilterOp::NotEquals { value } => write!(f, "{} != {value}", self.field),
            FilterOp::GreaterThan { value } => write!(f, "{} > {value}", self.field),
            FilterOp::GreaterEqual { value } => write!(f, "{} >= {value}", self.field),
            FilterOp::LessThan { value } => write!(f, "{} < {value}", self.field),
            FilterOp::LessEqual { value } => write!(f, "{} <= {value}", self.field),
            FilterOp::Between { from, to } => {
                write!(f, "{} BETWEEN {from} AND {to}", self.field)
            }
            FilterOp::In { values } => {
                let rendered: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "{} IN ({})", self.field, rendered.join(", "))
            }
            FilterOp::Last { duration_ms } => write!(f, "{} LAST {duration_ms}ms", self.field),
        }
    }
}
