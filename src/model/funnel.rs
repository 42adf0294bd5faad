//! Funnel definitions as handed out by the funnel store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::filter::FilterValue;

/// A saved sampling configuration.
///
/// `percentage` is the share of base events that were sampled into the
/// funnel, in `(0, 100]`. `approved_at` is the instant from which the
/// sampling rule applies; base-event queries never look earlier than it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Funnel {
    pub id: String,
    /// Display name, reported alongside the id in factor logs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub percentage: f64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub approved_at: DateTime<Utc>,
    /// Event type the funnel was defined for. Metadata only: base-event
    /// queries count `ExtrapolationConfig::base_event_type`, never this.
    #[serde(default)]
    pub event_type: String,
}

impl Funnel {
    pub fn new(
        id: impl Into<String>,
        percentage: f64,
        approved_at: DateTime<Utc>,
        event_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: None,
            percentage,
            approved_at,
            event_type: event_type.into(),
        }
    }

    /// Approval instant in epoch milliseconds.
    pub fn approved_at_ms(&self) -> i64 {
        self.approved_at.timestamp_millis()
    }

    /// Value used when filtering events by funnel id.
    ///
    /// Funnel ids are numeric in practice and are compared numerically by
    /// the backend; a non-numeric id is passed through as text.
    pub fn id_filter_value(&self) -> FilterValue {
        match self.id.trim().parse::<i64>() {
            Ok(n) => FilterValue::Int(n),
            Err(_) => FilterValue::Text(self.id.clone()),
        }
    }
}
