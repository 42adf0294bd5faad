//! Construction of the synthetic "base event" queries.
//!
//! A base query counts occurrences of the configured base event inside the
//! time window of the original request, never earlier than the funnel's
//! approval. Its funnel-scoped twin additionally keeps only events that
//! carry the funnel id. Filter order:
//!
//! 1. `eventType = <base event type>`
//! 2. temporal filters of the original request, in their original order
//! 3. `timestamp >= approvedAt` (temporal)
//! 4. non-temporal filters on date-derived fields of the original request
//! 5. scoped queries only: `funnelId >= <funnel id>`

use crate::config::ExtrapolationConfig;
use crate::model::{
    ActionRequest, CountRequest, Filter, Funnel, HistogramRequest, Period,
};

/// Prefix of fields derived from event time (`date.hourOfDay`, ...).
pub const DATE_FIELD_PREFIX: &str = "date.";

/// Date-derived fields whose filters bound event time without being flagged
/// temporal.
pub const DATE_FIELDS: [&str; 8] = [
    "year",
    "monthOfYear",
    "weekOfYear",
    "dayOfMonth",
    "dayOfWeek",
    "hourOfDay",
    "minuteOfHour",
    "minuteOfDay",
];

pub fn is_date_field(field: &str) -> bool {
    field
        .strip_prefix(DATE_FIELD_PREFIX)
        .is_some_and(|rest| DATE_FIELDS.contains(&rest))
}

/// Population a base query counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every base event.
    Total,
    /// Only base events sampled into the funnel.
    Funnel,
}

/// Builder for the base-event queries of one funnel and one original request.
#[derive(Debug, Clone, Copy)]
pub struct BaseEventQuery<'a> {
    config: &'a ExtrapolationConfig,
    funnel: &'a Funnel,
    request_filters: &'a [Filter],
}

impl<'a> BaseEventQuery<'a> {
    pub fn new(
        config: &'a ExtrapolationConfig,
        funnel: &'a Funnel,
        request_filters: &'a [Filter],
    ) -> Self {
        Self {
            config,
            funnel,
            request_filters,
        }
    }

    /// Filters for the given population.
    pub fn filters(&self, scope: Scope) -> Vec<Filter> {
        let mut filters = vec![Filter::equals(
            self.config.event_type_field.as_str(),
            self.config.base_event_type.as_str(),
        )];
        filters.extend(
            self.request_filters
                .iter()
                .filter(|f| f.is_temporal())
                .cloned(),
        );
        filters.push(self.approval_filter());
        filters.extend(
            self.request_filters
                .iter()
                .filter(|f| !f.is_temporal() && is_date_field(&f.field))
                .cloned(),
        );
        if scope == Scope::Funnel {
            filters.push(self.funnel_id_filter());
        }
        filters
    }

    pub fn approval_filter(&self) -> Filter {
        Filter::greater_equal(
            self.config.timestamp_field.as_str(),
            self.funnel.approved_at_ms(),
        )
        .temporal()
    }

    pub fn funnel_id_filter(&self) -> Filter {
        Filter::greater_equal(
            self.config.funnel_id_field.as_str(),
            self.funnel.id_filter_value(),
        )
    }

    pub fn count_request(&self, table: &str, scope: Scope) -> ActionRequest {
        ActionRequest::Count(CountRequest::new(table, self.filters(scope)))
    }

    pub fn histogram_request(
        &self,
        table: &str,
        field: &str,
        period: Period,
        scope: Scope,
    ) -> ActionRequest {
        ActionRequest::Histogram(HistogramRequest::new(
            table,
            self.filters(scope),
            field,
            period,
        ))
    }

    /// The `(total, funnel)` histogram pair.
    ///
    /// Both requests share table, field and period, so the backend buckets
    /// them identically and their results can be matched by position.
    pub fn histogram_pair(
        &self,
        table: &str,
        field: &str,
        period: Period,
    ) -> (ActionRequest, ActionRequest) {
        (
            self.histogram_request(table, field, period, Scope::Total),
            self.histogram_request(table, field, period, Scope::Funnel),
        )
    }
}
