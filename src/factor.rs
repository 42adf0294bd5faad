//! Extrapolation factors from base-event counts.
//!
//! For a funnel sampled at `p` percent, with `T` base events in the window
//! and `F` of them carrying the funnel id:
//!
//! ```text
//! factor = (T / F) * (100 / p)      F > 0
//! factor = 1.0                      F = 0
//! ```
//!
//! A scalar factor costs two count queries; a bucketed factor sequence costs
//! two histogram queries.

use serde::Serialize;
use tracing::{debug, error, info};

use crate::backend::QueryExecutor;
use crate::base_query::{BaseEventQuery, Scope};
use crate::config::ExtrapolationConfig;
use crate::error::{ExtrapolationError, ExtrapolationResult};
use crate::model::{ActionKind, ActionRequest, ActionResponse, BucketCount, Funnel, Period};

/// Factor used when nothing can be inferred.
pub const IDENTITY: f64 = 1.0;

/// A multiplicative correction tied to one time bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtrapolationFactor {
    /// Bucket start in epoch milliseconds.
    pub bucket_key: i64,
    pub scale: f64,
}

impl ExtrapolationFactor {
    pub fn bucket(bucket_key: i64, scale: f64) -> Self {
        Self {
            bucket_key,
            scale,
        }
    }
}

/// `(total / scoped) * (100 / percentage)`, or [`IDENTITY`] when `scoped == 0`.
pub fn scale_ratio(total: i64, scoped: i64, percentage: f64) -> f64 {
    if scoped == 0 {
        return IDENTITY;
    }
    (total as f64 / scoped as f64) * (100.0 / percentage)
}

/// Computes factors by issuing base-event queries.
#[derive(Clone, Copy)]
pub struct FactorCalculator<'a> {
    executor: &'a dyn QueryExecutor,
    config: &'a ExtrapolationConfig,
}

impl<'a> FactorCalculator<'a> {
    pub fn new(executor: &'a dyn QueryExecutor, config: &'a ExtrapolationConfig) -> Self {
        Self { executor, config }
    }

    /// One factor for the whole response of `request`.
    pub fn compute_scalar_factor(
        &self,
        request: &ActionRequest,
        funnel: &Funnel,
    ) -> ExtrapolationResult<f64> {
        let table = request.table().ok_or(ExtrapolationError::NoTable {
            kind: request.kind(),
        })?;
        let query = BaseEventQuery::new(self.config, funnel, request.filters());

        let total = self.execute_count(&query.count_request(table, Scope::Total))?;
        let scoped = self.execute_count(&query.count_request(table, Scope::Funnel))?;

        let factor = scale_ratio(total, scoped, funnel.percentage);
        info!(
            funnel_id = %funnel.id,
            funnel_name = funnel.name.as_deref().unwrap_or_default(),
            total,
            scoped,
            percentage = funnel.percentage,
            factor,
            "Computed extrapolation factor"
        );
        Ok(factor)
    }

    /// One factor per time bucket of `field` at `period` granularity.
    ///
    /// Returns an empty sequence when the two base histograms disagree in
    /// length, which no non-empty response can align with.
    pub fn compute_bucketed_factors(
        &self,
        request: &ActionRequest,
        table: &str,
        field: &str,
        period: Period,
        funnel: &Funnel,
    ) -> ExtrapolationResult<Vec<ExtrapolationFactor>> {
        let query = BaseEventQuery::new(self.config, funnel, request.filters());
        let (total_request, scoped_request) = query.histogram_pair(table, field, period);

        let totals = self.execute_histogram(&total_request)?;
        let scoped = self.execute_histogram(&scoped_request)?;

        if totals.len() != scoped.len() {
            error!(
                funnel_id = %funnel.id,
                table,
                field,
                %period,
                total_buckets = totals.len(),
                scoped_buckets = scoped.len(),
                "Base event histograms differ in length; cannot align extrapolation factors"
            );
            return Ok(Vec::new());
        }

        let factors: Vec<ExtrapolationFactor> = totals
            .iter()
            .zip(&scoped)
            .map(|(total, funnel_count)| {
                ExtrapolationFactor::bucket(
                    total.period,
                    scale_ratio(total.count, funnel_count.count, funnel.percentage),
                )
            })
            .collect();
        info!(
            funnel_id = %funnel.id,
            funnel_name = funnel.name.as_deref().unwrap_or_default(),
            table,
            %period,
            buckets = factors.len(),
            "Computed bucketed extrapolation factors"
        );
        Ok(factors)
    }

    fn execute_count(&self, request: &ActionRequest) -> ExtrapolationResult<i64> {
        debug!(filters = ?request.filters(), "Executing base event count");
        match self.executor.execute(request)? {
            ActionResponse::Count(response) => Ok(response.count),
            other => Err(ExtrapolationError::UnexpectedResponse {
                expected: ActionKind::Count,
                actual: other.kind(),
            }),
        }
    }

    fn execute_histogram(&self, request: &ActionRequest) -> ExtrapolationResult<Vec<BucketCount>> {
        debug!(filters = ?request.filters(), "Executing base event histogram");
        match self.executor.execute(request)? {
            ActionResponse::Histogram(response) => Ok(response.counts),
            other => Err(ExtrapolationError::UnexpectedResponse {
                expected: ActionKind::Histogram,
                actual: other.kind(),
            }),
        }
    }
}
