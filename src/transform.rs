//! Response dispatcher.
//!
//! [`ResponseTransformer`] matches on the response variant and applies the
//! rule for that shape:
//!
//! | response | factor | rule |
//! |---|---|---|
//! | count | scalar | `trunc(count * f)` |
//! | histogram | bucketed on `field` | per index, only when lengths agree |
//! | stats | scalar | field policy on the stat map and every nested bucket |
//! | stats trend | bucketed on `timestamp` | field policy per index, nested buckets reuse the sequence |
//! | trend | bucketed on `timestamp` | per series, per index, only when that series aligns |
//! | group | scalar | every leaf of the tree |
//! | query / distinct | none | untouched |
//! | multi query | per key | each sub-response against its own sub-request |
//! | multi time query | none | untouched |
//!
//! Funnels and factors are resolved fresh on every visit; nothing is cached.

use tracing::warn;

use crate::align::{Alignment, align};
use crate::backend::{FunnelStore, QueryExecutor};
use crate::config::{ExtrapolationConfig, MissingFunnelPolicy};
use crate::error::{ExtrapolationError, ExtrapolationResult};
use crate::factor::{ExtrapolationFactor, FactorCalculator};
use crate::funnel_id::ensure_funnel_id;
use crate::model::{
    ActionKind, ActionRequest, ActionResponse, BucketCount, BucketResponse, CountResponse, Funnel,
    GroupResponse, HistogramResponse, MultiQueryResponse, StatsResponse, StatsTrendResponse,
    StatsTrendValue, StatsValue, TrendResponse,
};
use crate::policy::{extrapolate_stats, scale_count};
use crate::tree::scale_tree;

/// Extrapolates responses produced for one request.
#[derive(Clone, Copy)]
pub struct ResponseTransformer<'a> {
    request: &'a ActionRequest,
    executor: &'a dyn QueryExecutor,
    store: &'a dyn FunnelStore,
    config: &'a ExtrapolationConfig,
}

impl<'a> ResponseTransformer<'a> {
    pub fn new(
        request: &'a ActionRequest,
        executor: &'a dyn QueryExecutor,
        store: &'a dyn FunnelStore,
        config: &'a ExtrapolationConfig,
    ) -> Self {
        Self {
            request,
            executor,
            store,
            config,
        }
    }

    /// Extrapolate `response` and hand it back.
    pub fn transform(&self, mut response: ActionResponse) -> ExtrapolationResult<ActionResponse> {
        self.transform_in_place(&mut response)?;
        Ok(response)
    }

    /// Extrapolate `response` in place.
    ///
    /// On error the response may be partially scaled (only possible inside
    /// a multi query, where earlier keys were already processed).
    pub fn transform_in_place(&self, response: &mut ActionResponse) -> ExtrapolationResult<()> {
        match response {
            ActionResponse::Count(count) => self.count(count),
            ActionResponse::Histogram(histogram) => self.histogram(histogram),
            ActionResponse::Stats(stats) => self.stats(stats),
            ActionResponse::StatsTrend(trend) => self.stats_trend(trend),
            ActionResponse::Trend(trend) => self.trend(trend),
            ActionResponse::Group(group) => self.group(group),
            // Raw documents and distinct values have no count semantics.
            ActionResponse::Query(_) | ActionResponse::Distinct(_) => Ok(()),
            ActionResponse::MultiQuery(batch) => self.multi_query(batch),
            // Windowed replays are not extrapolated yet; returned as sampled.
            ActionResponse::MultiTimeQuery(_) => Ok(()),
        }
    }

    fn calculator(&self) -> FactorCalculator<'a> {
        FactorCalculator::new(self.executor, self.config)
    }

    /// Look up the request's funnel, applying the missing-funnel policy.
    fn resolve_funnel(&self) -> ExtrapolationResult<Option<Funnel>> {
        let id = ensure_funnel_id(self.request, &self.config.funnel_id_field)?;
        match self.store.get_by_funnel_id(&id)? {
            Some(funnel) => Ok(Some(funnel)),
            None => match self.config.missing_funnel {
                MissingFunnelPolicy::Reject => Err(ExtrapolationError::MissingFunnel { id }),
                MissingFunnelPolicy::Bypass => {
                    warn!(
                        funnel_id = %id,
                        kind = %self.request.kind(),
                        "Funnel not found; returning sampled response unscaled"
                    );
                    Ok(None)
                }
            },
        }
    }

    fn mismatch(&self, response: ActionKind) -> ExtrapolationError {
        ExtrapolationError::RequestMismatch {
            request: self.request.kind(),
            response,
        }
    }

    // -----------------------------------------------------------------------
    // Scalar-factor shapes
    // -----------------------------------------------------------------------

    fn count(&self, response: &mut CountResponse) -> ExtrapolationResult<()> {
        let Some(funnel) = self.resolve_funnel()? else {
            return Ok(());
        };
        let factor = self.calculator().compute_scalar_factor(self.request, &funnel)?;
        response.count = scale_count(response.count, factor);
        Ok(())
    }

    fn stats(&self, response: &mut StatsResponse) -> ExtrapolationResult<()> {
        let Some(funnel) = self.resolve_funnel()? else {
            return Ok(());
        };
        let factor = self.calculator().compute_scalar_factor(self.request, &funnel)?;
        extrapolate_stats(&mut response.result.stats, factor);
        scale_stats_buckets(&mut response.buckets, factor);
        Ok(())
    }

    fn group(&self, response: &mut GroupResponse) -> ExtrapolationResult<()> {
        let Some(funnel) = self.resolve_funnel()? else {
            return Ok(());
        };
        let factor = self.calculator().compute_scalar_factor(self.request, &funnel)?;
        scale_tree(&mut response.result, factor);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Bucketed-factor shapes
    // -----------------------------------------------------------------------

    fn histogram(&self, response: &mut HistogramResponse) -> ExtrapolationResult<()> {
        let ActionRequest::Histogram(request) = self.request else {
            return Err(self.mismatch(ActionKind::Histogram));
        };
        let Some(funnel) = self.resolve_funnel()? else {
            return Ok(());
        };
        let factors = self.calculator().compute_bucketed_factors(
            self.request,
            &request.table,
            &request.field,
            request.period,
            &funnel,
        )?;
        scale_bucket_counts(&mut response.counts, &factors, "histogram");
        Ok(())
    }

    fn stats_trend(&self, response: &mut StatsTrendResponse) -> ExtrapolationResult<()> {
        let ActionRequest::StatsTrend(request) = self.request else {
            return Err(self.mismatch(ActionKind::StatsTrend));
        };
        let Some(funnel) = self.resolve_funnel()? else {
            return Ok(());
        };
        let factors = self.calculator().compute_bucketed_factors(
            self.request,
            &request.table,
            &request.timestamp,
            request.period,
            &funnel,
        )?;
        scale_trend_values(&mut response.result, &factors, "stats trend");
        scale_stats_trend_buckets(&mut response.buckets, &factors);
        Ok(())
    }

    fn trend(&self, response: &mut TrendResponse) -> ExtrapolationResult<()> {
        let ActionRequest::Trend(request) = self.request else {
            return Err(self.mismatch(ActionKind::Trend));
        };
        let Some(funnel) = self.resolve_funnel()? else {
            return Ok(());
        };
        let factors = self.calculator().compute_bucketed_factors(
            self.request,
            &request.table,
            &request.timestamp,
            request.period,
            &funnel,
        )?;
        for (series, counts) in response.trends.iter_mut() {
            scale_bucket_counts(counts, &factors, series);
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Batches
    // -----------------------------------------------------------------------

    fn multi_query(&self, response: &mut MultiQueryResponse) -> ExtrapolationResult<()> {
        let ActionRequest::MultiQuery(batch) = self.request else {
            return Err(self.mismatch(ActionKind::MultiQuery));
        };
        for (key, sub_response) in response.responses.iter_mut() {
            let Some(sub_request) = batch.requests.get(key) else {
                warn!(
                    key = %key,
                    "Batch response key has no matching request; leaving it unscaled"
                );
                continue;
            };
            ResponseTransformer {
                request: sub_request,
                ..*self
            }
            .transform_in_place(sub_response)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Section helpers
// ---------------------------------------------------------------------------

/// Zip `items` with `factors` and apply `scale` to each pair, or leave the
/// whole section untouched when the lengths differ.
fn apply_aligned<T>(
    items: &mut [T],
    factors: &[ExtrapolationFactor],
    section: &str,
    mut scale: impl FnMut(&mut T, f64),
) -> bool {
    if items.is_empty() {
        return false;
    }
    match align(items, factors) {
        Alignment::Aligned(_) => {
            for (item, factor) in items.iter_mut().zip(factors) {
                scale(item, factor.scale);
            }
            true
        }
        Alignment::Misaligned { left, right } => {
            warn!(
                section,
                buckets = left,
                factors = right,
                "Bucket and factor counts differ; leaving section unscaled"
            );
            false
        }
    }
}

fn scale_bucket_counts(counts: &mut [BucketCount], factors: &[ExtrapolationFactor], section: &str) {
    apply_aligned(counts, factors, section, |bucket, factor| {
        bucket.count = scale_count(bucket.count, factor);
    });
}

fn scale_trend_values(
    values: &mut [StatsTrendValue],
    factors: &[ExtrapolationFactor],
    section: &str,
) {
    apply_aligned(values, factors, section, |value, factor| {
        extrapolate_stats(&mut value.stats, factor);
    });
}

fn scale_stats_buckets(buckets: &mut [BucketResponse<StatsValue>], factor: f64) {
    for bucket in buckets {
        extrapolate_stats(&mut bucket.result.stats, factor);
        scale_stats_buckets(&mut bucket.buckets, factor);
    }
}

fn scale_stats_trend_buckets(
    buckets: &mut [BucketResponse<Vec<StatsTrendValue>>],
    factors: &[ExtrapolationFactor],
) {
    for bucket in buckets {
        scale_trend_values(&mut bucket.result, factors, &bucket.key);
        scale_stats_trend_buckets(&mut bucket.buckets, factors);
    }
}

/// Extrapolate `response` for `request` in one call.
pub fn extrapolate(
    request: &ActionRequest,
    response: ActionResponse,
    executor: &dyn QueryExecutor,
    store: &dyn FunnelStore,
    config: &ExtrapolationConfig,
) -> ExtrapolationResult<ActionResponse> {
    ResponseTransformer::new(request, executor, store, config).transform(response)
}
