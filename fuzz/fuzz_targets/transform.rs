//! Fuzz target for response extrapolation.
//!
//! Decodes an arbitrary request/response pair and runs it through the
//! transformer against a backend whose base counts come from the input.
//! Any outcome other than a panic is acceptable.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use funnel_extrapolation::model::{
    ActionRequest, ActionResponse, BucketCount, CountResponse, HistogramResponse,
};
use funnel_extrapolation::{
    ExecutorError, ExtrapolationConfig, InMemoryFunnelStore, MissingFunnelPolicy, extrapolate,
};

#[derive(Arbitrary, Debug)]
struct TransformInput {
    /// Request JSON
    request: String,
    /// Response JSON
    response: String,
    total: i64,
    scoped: i64,
    /// Bucket counts of the base histograms
    total_buckets: Vec<i64>,
    scoped_buckets: Vec<i64>,
    bypass: bool,
}

fuzz_target!(|input: TransformInput| {
    let Ok(request) = serde_json::from_str::<ActionRequest>(&input.request) else {
        return;
    };
    let Ok(response) = serde_json::from_str::<ActionResponse>(&input.response) else {
        return;
    };

    let config = ExtrapolationConfig {
        missing_funnel: if input.bypass {
            MissingFunnelPolicy::Bypass
        } else {
            MissingFunnelPolicy::Reject
        },
        ..Default::default()
    };
    let funnel_field = config.funnel_id_field.clone();

    // Cap histogram sizes to keep iterations fast
    let total_buckets: Vec<i64> = input.total_buckets.into_iter().take(64).collect();
    let scoped_buckets: Vec<i64> = input.scoped_buckets.into_iter().take(64).collect();
    let executor = move |req: &ActionRequest| -> Result<ActionResponse, ExecutorError> {
        let scoped = req.filters().iter().any(|f| f.field == funnel_field);
        match req {
            ActionRequest::Count(_) => Ok(ActionResponse::Count(CountResponse {
                count: if scoped { input.scoped } else { input.total },
            })),
            ActionRequest::Histogram(_) => {
                let counts = if scoped { &scoped_buckets } else { &total_buckets };
                Ok(ActionResponse::Histogram(HistogramResponse {
                    counts: counts
                        .iter()
                        .enumerate()
                        .map(|(i, c)| BucketCount::new(i as i64, *c))
                        .collect(),
                }))
            }
            other => Err(ExecutorError::Failed(format!("unexpected {}", other.kind()))),
        }
    };

    // Every id the request could name resolves to a funnel at a fixed rate.
    let store = InMemoryFunnelStore::new();
    if let Ok(id) = funnel_extrapolation::funnel_id::ensure_funnel_id(&request, &config.funnel_id_field)
    {
        store.insert(funnel_extrapolation::model::Funnel::new(
            id,
            12.5,
            chrono::DateTime::<chrono::Utc>::UNIX_EPOCH,
            "APP_LOADED",
        ));
    }

    let _ = extrapolate(&request, response, &executor, &store, &config);
});
