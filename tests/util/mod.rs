use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{TimeZone, Utc};
use funnel_extrapolation::model::{
    ActionRequest, ActionResponse, BucketCount, CountResponse, Filter, FilterOp, Funnel,
    HistogramResponse,
};
use funnel_extrapolation::{ExecutorError, ExtrapolationConfig, InMemoryFunnelStore, QueryExecutor};

#[allow(dead_code)]
pub const FUNNEL_FIELD: &str = "eventData.funnelInfo.funnelId";
#[allow(dead_code)]
pub const APPROVED_AT_MS: i64 = 1_700_000_000_000;

/// Captures tracing output for tests.
#[allow(dead_code)]
pub struct TestTracing {
    buffer: std::sync::Arc<std::sync::Mutex<Vec<u8>>>,
}

#[allow(dead_code)]
impl TestTracing {
    pub fn new() -> Self {
        Self {
            buffer: std::sync::Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.buffer.clone();
        let make_writer = move || TestWriter(writer.clone());
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .without_time()
            .with_writer(make_writer)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn output(&self) -> String {
        let buf = self.buffer.lock().unwrap();
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Assert that the captured log output contains the provided substring.
    pub fn assert_contains(&self, needle: &str) {
        let out = self.output();
        assert!(
            out.contains(needle),
            "expected logs to contain `{needle}`, got:\n{out}"
        );
    }
}

struct TestWriter(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for TestWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut guard = self.0.lock().unwrap();
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[allow(dead_code)]
pub fn funnel(id: &str, percentage: f64) -> Funnel {
    let approved = Utc.timestamp_millis_opt(APPROVED_AT_MS).single().unwrap();
    Funnel::new(id, percentage, approved, "APP_LOADED")
}

#[allow(dead_code)]
pub fn store(funnels: impl IntoIterator<Item = Funnel>) -> InMemoryFunnelStore {
    InMemoryFunnelStore::with_funnels(funnels)
}

#[allow(dead_code)]
pub fn funnel_filter(id: i64) -> Filter {
    Filter::equals(FUNNEL_FIELD, id)
}

/// Funnel id of a funnel-scoped base query, `None` for a total query.
#[allow(dead_code)]
pub fn scoped_funnel(request: &ActionRequest) -> Option<String> {
    let config = ExtrapolationConfig::default();
    request.filters().iter().find_map(|f| match &f.op {
        FilterOp::GreaterEqual { value } if f.field == config.funnel_id_field => {
            value.as_identifier()
        }
        _ => None,
    })
}

/// Executor answering base-event queries from per-funnel tables.
///
/// Total queries get `total_*`; scoped queries get the entry for their
/// funnel id. Every request is recorded.
#[allow(dead_code)]
#[derive(Default)]
pub struct ScriptedExecutor {
    pub total_count: i64,
    pub scoped_counts: HashMap<String, i64>,
    pub total_histogram: Vec<i64>,
    pub scoped_histograms: HashMap<String, Vec<i64>>,
    pub requests: Mutex<Vec<ActionRequest>>,
}

#[allow(dead_code)]
impl ScriptedExecutor {
    pub fn counts(total: i64, scoped: &[(&str, i64)]) -> Self {
        Self {
            total_count: total,
            scoped_counts: scoped.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            ..Default::default()
        }
    }

    pub fn histograms(total: &[i64], scoped: &[(&str, Vec<i64>)]) -> Self {
        Self {
            total_histogram: total.to_vec(),
            scoped_histograms: scoped
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn recorded(&self) -> Vec<ActionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

fn bucketed(counts: &[i64]) -> ActionResponse {
    ActionResponse::Histogram(HistogramResponse {
        counts: counts
            .iter()
            .enumerate()
            .map(|(i, c)| BucketCount::new(i as i64 * 86_400_000, *c))
            .collect(),
    })
}

impl QueryExecutor for ScriptedExecutor {
    fn execute(&self, request: &ActionRequest) -> Result<ActionResponse, ExecutorError> {
        self.requests.lock().unwrap().push(request.clone());
        let scope = scoped_funnel(request);
        match (request, scope) {
            (ActionRequest::Count(_), None) => Ok(ActionResponse::Count(CountResponse {
                count: self.total_count,
            })),
            (ActionRequest::Count(_), Some(id)) => Ok(ActionResponse::Count(CountResponse {
                count: self.scoped_counts.get(&id).copied().unwrap_or(0),
            })),
            (ActionRequest::Histogram(_), None) => Ok(bucketed(&self.total_histogram)),
            (ActionRequest::Histogram(_), Some(id)) => Ok(bucketed(
                self.scoped_histograms
                    .get(&id)
                    .map(Vec::as_slice)
                    .unwrap_or_default(),
            )),
            (other, _) => Err(ExecutorError::Failed(format!(
                "scripted executor cannot answer {}",
                other.kind()
            ))),
        }
    }
}
