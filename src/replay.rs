//! Canned query executor.
//!
//! A replay fixture is a JSON document pairing funnels with recorded
//! executor traffic:
//!
//! ```json
//! {
//!   "funnels": [{"id": "7", "percentage": 10.0, "approvedAt": 1700000000000}],
//!   "executions": [{"request": {"opcode": "count", ...}, "response": {"opcode": "count", "count": 1000}}]
//! }
//! ```
//!
//! [`ReplayExecutor`] answers a request with the response recorded for a
//! structurally equal request. It backs the `funnelx` CLI and the tests.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::backend::{ExecutorError, InMemoryFunnelStore, QueryExecutor};
use crate::model::{ActionRequest, ActionResponse, Funnel};

/// Errors that can occur when loading a replay fixture.
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Failed to read fixture: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse fixture: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One recorded executor call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayEntry {
    pub request: ActionRequest,
    pub response: ActionResponse,
}

/// Funnels plus recorded executor traffic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplayFixture {
    #[serde(default)]
    pub funnels: Vec<Funnel>,
    #[serde(default)]
    pub executions: Vec<ReplayEntry>,
}

impl ReplayFixture {
    pub fn load_from(path: &Path) -> Result<Self, FixtureError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn record(&mut self, request: ActionRequest, response: ActionResponse) {
        self.executions.push(ReplayEntry { request, response });
    }

    /// Split into a funnel store and an executor.
    pub fn into_parts(self) -> (InMemoryFunnelStore, ReplayExecutor) {
        (
            InMemoryFunnelStore::with_funnels(self.funnels),
            ReplayExecutor::new(self.executions),
        )
    }
}

/// Executor serving recorded responses.
#[derive(Debug, Default)]
pub struct ReplayExecutor {
    entries: Vec<ReplayEntry>,
    calls: AtomicUsize,
}

impl ReplayExecutor {
    pub fn new(entries: Vec<ReplayEntry>) -> Self {
        Self {
            entries,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `execute` calls served or refused so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl QueryExecutor for ReplayExecutor {
    fn execute(&self, request: &ActionRequest) -> Result<ActionResponse, ExecutorError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        match self.entries.iter().find(|entry| entry.request == *request) {
            Some(entry) => {
                debug!(kind = %request.kind(), "Replaying recorded response");
                Ok(entry.response.clone())
            }
            None => Err(ExecutorError::NoReplay {
                kind: request.kind(),
                table: request.table().unwrap_or_default().to_string(),
            }),
        }
    }
}
