//! Seams to the collaborators the engine does not own.
//!
//! - [`QueryExecutor`] runs analytics requests (the base-event queries).
//! - [`FunnelStore`] resolves funnel ids to definitions.
//!
//! Both are synchronous; cancellation and timeouts are the implementor's
//! business and surface here only as errors.

use std::collections::HashMap;

use parking_lot::RwLock;
use thiserror::Error;

use crate::model::{ActionKind, ActionRequest, ActionResponse, Funnel};

// ---------------------------------------------------------------------------
// Query executor
// ---------------------------------------------------------------------------

/// Failure reported by a [`QueryExecutor`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutorError {
    #[error("query execution failed: {0}")]
    Failed(String),

    #[error("query timed out: {0}")]
    Timeout(String),

    #[error("no recorded response for {kind} request on table '{table}'")]
    NoReplay { kind: ActionKind, table: String },
}

/// Runs analytics requests.
///
/// Implementors must answer a request with the response variant of the same
/// kind; the engine treats anything else as
/// [`ExtrapolationError::UnexpectedResponse`](crate::ExtrapolationError::UnexpectedResponse).
pub trait QueryExecutor: Send + Sync {
    fn execute(&self, request: &ActionRequest) -> Result<ActionResponse, ExecutorError>;
}

impl<F> QueryExecutor for F
where
    F: Fn(&ActionRequest) -> Result<ActionResponse, ExecutorError> + Send + Sync,
{
    fn execute(&self, request: &ActionRequest) -> Result<ActionResponse, ExecutorError> {
        self(request)
    }
}

// ---------------------------------------------------------------------------
// Funnel store
// ---------------------------------------------------------------------------

/// Failure reported by a [`FunnelStore`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("funnel store unavailable: {0}")]
    Unavailable(String),

    #[error("funnel '{id}' is corrupt: {reason}")]
    Corrupt { id: String, reason: String },
}

/// Resolves funnel ids. `Ok(None)` means the id is unknown.
pub trait FunnelStore: Send + Sync {
    fn get_by_funnel_id(&self, id: &str) -> Result<Option<Funnel>, StoreError>;
}

/// Funnel store backed by a map, for embedding and tests.
#[derive(Debug, Default)]
pub struct InMemoryFunnelStore {
    funnels: RwLock<HashMap<String, Funnel>>,
}

impl InMemoryFunnelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_funnels(funnels: impl IntoIterator<Item = Funnel>) -> Self {
        let store = Self::new();
        for funnel in funnels {
            store.insert(funnel);
        }
        store
    }

    /// Insert or replace a funnel, returning the previous definition.
    pub fn insert(&self, funnel: Funnel) -> Option<Funnel> {
        self.funnels.write().insert(funnel.id.clone(), funnel)
    }

    pub fn remove(&self, id: &str) -> Option<Funnel> {
        self.funnels.write().remove(id)
    }

    pub fn len(&self) -> usize {
        self.funnels.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.funnels.read().is_empty()
    }
}

impl FunnelStore for InMemoryFunnelStore {
    fn get_by_funnel_id(&self, id: &str) -> Result<Option<Funnel>, StoreError> {
        Ok(self.funnels.read().get(id).cloned())
    }
}
