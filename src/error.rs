//! Error taxonomy of the extrapolation engine.
//!
//! Shape mismatches and zero denominators are deliberately absent: both
//! degrade locally (section left unscaled, identity factor) instead of
//! failing the call.

use thiserror::Error;

use crate::backend::{ExecutorError, StoreError};
use crate::model::ActionKind;

/// Errors raised while extrapolating a response.
#[derive(Error, Debug)]
pub enum ExtrapolationError {
    #[error("funnel '{id}' not found in funnel store")]
    MissingFunnel { id: String },

    #[error("cannot resolve funnel for request: {0}")]
    FunnelNotResolvable(String),

    #[error("{kind} request has no table to count base events in")]
    NoTable { kind: ActionKind },

    #[error("{response} response cannot be extrapolated against a {request} request")]
    RequestMismatch {
        request: ActionKind,
        response: ActionKind,
    },

    #[error("executor returned a {actual} response where {expected} was expected")]
    UnexpectedResponse {
        expected: ActionKind,
        actual: ActionKind,
    },

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convenience alias.
pub type ExtrapolationResult<T> = std::result::Result<T, ExtrapolationError>;
