//! Reconciliation errors.

use std::time::Duration;

use streamplane_api::{ApiError, ErrorCode};
use thiserror::Error;

use crate::model::ApplicationStatus;

/// Errors surfaced by the reconciliation engine.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The application does not exist remotely.
    #[error("application not found: {0}")]
    NotFound(String),

    /// The supplied version was stale; the whole pass must be retried from
    /// a fresh read.
    #[error("version conflict during {operation}: {message}")]
    VersionConflict { operation: String, message: String },

    /// The control plane rejected the request payload.
    #[error("{operation} rejected: {message}")]
    Rejected { operation: String, message: String },

    /// A retry budget or deletion deadline elapsed.
    #[error("timeout after {elapsed:?} waiting for {what}")]
    Timeout { what: String, elapsed: Duration },

    /// The requested change cannot be expressed through the remote API.
    #[error("unsupported change: {0}")]
    Unsupported(String),

    /// The deletion poller observed a status outside the pending set.
    #[error("unexpected status {status} while deleting application {name}")]
    UnexpectedStatus {
        name: String,
        status: ApplicationStatus,
    },

    /// The desired configuration violates a structural invariant.
    #[error("invalid spec: {0}")]
    InvalidSpec(String),

    /// The import identifier is not a well-formed compound id.
    #[error("invalid import id: {0}")]
    InvalidImportId(String),

    /// Any other control-plane failure, with call context.
    #[error("{operation} failed: {source}")]
    Api {
        operation: String,
        #[source]
        source: ApiError,
    },
}

impl ReconcileError {
    /// Classify a control-plane error, attaching the operation name.
    pub fn api(operation: impl Into<String>, err: ApiError) -> Self {
        let operation = operation.into();
        match err.code {
            ErrorCode::NotFound => ReconcileError::NotFound(err.message),
            ErrorCode::Conflict => ReconcileError::VersionConflict {
                operation,
                message: err.message,
            },
            ErrorCode::InvalidArgument | ErrorCode::Validation => ReconcileError::Rejected {
                operation,
                message: err.message,
            },
            _ => ReconcileError::Api {
                operation,
                source: err,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ReconcileError::NotFound(_))
    }
}
