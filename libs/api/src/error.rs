//! Error types for control-plane API calls.

use serde::Deserialize;
use thiserror::Error;

/// Machine-readable error codes returned by the control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The named resource does not exist.
    NotFound,

    /// Concurrent modification detected (stale version, duplicate name).
    Conflict,

    /// A request argument was rejected by the control plane.
    InvalidArgument,

    /// The request payload failed validation.
    Validation,

    /// Server-side failure.
    Internal,

    /// The call never reached the control plane (connection, DNS, decode).
    Transport,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorCode::NotFound => "not_found",
            ErrorCode::Conflict => "conflict",
            ErrorCode::InvalidArgument => "invalid_argument",
            ErrorCode::Validation => "validation",
            ErrorCode::Internal => "internal",
            ErrorCode::Transport => "transport",
        };
        write!(f, "{s}")
    }
}

/// An error returned by a control-plane call.
#[derive(Debug, Clone, Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

/// Message fragments that identify privilege-propagation lag.
///
/// The control plane reports these as `invalid_argument` even though the
/// condition resolves itself once the granted permissions propagate.
const PROPAGATION_HINTS: &[&str] = &[
    "service doesn't have sufficient privileges",
    "doesn't have sufficient privileges",
    "does not provide Invoke permissions",
];

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgument, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Transport, message)
    }

    pub fn is_not_found(&self) -> bool {
        self.code == ErrorCode::NotFound
    }

    /// Returns true if this error is expected to resolve itself once newly
    /// granted permissions finish propagating, and is therefore retryable.
    pub fn is_permission_propagation(&self) -> bool {
        self.code == ErrorCode::InvalidArgument
            && PROPAGATION_HINTS.iter().any(|hint| self.message.contains(hint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn propagation_hint_is_retryable() {
        let err = ApiError::invalid_argument(
            "given role arn : arn:sp:iam::123:role/x does not provide Invoke permissions on the function resource : arn:sp:fn:us:123:function:y",
        );
        assert!(err.is_permission_propagation());
    }

    #[test]
    fn other_invalid_argument_is_fatal() {
        let err = ApiError::invalid_argument("record column name must not be empty");
        assert!(!err.is_permission_propagation());
    }

    #[test]
    fn hint_under_wrong_code_is_fatal() {
        let err = ApiError::new(
            ErrorCode::Internal,
            "service doesn't have sufficient privileges",
        );
        assert!(!err.is_permission_propagation());
    }
}
