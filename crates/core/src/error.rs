//! Ledger error types.

use thiserror::Error;

/// Errors returned by the identity store and the request ledger.
///
/// Every failure is reported to the immediate caller; nothing in the core
/// prints, logs, or exits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// A user with this email is already registered.
    #[error("a user with email {0} is already registered")]
    DuplicateEmail(String),

    /// Unknown email or wrong secret. The two cases are not distinguished.
    #[error("invalid email or secret")]
    InvalidCredentials,

    /// No session, or the session's role may not perform this operation.
    #[error("not authorized")]
    NotAuthorized,

    /// No request or user with this identifier.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed or missing required input.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl LedgerError {
    pub(crate) fn request_not_found(id: crate::RequestId) -> Self {
        Self::NotFound(format!("request {id}"))
    }

    pub(crate) fn ids_exhausted(kind: &str) -> Self {
        Self::InvalidInput(format!("no {kind} identifiers left"))
    }
}
