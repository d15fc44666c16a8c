//! error
//!
//! Crate-level error type for client operations.
//!
//! # Propagation
//!
//! Validation failures are raised before any network call. Remote
//! failures propagate with the service's status and message intact;
//! nothing is retried or swallowed. The one locally-handled condition
//! is the versioning compensation in [`crate::versioning`], which is an
//! explicit cleanup step, not a retry.

use thiserror::Error;

use crate::core::types::RepositoryId;
use crate::transport::TransportError;

/// Errors from client operations.
#[derive(Debug, Clone, Error)]
pub enum CmisError {
    /// An operation requiring repository context ran before any
    /// successful repository fetch.
    #[error("repository registry not initialized: fetch repositories first")]
    RepositoryNotInitialized,

    /// An explicit repository id is absent from the cached map.
    #[error("repository not found: {0}")]
    RepositoryNotFound(RepositoryId),

    /// A required input is missing or malformed; raised before dispatch.
    #[error("validation error: {0}")]
    Validation(String),

    /// Authentication is missing or was rejected.
    #[error("authentication error: {0}")]
    Auth(String),

    /// The service completed the call but reported a non-success status.
    #[error("remote error: {status} - {message}")]
    Remote {
        /// HTTP status code
        status: u16,
        /// Error message from the service, verbatim
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    Network(String),

    /// A checkout was attempted against a series that already has an
    /// open private working copy.
    #[error("version series already has an open private working copy")]
    VersioningConflict,

    /// The response body could not be decoded into the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl From<TransportError> for CmisError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::AuthRequired => CmisError::Auth("authentication required".into()),
            TransportError::AuthFailed(message) => CmisError::Auth(message),
            TransportError::Remote { status, message } => CmisError::Remote { status, message },
            TransportError::Network(message) => CmisError::Network(message),
            TransportError::MalformedResponse(message) => CmisError::MalformedResponse(message),
            TransportError::InvalidRequest(message) => CmisError::Validation(message),
        }
    }
}

impl CmisError {
    /// Whether this is the not-found class of remote error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CmisError::Remote { status: 404, .. })
    }
}
