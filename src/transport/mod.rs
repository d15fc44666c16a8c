//! transport
//!
//! Transport trait and wire-level request/response types.
//!
//! # Design
//!
//! The dispatcher describes each call as a [`WireRequest`] — verb,
//! endpoint, fields, optional binary part — and hands it to a
//! [`Transport`]. The trait is async because execution involves network
//! I/O; implementations must be `Send + Sync` to allow use across async
//! tasks.
//!
//! The transport reports remote non-success statuses as
//! [`TransportError::Remote`] with the repository's message passed
//! through verbatim. It performs no retries; a failed call surfaces to
//! the caller unchanged.
//!
//! # Implementations
//!
//! - [`http::BrowserTransport`] - reqwest-based implementation of the
//!   browser binding
//! - [`mock::MockRepository`] - deterministic in-memory repository for
//!   tests

pub mod http;
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::types::RepositoryId;
use crate::encoding::FormFields;

/// Errors from transport execution.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Authentication is required but not available.
    #[error("authentication required")]
    AuthRequired,

    /// Authentication failed (invalid credentials, expired session).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

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

    /// The response body could not be decoded.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The described request cannot be sent as-is.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// HTTP verb of a wire request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// Read call (`cmisselector`).
    Get,
    /// Write/action call (`cmisaction`, multipart form).
    Post,
}

/// Target endpoint of a wire request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// The service document (repository list).
    Service,
    /// A repository's base URL.
    Repository(RepositoryId),
    /// A repository's root-folder URL.
    Root(RepositoryId),
    /// A path-qualified URL under the repository root.
    Path(RepositoryId, String),
}

/// Binary content carried as a distinct multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPart {
    /// Filename carried on the part.
    pub file_name: String,
    /// Media type of the part.
    pub mime_type: String,
    /// Raw bytes.
    pub bytes: Vec<u8>,
}

/// A fully-described protocol request.
///
/// For `Get` the fields travel as query parameters; for `Post` they
/// become one multipart form field each, with `content` appended as the
/// final named part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireRequest {
    /// HTTP verb.
    pub verb: Verb,
    /// Target endpoint.
    pub endpoint: Endpoint,
    /// Ordered form/query fields.
    pub fields: FormFields,
    /// Optional binary part (writes only).
    pub content: Option<ContentPart>,
}

/// Body of a wire response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Decoded JSON body.
    Json(serde_json::Value),
    /// Raw bytes (content-stream downloads).
    Binary(Vec<u8>),
    /// No body.
    Empty,
}

/// A successful response from the service.
#[derive(Debug, Clone, PartialEq)]
pub struct WireResponse {
    /// HTTP status code.
    pub status: u16,
    /// Decoded body.
    pub body: ResponseBody,
}

impl WireResponse {
    /// The JSON body, or a malformed-response error.
    pub fn json(&self) -> Result<&serde_json::Value, TransportError> {
        match &self.body {
            ResponseBody::Json(value) => Ok(value),
            other => Err(TransportError::MalformedResponse(format!(
                "expected JSON body, got {:?}",
                other
            ))),
        }
    }
}

/// The transport seam: executes a described request against a resolved
/// destination.
///
/// # Error Handling
///
/// All methods return `Result<WireResponse, TransportError>`. Callers
/// should handle:
/// - `AuthRequired` / `AuthFailed`: credentials missing or rejected
/// - `Remote`: the service reported a non-success status
/// - `Network`: connectivity failure before a status was received
#[async_trait]
pub trait Transport: Send + Sync {
    /// Get the transport name (e.g. "http", "mock").
    fn name(&self) -> &'static str;

    /// Execute one request.
    async fn execute(&self, request: WireRequest) -> Result<WireResponse, TransportError>;
}

/// A resolved service destination.
#[derive(Clone)]
pub struct Destination {
    /// Base URL of the browser-binding service document.
    pub base_url: String,
    /// Credentials, if the service requires them.
    pub credentials: Option<Credentials>,
}

// Custom Debug to avoid exposing credentials
impl std::fmt::Debug for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Destination")
            .field("base_url", &self.base_url)
            .field("has_credentials", &self.credentials.is_some())
            .finish()
    }
}

/// Credentials for a destination.
#[derive(Clone)]
pub enum Credentials {
    /// HTTP basic authentication.
    Basic {
        /// User name.
        user: String,
        /// Password.
        password: String,
    },
    /// Bearer token.
    Bearer(String),
}

/// Supplies the destination (URL + credentials) for each request.
///
/// Implementations may refresh expiring credentials; the HTTP transport
/// consults the resolver per request and retries once after an
/// authentication failure so a refreshed credential can take effect.
#[async_trait]
pub trait DestinationResolver: Send + Sync {
    /// Resolve the current destination.
    async fn resolve(&self) -> Result<Destination, TransportError>;
}

/// A fixed destination, for tests and simple setups.
#[derive(Debug, Clone)]
pub struct StaticDestination {
    destination: Destination,
}

impl StaticDestination {
    /// Create a resolver that always returns the given destination.
    pub fn new(destination: Destination) -> Self {
        Self { destination }
    }

    /// Create a credential-less resolver for the given base URL.
    pub fn unauthenticated(base_url: impl Into<String>) -> Self {
        Self {
            destination: Destination {
                base_url: base_url.into(),
                credentials: None,
            },
        }
    }
}

#[async_trait]
impl DestinationResolver for StaticDestination {
    async fn resolve(&self) -> Result<Destination, TransportError> {
        Ok(self.destination.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_display() {
        assert_eq!(
            format!("{}", TransportError::AuthRequired),
            "authentication required"
        );
        assert_eq!(
            format!(
                "{}",
                TransportError::Remote {
                    status: 404,
                    message: "object not found".into()
                }
            ),
            "remote error: 404 - object not found"
        );
        assert_eq!(
            format!("{}", TransportError::Network("connection refused".into())),
            "network error: connection refused"
        );
    }

    #[test]
    fn destination_debug_hides_credentials() {
        let destination = Destination {
            base_url: "https://ecm.example.com/cmis/browser".into(),
            credentials: Some(Credentials::Basic {
                user: "integration".into(),
                password: "hunter2".into(),
            }),
        };

        let rendered = format!("{:?}", destination);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("has_credentials: true"));
    }

    #[test]
    fn json_accessor_rejects_binary() {
        let response = WireResponse {
            status: 200,
            body: ResponseBody::Binary(vec![1, 2, 3]),
        };
        assert!(response.json().is_err());
    }

    #[tokio::test]
    async fn static_destination_resolves() {
        let resolver = StaticDestination::unauthenticated("https://ecm.example.com");
        let destination = resolver.resolve().await.unwrap();
        assert_eq!(destination.base_url, "https://ecm.example.com");
        assert!(destination.credentials.is_none());
    }
}
