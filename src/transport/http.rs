//! transport::http
//!
//! Browser-binding transport over HTTP using reqwest.
//!
//! # Design
//!
//! Read calls are plain GETs with the fields as query parameters. Write
//! calls are multipart form POSTs: every field becomes one text part,
//! and binary content (when present) is appended as a distinct named
//! part carrying the original filename and media type.
//!
//! # Authentication
//!
//! The destination (URL + credentials) comes from a
//! [`DestinationResolver`] consulted per request. A 401/403 response
//! triggers one retry with a freshly-resolved destination, so a
//! resolver that refreshes expiring credentials gets a second chance.
//! There is no further retry logic here.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use cmis_browser::transport::http::BrowserTransport;
//! use cmis_browser::transport::StaticDestination;
//!
//! let resolver = Arc::new(StaticDestination::unauthenticated(
//!     "https://ecm.example.com/cmis/browser",
//! ));
//! let transport = BrowserTransport::new(resolver);
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;

use super::{
    ContentPart, Credentials, Destination, DestinationResolver, Endpoint, ResponseBody, Transport,
    TransportError, Verb, WireRequest, WireResponse,
};

/// User-Agent header value for service requests.
const USER_AGENT_VALUE: &str = "cmis-browser";

/// reqwest-based implementation of the browser binding.
pub struct BrowserTransport {
    /// HTTP client for making requests
    client: Client,
    /// Destination resolver consulted per request
    resolver: Arc<dyn DestinationResolver>,
}

// Custom Debug: the resolver may hold credentials
impl std::fmt::Debug for BrowserTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserTransport").finish_non_exhaustive()
    }
}

/// Error body shape of the browser binding.
#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    #[serde(default)]
    exception: String,
    #[serde(default)]
    message: String,
}

impl BrowserTransport {
    /// Create a transport with the given destination resolver.
    pub fn new(resolver: Arc<dyn DestinationResolver>) -> Self {
        Self {
            client: Client::new(),
            resolver,
        }
    }

    /// Build the URL for an endpoint under the given base.
    fn endpoint_url(base_url: &str, endpoint: &Endpoint) -> String {
        let base = base_url.trim_end_matches('/');
        match endpoint {
            Endpoint::Service => base.to_string(),
            Endpoint::Repository(repo) => format!("{}/{}", base, repo),
            Endpoint::Root(repo) => format!("{}/{}/root", base, repo),
            Endpoint::Path(repo, path) => {
                format!("{}/{}/root/{}", base, repo, path.trim_matches('/'))
            }
        }
    }

    /// Apply credentials and shared headers to a request.
    fn apply_auth(builder: RequestBuilder, destination: &Destination) -> RequestBuilder {
        let builder = builder.header(reqwest::header::USER_AGENT, USER_AGENT_VALUE);
        match &destination.credentials {
            Some(Credentials::Basic { user, password }) => {
                builder.basic_auth(user, Some(password))
            }
            Some(Credentials::Bearer(token)) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send one request described by `request` against `destination`.
    async fn send(
        &self,
        request: &WireRequest,
        destination: &Destination,
    ) -> Result<WireResponse, TransportError> {
        let url = Self::endpoint_url(&destination.base_url, &request.endpoint);

        let builder = match request.verb {
            Verb::Get => {
                let query: Vec<(&str, &str)> = request.fields.iter().collect();
                self.client.get(&url).query(&query)
            }
            Verb::Post => {
                let mut form = Form::new();
                for (key, value) in request.fields.iter() {
                    form = form.text(key.to_string(), value.to_string());
                }
                if let Some(content) = &request.content {
                    form = form.part("content", Self::content_part(content)?);
                }
                self.client.post(&url).multipart(form)
            }
        };

        let response = Self::apply_auth(builder, destination)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Build the binary multipart part.
    fn content_part(content: &ContentPart) -> Result<Part, TransportError> {
        Part::bytes(content.bytes.clone())
            .file_name(content.file_name.clone())
            .mime_str(&content.mime_type)
            .map_err(|e| TransportError::InvalidRequest(format!("invalid media type: {}", e)))
    }

    /// Handle a response, mapping errors appropriately.
    async fn handle_response(&self, response: Response) -> Result<WireResponse, TransportError> {
        let status = response.status();

        if status.is_success() {
            let body = Self::decode_body(response, status).await?;
            Ok(WireResponse {
                status: status.as_u16(),
                body,
            })
        } else {
            Err(Self::error_for(response, status).await)
        }
    }

    /// Decode a success body by content type.
    async fn decode_body(
        response: Response,
        status: StatusCode,
    ) -> Result<ResponseBody, TransportError> {
        if status == StatusCode::NO_CONTENT {
            return Ok(ResponseBody::Empty);
        }

        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("json"))
            .unwrap_or(false);

        if is_json {
            let value = response
                .json()
                .await
                .map_err(|e| TransportError::MalformedResponse(e.to_string()))?;
            Ok(ResponseBody::Json(value))
        } else {
            let bytes = response
                .bytes()
                .await
                .map_err(|e| TransportError::Network(e.to_string()))?;
            if bytes.is_empty() {
                Ok(ResponseBody::Empty)
            } else {
                Ok(ResponseBody::Binary(bytes.to_vec()))
            }
        }
    }

    /// Map an error response to a typed transport error.
    ///
    /// The service reports failures as a JSON body with `exception` and
    /// `message` fields; the message is passed through verbatim.
    async fn error_for(response: Response, status: StatusCode) -> TransportError {
        let message = match response.json::<ServiceErrorBody>().await {
            Ok(body) if !body.message.is_empty() => body.message,
            Ok(body) if !body.exception.is_empty() => body.exception,
            _ => "unknown error".to_string(),
        };

        match status {
            StatusCode::UNAUTHORIZED => {
                TransportError::AuthFailed("invalid or expired credentials".into())
            }
            StatusCode::FORBIDDEN => {
                TransportError::AuthFailed(format!("permission denied: {}", message))
            }
            _ => TransportError::Remote {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Check if an error might be resolved by re-resolving the destination.
    fn is_retryable_auth_error(err: &TransportError) -> bool {
        matches!(err, TransportError::AuthFailed(_))
    }
}

#[async_trait]
impl Transport for BrowserTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn execute(&self, request: WireRequest) -> Result<WireResponse, TransportError> {
        let destination = self.resolver.resolve().await?;

        // First attempt
        let result = self.send(&request, &destination).await;

        // Retry once with a fresh destination on auth failure
        match result {
            Err(ref e) if Self::is_retryable_auth_error(e) => {
                let destination = self.resolver.resolve().await?;
                self.send(&request, &destination).await
            }
            other => other,
        }
    }
}
