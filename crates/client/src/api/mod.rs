//! HTTP transport for the bookstore REST API.
//!
//! All calls go through [`ApiClient`], which:
//! - prefixes endpoint paths with the configured base URL
//! - attaches `Authorization: Bearer <token>` when a token is stored
//! - maps non-2xx responses to [`ApiError::Status`] carrying the backend's
//!   `message` field when it sent one
//! - retries catalog reads per [`RetryPolicy`]

pub mod endpoints;
mod retry;

pub use retry::RetryPolicy;

use std::sync::Arc;

use reqwest::multipart::Form;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::storage::{SharedStorage, StorageError, keys};

/// Errors that can occur when talking to the REST API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or the response not read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {}", message.as_deref().unwrap_or("no message"))]
    Status {
        status: u16,
        message: Option<String>,
    },

    /// The response body did not match the expected shape.
    #[error("unexpected response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The stored token could not be read.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ApiError {
    /// HTTP status of a backend rejection.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the backend rejected the credentials (401/403).
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401 | 403, .. })
    }

    /// Whether the backend reported the resource missing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }

    /// Message supplied by the backend, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

/// Generic `{message}` envelope used by error and delete responses.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the bookstore REST API.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
    storage: SharedStorage,
    catalog_retry: RetryPolicy,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .field("catalog_retry", &self.inner.catalog_retry)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, storage: SharedStorage) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: normalize_base(&config.api_url),
                storage,
                catalog_retry: RetryPolicy::new(config.catalog_retries),
            }),
        })
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Storage the bearer token is read from.
    #[must_use]
    pub fn storage(&self) -> &SharedStorage {
        &self.inner.storage
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let builder = self.inner.client.request(method, self.url(path));
        Ok(match self.inner.storage.get(keys::TOKEN)? {
            Some(token) if !token.is_empty() => builder.bearer_auth(token),
            _ => builder,
        })
    }

    /// Send a request and decode the JSON response.
    async fn send<T: DeserializeOwned>(
        &self,
        path: &str,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        // Empty 2xx bodies decode as JSON null so `()`/Option targets still work.
        let body = if body.trim().is_empty() { "null" } else { body.as_str() };
        serde_json::from_str(body).map_err(|source| {
            warn!(
                path,
                body = %body.chars().take(200).collect::<String>(),
                "Failed to decode API response"
            );
            ApiError::Decode {
                path: path.to_string(),
                source,
            }
        })
    }

    /// `GET` a resource.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status, or a body that
    /// does not decode as `T`.
    #[instrument(skip(self), fields(method = "GET"))]
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.request(Method::GET, path)?;
        self.send(path, request).await
    }

    /// `GET` a resource, retrying transient failures per the catalog policy.
    ///
    /// # Errors
    ///
    /// Returns the last error once retries are exhausted.
    #[instrument(skip(self), fields(method = "GET"))]
    pub async fn get_with_retry<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let policy = &self.inner.catalog_retry;
        let mut attempt = 0;
        loop {
            let request = self.request(Method::GET, path)?;
            match self.send(path, request).await {
                Ok(value) => return Ok(value),
                Err(e) if policy.should_retry(&e, attempt) => {
                    let delay = policy.delay_for_attempt(attempt);
                    debug!(attempt, error = %e, delay_ms = delay.as_millis(), "Retrying request");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// `POST` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    #[instrument(skip(self, body), fields(method = "POST"))]
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::POST, path)?.json(body);
        self.send(path, request).await
    }

    /// `PUT` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    #[instrument(skip(self, body), fields(method = "PUT"))]
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::PUT, path)?.json(body);
        self.send(path, request).await
    }

    /// `DELETE` a resource.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    #[instrument(skip(self), fields(method = "DELETE"))]
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.request(Method::DELETE, path)?;
        self.send(path, request).await
    }

    /// `POST` a multipart form.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    #[instrument(skip(self, form), fields(method = "POST"))]
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> Result<T, ApiError> {
        let request = self.request(Method::POST, path)?.multipart(form);
        self.send(path, request).await
    }

    /// `PUT` a multipart form.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    #[instrument(skip(self, form), fields(method = "PUT"))]
    pub async fn put_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> Result<T, ApiError> {
        let request = self.request(Method::PUT, path)?.multipart(form);
        self.send(path, request).await
    }
}

/// Base URL as a string without a trailing slash.
fn normalize_base(url: &Url) -> String {
    url.as_str().trim_end_matches('/').to_string()
}

/// Build a status error, lifting the backend's `message` when present.
fn status_error(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<MessageResponse>(body)
        .ok()
        .and_then(|m| m.message)
        .filter(|m| !m.trim().is_empty());

    debug!(status = status.as_u16(), message = ?message, "API request rejected");

    ApiError::Status {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_lifts_backend_message() {
        let err = status_error(StatusCode::BAD_REQUEST, r#"{"message":"الكمية غير متوفرة"}"#);
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.message(), Some("الكمية غير متوفرة"));
    }

    #[test]
    fn test_status_error_without_json_body() {
        let err = status_error(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert_eq!(err.status(), Some(502));
        assert_eq!(err.message(), None);
    }

    #[test]
    fn test_unauthorized_covers_401_and_403() {
        for code in [401, 403] {
            let err = ApiError::Status {
                status: code,
                message: None,
            };
            assert!(err.is_unauthorized());
        }
        let err = ApiError::Status {
            status: 404,
            message: None,
        };
        assert!(!err.is_unauthorized());
        assert!(err.is_not_found());
    }

    #[test]
    fn test_normalize_base_strips_slash() {
        let url = Url::parse("http://localhost:5000").unwrap();
        assert_eq!(normalize_base(&url), "http://localhost:5000");
        let url = Url::parse("http://localhost:5000/api").unwrap();
        assert_eq!(normalize_base(&url), "http://localhost:5000/api");
    }
}
