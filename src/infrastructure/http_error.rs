use reqwest::{Response, StatusCode};
use thiserror::Error;
use tracing::warn;

use crate::domain::errors::AssistantError;
use crate::infrastructure::logging::scrub;

/// Errors shared by the HTTP adapters
#[derive(Error, Debug)]
pub enum HttpClientError {
    /// Invalid request parameters (HTTP 400)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid or missing credentials (HTTP 401)
    #[error("Authentication failed")]
    Unauthorized,

    /// Forbidden - permission denied (HTTP 403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found (HTTP 404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded (HTTP 429)
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Server error (HTTP 5xx)
    #[error("Server error ({0}): {1}")]
    ServerError(StatusCode, String),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Network or connection error
    #[error("Network error: {0}")]
    Network(reqwest::Error),

    /// Response body did not match the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Unknown or unexpected status
    #[error("Unexpected status ({0}): {1}")]
    Unexpected(StatusCode, String),
}

impl HttpClientError {
    /// Classify a non-success status.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::BAD_REQUEST => Self::InvalidRequest(body),
            StatusCode::UNAUTHORIZED => Self::Unauthorized,
            StatusCode::FORBIDDEN => Self::Forbidden(body),
            StatusCode::NOT_FOUND => Self::NotFound(body),
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited,
            status if status.is_server_error() => Self::ServerError(status, body),
            _ => Self::Unexpected(status, body),
        }
    }

    /// Read the body of a failed response and classify it.
    pub async fn from_response(response: Response) -> Self {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error body".to_string());
        warn!(status = %status, body = %scrub(&body), "HTTP error response");
        Self::from_status(status, body)
    }

    /// Convert into the domain taxonomy, scrubbing credentials on the way.
    pub fn into_provider_error(self, provider: &str) -> AssistantError {
        AssistantError::provider(provider, scrub(&self.to_string()))
    }
}

impl From<reqwest::Error> for HttpClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else {
            Self::Network(err)
        }
    }
}
