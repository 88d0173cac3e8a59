//! Domain errors shared across the port boundary.

use thiserror::Error;

/// Errors raised by a [`GenerationClient`](crate::domain::ports::GenerationClient).
///
/// Transport failures (`Network`) and malformed payloads (`MalformedResponse`)
/// are kept distinct from HTTP status failures so callers can tell them apart,
/// even though the generator and the self-healer treat all of them as
/// "generation failed".
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Invalid request parameters (HTTP 400)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid or missing API key (HTTP 401, 403)
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Endpoint or model not found (HTTP 404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded (HTTP 429)
    #[error("Rate limit exceeded - too many requests")]
    RateLimitExceeded,

    /// Server error from the generation service (HTTP 5xx)
    #[error("Server error ({status}): {body}")]
    ServerError { status: u16, body: String },

    /// Any other non-success status
    #[error("Unexpected status ({status}): {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// Connection, DNS, TLS or timeout failure
    #[error("Network error: {0}")]
    Network(String),

    /// Response body was not the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Local client misconfiguration (bad header value, unbuildable client)
    #[error("Client configuration error: {0}")]
    Configuration(String),
}

impl GenerationError {
    /// Map an HTTP status code and response body to an error variant.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            400 => Self::InvalidRequest(body),
            401 | 403 => Self::AuthenticationFailed(body),
            404 => Self::NotFound(body),
            429 => Self::RateLimitExceeded,
            500..=599 => Self::ServerError { status, body },
            _ => Self::UnexpectedStatus { status, body },
        }
    }

    /// Returns true for rate-limit and server errors, the only failures worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimitExceeded | Self::ServerError { .. })
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_classification() {
        assert!(matches!(
            GenerationError::from_status(400, "bad".to_string()),
            GenerationError::InvalidRequest(_)
        ));
        assert!(matches!(
            GenerationError::from_status(401, String::new()),
            GenerationError::AuthenticationFailed(_)
        ));
        assert!(matches!(
            GenerationError::from_status(403, String::new()),
            GenerationError::AuthenticationFailed(_)
        ));
        assert!(matches!(
            GenerationError::from_status(429, String::new()),
            GenerationError::RateLimitExceeded
        ));
        assert!(matches!(
            GenerationError::from_status(503, String::new()),
            GenerationError::ServerError { status: 503, .. }
        ));
        assert!(matches!(
            GenerationError::from_status(418, String::new()),
            GenerationError::UnexpectedStatus { status: 418, .. }
        ));
    }

    #[test]
    fn test_only_rate_limit_and_server_errors_are_transient() {
        assert!(GenerationError::RateLimitExceeded.is_transient());
        assert!(GenerationError::ServerError {
            status: 502,
            body: String::new()
        }
        .is_transient());

        assert!(!GenerationError::InvalidRequest(String::new()).is_transient());
        assert!(!GenerationError::AuthenticationFailed(String::new()).is_transient());
        assert!(!GenerationError::NotFound(String::new()).is_transient());
        assert!(!GenerationError::MalformedResponse(String::new()).is_transient());
        assert!(!GenerationError::Network("reset".to_string()).is_transient());
    }
}
