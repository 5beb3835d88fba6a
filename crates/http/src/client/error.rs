//! Client error types

use thiserror::Error;

/// Errors surfaced to code calling the backend through [`super::ApiClient`].
///
/// Only one class of failure is ever recovered internally: a `401` on a
/// request that carried a credential. Everything else reaches the caller in
/// one of these shapes, with the backend status and message preserved.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or transport failure (timeout, DNS, connection reset)
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error status not covered by a dedicated variant
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Authentication failed (401)
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Bad request (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Forbidden (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Validation rejected by the backend (422)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Response body could not be decoded into the expected type
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The session ended while this request was waiting on a refresh
    #[error("Session expired, please log in again")]
    SessionExpired,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl ClientError {
    /// Create error from HTTP status code
    pub fn from_status(status: reqwest::StatusCode, message: String) -> Self {
        match status.as_u16() {
            400 => Self::BadRequest(message),
            401 => Self::AuthenticationFailed(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            422 => Self::Validation(message),
            _ => Self::ServerError {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// HTTP status carried by this error, if the backend answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::BadRequest(_) => Some(400),
            Self::AuthenticationFailed(_) => Some(401),
            Self::Forbidden(_) => Some(403),
            Self::NotFound(_) => Some(404),
            Self::Validation(_) => Some(422),
            Self::ServerError { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            Self::Serialization(_) | Self::SessionExpired | Self::Configuration(_) => None,
        }
    }

    /// Backend-provided message, when the error came from an HTTP response
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::BadRequest(m)
            | Self::AuthenticationFailed(m)
            | Self::Forbidden(m)
            | Self::NotFound(m)
            | Self::Validation(m)
            | Self::ServerError { message: m, .. } => Some(m),
            _ => None,
        }
    }

    /// Whether the backend rejected the credential (status 401)
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::AuthenticationFailed(_))
    }

    /// Whether the caller should treat the session as ended
    pub fn is_session_ended(&self) -> bool {
        matches!(self, Self::AuthenticationFailed(_) | Self::SessionExpired)
    }

    /// Whether this is a transport-level timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Request(e) if e.is_timeout())
    }
}
