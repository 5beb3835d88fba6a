//! HTTP error types

use thiserror::Error;

/// Errors raised on the guard side of the session layer.
///
/// The route guard never hands these to its caller: every one of them is
/// resolved into a redirect. They stay typed until that point so the
/// decision can be logged with its cause.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    /// Credential missing, malformed or expired
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Credential valid but lacking the required role
    #[error("Authorization failed: {0}")]
    AuthorizationFailed(String),
}
