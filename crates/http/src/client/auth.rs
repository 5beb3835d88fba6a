//! Authentication API client methods

use super::{ApiClient, ApiRequest, ClientError, Origin};
use crate::types::{LoginPayload, LoginRequest, RegisterRequest};
use tracing::info;

impl ApiClient {
    /// Log in and store the returned credential.
    ///
    /// Never attaches a previously stored credential, and a 401 here means
    /// wrong credentials rather than an expired session.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginPayload, ClientError> {
        let request = ApiRequest::post(Origin::App, "/auth/login")
            .anonymous()
            .json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })?;

        let body = self.execute_text(request).await?;
        let payload = parse_login_payload(&body)?;

        self.session.clear();
        self.session.set(payload.access().to_string());
        if let Some(refresh) = payload.refresh() {
            self.session.set_refresh(refresh.to_string());
        }

        info!(email, "Logged in");
        Ok(payload)
    }

    /// Register a new account and return the backend's confirmation message
    pub async fn register(&self, request: &RegisterRequest) -> Result<String, ClientError> {
        let request = ApiRequest::post(Origin::App, "/auth/register")
            .anonymous()
            .json(request)?;
        self.execute_text(request).await
    }

    /// Forget the stored credentials
    pub fn logout(&self) {
        self.session.clear();
        info!("Logged out");
    }

    /// Exchange the stored refresh credential for a new access credential.
    ///
    /// On failure the session is ended exactly as when a refresh triggered by
    /// a rejected request fails.
    pub async fn refresh(&self) -> Result<String, ClientError> {
        self.refresh_session(None).await
    }

    /// Whether a credential is currently stored
    pub fn is_logged_in(&self) -> bool {
        self.session.get().is_some()
    }
}

/// The login endpoint answers with the bare credential; it may arrive as a
/// JSON string, raw text, or one of the wrapped object shapes.
fn parse_login_payload(body: &str) -> Result<LoginPayload, ClientError> {
    let trimmed = body.trim();
    if trimmed.starts_with('{') {
        return Ok(serde_json::from_str(trimmed)?);
    }
    if trimmed.is_empty() {
        return Err(ClientError::AuthenticationFailed(
            "login response carried no credential".to_string(),
        ));
    }
    Ok(LoginPayload::Bare(trimmed.to_string()))
}
