//! Route guard
//!
//! Runs before page code for every navigation and decides, from the path and
//! the credential copy carried in the request's cookie, whether to allow it
//! or redirect. No network call is made and no error escapes: a missing,
//! malformed or expired credential sends the user to the login entry point
//! with the requested path preserved, and an insufficient role on an admin
//! route sends them to the unauthorized page.

use crate::config::GuardConfig;
use crate::error::HttpError;
use crate::routes::RouteClass;
use crate::services::{Claims, ClaimsDecoder, extract_bearer_token};
use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of guarding one navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// Redirect to this location (path plus optional query)
    Redirect(String),
}

/// Navigation gate driven by a [`GuardConfig`]
#[derive(Debug)]
pub struct RouteGuard {
    config: GuardConfig,
    decoder: ClaimsDecoder,
}

impl RouteGuard {
    pub fn new(config: GuardConfig) -> Self {
        let decoder = ClaimsDecoder::from_secret(config.jwt_secret.as_deref());
        Self { config, decoder }
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Whether the guard inspects this path at all. Framework internals, API
    /// calls and static files (a dot in the last segment) pass untouched.
    pub fn applies_to(&self, path: &str) -> bool {
        if self
            .config
            .skip_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
        {
            return false;
        }
        let last_segment = path.rsplit('/').next().unwrap_or_default();
        !last_segment.contains('.')
    }

    /// Decide one navigation
    pub fn decide(&self, path: &str, credential: Option<&str>) -> GuardDecision {
        let class = self.config.routes.classify(path);
        let credential = credential.filter(|token| !token.is_empty());

        if class == RouteClass::Public {
            return self.decide_public(path, credential);
        }

        let Some(token) = credential else {
            debug!(path, "No credential, redirecting to login");
            return self.login_redirect(path);
        };

        let claims = match self.decoder.decode(token) {
            Ok(claims) => claims,
            Err(e) => {
                warn!(path, "Treating credential as invalid session: {e}");
                return self.login_redirect(path);
            }
        };

        match self.authorize(&claims, class) {
            Ok(()) => {
                debug!(path, subject = %claims.sub, ?class, "Navigation allowed");
                GuardDecision::Allow
            }
            Err(e) => {
                debug!(path, subject = %claims.sub, "{e}");
                GuardDecision::Redirect(self.config.unauthorized_path.clone())
            }
        }
    }

    /// Check decoded claims against the class of the requested route
    pub fn authorize(&self, claims: &Claims, class: RouteClass) -> Result<(), HttpError> {
        if class == RouteClass::Admin && !claims.has_role(&self.config.admin_role) {
            return Err(HttpError::AuthorizationFailed(format!(
                "Admin access required, role claim is {:?}",
                claims.role
            )));
        }
        Ok(())
    }

    fn decide_public(&self, path: &str, credential: Option<&str>) -> GuardDecision {
        if !self.config.redirect_authenticated_from_auth_routes || !self.is_auth_route(path) {
            return GuardDecision::Allow;
        }

        match credential.map(|token| self.decoder.decode(token)) {
            Some(Ok(claims)) => {
                debug!(path, subject = %claims.sub, "Already authenticated, leaving auth route");
                GuardDecision::Redirect(self.config.home_path.clone())
            }
            _ => GuardDecision::Allow,
        }
    }

    fn is_auth_route(&self, path: &str) -> bool {
        self.config
            .auth_routes
            .iter()
            .any(|route| path.starts_with(route.as_str()))
    }

    fn login_redirect(&self, path: &str) -> GuardDecision {
        let encoded: String = url::form_urlencoded::byte_serialize(path.as_bytes()).collect();
        GuardDecision::Redirect(format!("{}?redirect={encoded}", self.config.login_path))
    }
}

/// Value of the named cookie across all `Cookie` headers
pub fn credential_from_cookies(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

/// Credential carried by a request: the named cookie, or a bearer
/// `Authorization` header when the cookie is absent
pub fn request_credential(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    credential_from_cookies(headers, cookie_name).or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| extract_bearer_token(value).ok())
            .filter(|token| !token.is_empty())
            .map(str::to_string)
    })
}

/// axum middleware applying a [`RouteGuard`] to every request
pub async fn route_guard_middleware(
    State(guard): State<Arc<RouteGuard>>,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_owned();

    if !guard.applies_to(&path) {
        return next.run(req).await;
    }

    let credential = request_credential(req.headers(), &guard.config().cookie_name);

    match guard.decide(&path, credential.as_deref()) {
        GuardDecision::Allow => next.run(req).await,
        GuardDecision::Redirect(location) => Redirect::temporary(&location).into_response(),
    }
}
