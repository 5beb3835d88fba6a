//! Pledge backend client
//!
//! [`ApiClient`] talks to two backends, the app origin (auth, profile, token
//! refresh) and the service origin (campaigns, wallet, notifications). The
//! stored credential is attached right before every send, and a rejected
//! credential is refreshed and the request replayed once; see
//! [`interceptor`].

pub mod account;
pub mod auth;
pub mod campaigns;
pub mod error;
pub mod interceptor;
pub mod navigator;
pub mod session;

pub use error::ClientError;
pub use interceptor::{Attempt, PendingRequest};
pub use navigator::{LoggingNavigator, Navigator};
#[cfg(not(target_arch = "wasm32"))]
pub use session::FileTokenStore;
pub use session::{MemoryTokenStore, TokenStore};

use crate::config::ClientSettings;
use bytes::Bytes;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Backend a request is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Auth, profile and token refresh
    App,
    /// Campaigns, donations, wallet and notifications
    Service,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::App => f.write_str("app"),
            Self::Service => f.write_str("service"),
        }
    }
}

/// An outgoing call, described independently of any credential
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    origin: Origin,
    path: String,
    body: Option<Value>,
    headers: HeaderMap,
    authenticated: bool,
}

impl ApiRequest {
    pub fn new(method: Method, origin: Origin, path: impl Into<String>) -> Self {
        Self {
            method,
            origin,
            path: path.into(),
            body: None,
            headers: HeaderMap::new(),
            authenticated: true,
        }
    }

    pub fn get(origin: Origin, path: impl Into<String>) -> Self {
        Self::new(Method::GET, origin, path)
    }

    pub fn post(origin: Origin, path: impl Into<String>) -> Self {
        Self::new(Method::POST, origin, path)
    }

    pub fn put(origin: Origin, path: impl Into<String>) -> Self {
        Self::new(Method::PUT, origin, path)
    }

    pub fn delete(origin: Origin, path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, origin, path)
    }

    /// Attach a JSON body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ClientError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Add an extra header. A stored credential still wins over a
    /// caller-supplied `Authorization` header.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Never attach the stored credential, and never refresh on 401
    pub fn anonymous(mut self) -> Self {
        self.authenticated = false;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Whether the stored credential is attached to this request
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}

/// Client for the Pledge backends
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    app_url: String,
    service_url: String,
    session: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
    refresh_lock: Arc<Mutex<()>>,
    refresh_path: String,
    login_path: String,
}

impl ApiClient {
    /// Create a new client builder
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Get the app origin
    pub fn app_url(&self) -> &str {
        &self.app_url
    }

    /// Get the service origin
    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    /// The token store this client reads credentials from
    pub fn session(&self) -> &Arc<dyn TokenStore> {
        &self.session
    }

    /// Absolute URL for a path on one of the origins
    pub fn url(&self, origin: Origin, path: &str) -> String {
        match origin {
            Origin::App => format!("{}{}", self.app_url, path),
            Origin::Service => format!("{}{}", self.service_url, path),
        }
    }

    /// Send a request through the refresh-retry policy and decode the JSON
    /// response. An empty body decodes as `null`.
    pub async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ClientError> {
        let body = self.dispatch(PendingRequest::new(request)).await?;
        decode_body(&body)
    }

    /// Send a request and return the response body as text.
    ///
    /// A JSON string body is unquoted; anything else is returned verbatim.
    pub async fn execute_text(&self, request: ApiRequest) -> Result<String, ClientError> {
        let body = self.dispatch(PendingRequest::new(request)).await?;
        Ok(decode_text(&body))
    }

    /// Send a request and discard whatever body comes back
    pub async fn execute_unit(&self, request: ApiRequest) -> Result<(), ClientError> {
        self.dispatch(PendingRequest::new(request)).await.map(|_| ())
    }

    /// `GET` a JSON resource
    pub async fn get<T: DeserializeOwned>(&self, origin: Origin, path: &str) -> Result<T, ClientError> {
        self.execute(ApiRequest::get(origin, path)).await
    }

    /// `POST` a JSON body
    pub async fn post<T, B>(&self, origin: Origin, path: &str, body: &B) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute(ApiRequest::post(origin, path).json(body)?).await
    }

    /// `PUT` a JSON body
    pub async fn put<T, B>(&self, origin: Origin, path: &str, body: &B) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute(ApiRequest::put(origin, path).json(body)?).await
    }

    /// Send one attempt of a request with `credential` attached.
    ///
    /// Returns the raw body on 2xx and a status-mapped error otherwise. No
    /// retry happens here.
    pub(crate) async fn send(
        &self,
        pending: &PendingRequest,
        credential: Option<&str>,
    ) -> Result<Bytes, ClientError> {
        let request = pending.request();
        let url = self.url(request.origin(), request.path());

        let mut headers = request.headers.clone();
        if let Some(token) = credential {
            let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                ClientError::Configuration("stored credential is not a valid header value".into())
            })?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let mut builder = self
            .client
            .request(request.method().clone(), &url)
            .headers(headers);
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        debug!(
            method = %request.method(),
            origin = %request.origin(),
            path = request.path(),
            attempt = ?pending.attempt(),
            authenticated = credential.is_some(),
            "Sending request"
        );

        let response = builder.send().await.map_err(|e| {
            warn!(
                method = %request.method(),
                origin = %request.origin(),
                path = request.path(),
                attempt = ?pending.attempt(),
                timeout = e.is_timeout(),
                "Request failed: {e}"
            );
            e
        })?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.bytes().await?);
        }

        let body = response.bytes().await.unwrap_or_default();
        let message = error_message(status, &body);
        warn!(
            method = %request.method(),
            origin = %request.origin(),
            path = request.path(),
            status = status.as_u16(),
            attempt = ?pending.attempt(),
            "Backend rejected request: {message}"
        );
        Err(ClientError::from_status(status, message))
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("app_url", &self.app_url)
            .field("service_url", &self.service_url)
            .field("refresh_path", &self.refresh_path)
            .field("login_path", &self.login_path)
            .finish_non_exhaustive()
    }
}

pub(crate) fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ClientError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_slice(b"null")?);
    }
    Ok(serde_json::from_slice(body)?)
}

pub(crate) fn decode_text(body: &[u8]) -> String {
    serde_json::from_slice::<String>(body)
        .unwrap_or_else(|_| String::from_utf8_lossy(body).trim().to_string())
}

/// Best-effort message from an error body: a JSON `message`, `error` or
/// `detail` field, a JSON string, the raw text, or the reason phrase.
fn error_message(status: StatusCode, body: &[u8]) -> String {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::String(message)) if !message.is_empty() => return message,
        Ok(Value::Object(map)) => {
            let field = ["message", "error", "detail"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str));
            if let Some(message) = field {
                return message.to_string();
            }
        }
        _ => {}
    }

    let text = String::from_utf8_lossy(body).trim().to_string();
    if text.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    } else {
        text
    }
}

/// Builder for [`ApiClient`]
#[derive(Default)]
pub struct ApiClientBuilder {
    app_url: Option<String>,
    service_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    token_store: Option<Arc<dyn TokenStore>>,
    navigator: Option<Arc<dyn Navigator>>,
    refresh_path: Option<String>,
    login_path: Option<String>,
}

impl ApiClientBuilder {
    /// Apply every value from loaded settings
    pub fn settings(self, settings: &ClientSettings) -> Self {
        self.app_url(&settings.app_url)
            .service_url(&settings.service_url)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(&settings.user_agent)
            .refresh_path(&settings.refresh_path)
            .login_path(&settings.login_path)
    }

    /// Set the app origin
    pub fn app_url(mut self, url: impl Into<String>) -> Self {
        self.app_url = Some(url.into());
        self
    }

    /// Set the service origin; defaults to the app origin
    pub fn service_url(mut self, url: impl Into<String>) -> Self {
        self.service_url = Some(url.into());
        self
    }

    /// Set the request timeout; zero disables it
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Set the token store; an in-memory store is used otherwise
    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.token_store = Some(store);
        self
    }

    /// Set the navigator invoked when the session ends
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Set the token refresh path on the app origin
    pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = Some(path.into());
        self
    }

    /// Set the login entry point used for forced navigation
    pub fn login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = Some(path.into());
        self
    }

    /// Build the client
    pub fn build(self) -> Result<ApiClient, ClientError> {
        let app_url = self
            .app_url
            .ok_or_else(|| ClientError::Configuration("app_url is required".into()))?;

        // Ensure origins end without a trailing slash
        let app_url = app_url.trim_end_matches('/').to_string();
        let service_url = self
            .service_url
            .map_or_else(|| app_url.clone(), |url| url.trim_end_matches('/').to_string());

        let mut client_builder = ClientBuilder::new();

        // A zero timeout means none
        #[cfg(not(target_arch = "wasm32"))]
        {
            let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
            if !timeout.is_zero() {
                client_builder = client_builder.timeout(timeout);
            }
        }

        if let Some(user_agent) = self.user_agent {
            client_builder = client_builder.user_agent(user_agent);
        } else {
            client_builder = client_builder
                .user_agent(concat!("pledge-client/", env!("CARGO_PKG_VERSION")));
        }

        let client = client_builder.build()?;

        Ok(ApiClient {
            client,
            app_url,
            service_url,
            session: self
                .token_store
                .unwrap_or_else(|| Arc::new(MemoryTokenStore::new())),
            navigator: self
                .navigator
                .unwrap_or_else(|| Arc::new(LoggingNavigator)),
            refresh_lock: Arc::new(Mutex::new(())),
            refresh_path: self
                .refresh_path
                .unwrap_or_else(|| "/api/token/refresh/".to_string()),
            login_path: self.login_path.unwrap_or_else(|| "/auth/login".to_string()),
        })
    }
}
