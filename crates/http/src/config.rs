//! Client and route-guard configuration
//!
//! Values are layered: built-in defaults, then an optional file (format taken
//! from the extension), then `PLEDGE__`-prefixed environment variables such as
//! `PLEDGE__CLIENT__APP_URL`.

use crate::routes::RouteTable;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "PLEDGE";

/// Key under which the access credential is persisted, and the default name
/// of the cookie copy read by the route guard
pub const TOKEN_KEY: &str = "token";

/// Complete configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PledgeConfig {
    /// Backend client configuration
    pub client: ClientSettings,
    /// Route guard configuration
    pub guard: GuardConfig,
}

/// Backend client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Origin of the app API (auth, profile, token refresh)
    pub app_url: String,
    /// Origin of the service API (campaigns, wallet, notifications)
    pub service_url: String,
    /// Request timeout in seconds (0 = no timeout)
    pub timeout_secs: u64,
    /// User agent sent with every request
    pub user_agent: String,
    /// Token refresh endpoint on the app origin
    pub refresh_path: String,
    /// Where to send the user when the session cannot be recovered
    pub login_path: String,
    /// Session file; the platform data directory is used when unset
    pub session_file: Option<PathBuf>,
}

/// Route guard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Login entry point
    pub login_path: String,
    /// Page shown when the role claim is insufficient
    pub unauthorized_path: String,
    /// Landing page for authenticated users bounced off auth routes
    pub home_path: String,
    /// Cookie carrying the credential copy
    pub cookie_name: String,
    /// Role claim value required on admin routes
    pub admin_role: String,
    /// Send already-authenticated users away from login/registration pages
    pub redirect_authenticated_from_auth_routes: bool,
    /// Login/registration pages affected by the option above
    pub auth_routes: Vec<String>,
    /// Path prefixes the guard never inspects (framework internals, API calls)
    pub skip_prefixes: Vec<String>,
    /// HS256 secret; when unset, claims are decoded without signature checks
    pub jwt_secret: Option<String>,
    /// Route classification table
    pub routes: RouteTable,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            app_url: "http://localhost:8080".to_string(),
            service_url: "http://localhost:8081".to_string(),
            timeout_secs: 10,
            user_agent: format!("pledge-client/{}", env!("CARGO_PKG_VERSION")),
            refresh_path: "/api/token/refresh/".to_string(),
            login_path: "/auth/login".to_string(),
            session_file: None,
        }
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            login_path: "/auth/login".to_string(),
            unauthorized_path: "/unauthorized".to_string(),
            home_path: "/".to_string(),
            cookie_name: TOKEN_KEY.to_string(),
            admin_role: "admin".to_string(),
            redirect_authenticated_from_auth_routes: false,
            auth_routes: vec!["/auth/login".to_string(), "/auth/register".to_string()],
            skip_prefixes: vec![
                "/_next".to_string(),
                "/api".to_string(),
                "/favicon.ico".to_string(),
            ],
            jwt_secret: None,
            routes: RouteTable::default(),
        }
    }
}

impl PledgeConfig {
    /// Load configuration from defaults, an optional file and the environment
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a value cannot be parsed
    pub fn load(path: Option<&Path>) -> Result<Self, ::config::ConfigError> {
        Self::load_with_env(path, None)
    }

    /// Like [`Self::load`], reading environment values from `env` instead of
    /// the process environment when given
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a value cannot be parsed
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ::config::ConfigError> {
        let mut builder =
            ::config::Config::builder().add_source(::config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path));
        }

        let settings = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?;

        settings.try_deserialize()
    }
}
