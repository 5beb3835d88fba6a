//! Pledge HTTP layer
//!
//! Session handling, authenticated requests against the app and service
//! origins, and the navigation guard of the Pledge crowdfunding frontend.
//!
//! - `client` feature: [`client::ApiClient`] with its token store and
//!   refresh-and-retry interceptor
//! - `server` feature: [`middleware::RouteGuard`] and the claims decoder it
//!   relies on

pub mod config;
pub mod error;
pub mod routes;
pub mod types;

#[cfg(feature = "client")]
pub mod client;

#[cfg(feature = "server")]
pub mod middleware;
#[cfg(feature = "server")]
pub mod services;

pub use config::{ClientSettings, GuardConfig, PledgeConfig};
pub use error::HttpError;
pub use routes::{RouteClass, RouteRule, RouteTable};

#[cfg(feature = "client")]
pub use client::{ApiClient, ApiClientBuilder, ApiRequest, ClientError, Origin};

#[cfg(feature = "server")]
pub use middleware::{GuardDecision, RouteGuard};
