//! Navigation middleware

pub mod guard;

pub use guard::{
    GuardDecision, RouteGuard, credential_from_cookies, request_credential,
    route_guard_middleware,
};
