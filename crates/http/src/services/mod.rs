//! Service layer for credential handling

pub mod claims;

pub use claims::{Claims, ClaimsDecoder, extract_bearer_token};
