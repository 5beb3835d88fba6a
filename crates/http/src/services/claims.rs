//! Credential claims decoding

use crate::error::HttpError;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

/// Claims carried by a credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Role claim, e.g. `admin`
    #[serde(default)]
    pub role: Option<String>,
    /// Expiration time (as UTC timestamp)
    pub exp: i64,
    /// Issued at (as UTC timestamp)
    #[serde(default)]
    pub iat: Option<i64>,
    /// User's display name
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Claims {
    /// Whether the role claim equals `role`
    pub fn has_role(&self, role: &str) -> bool {
        self.role.as_deref() == Some(role)
    }
}

/// Decodes credentials into [`Claims`]
pub struct ClaimsDecoder {
    key: DecodingKey,
    validation: Validation,
    verifies_signature: bool,
}

impl ClaimsDecoder {
    /// Decoder that verifies `HS256` signatures with `secret`
    pub fn verifying(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            verifies_signature: true,
        }
    }

    /// Decoder that checks structure and expiry but not the signature.
    ///
    /// Used where no key material is available; the backend still verifies
    /// every credential it receives.
    pub fn unverified() -> Self {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_aud = false;
        Self {
            key: DecodingKey::from_secret(&[]),
            validation,
            verifies_signature: false,
        }
    }

    /// Whether signatures are checked
    pub fn verifies_signature(&self) -> bool {
        self.verifies_signature
    }

    /// Build from an optional secret
    pub fn from_secret(secret: Option<&str>) -> Self {
        secret.map_or_else(Self::unverified, Self::verifying)
    }

    /// Decode a credential and extract claims
    pub fn decode(&self, token: &str) -> Result<Claims, HttpError> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|token_data| token_data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    HttpError::AuthenticationFailed("Token has expired".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidToken => {
                    HttpError::AuthenticationFailed("Invalid token".to_string())
                }
                _ => HttpError::AuthenticationFailed(format!("Token validation failed: {e}")),
            })
    }
}

impl std::fmt::Debug for ClaimsDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimsDecoder")
            .field("verifies_signature", &self.verifies_signature)
            .finish_non_exhaustive()
    }
}

/// Extract token from Authorization header
pub fn extract_bearer_token(auth_header: &str) -> Result<&str, HttpError> {
    auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        HttpError::AuthenticationFailed("Invalid authorization header format".to_string())
    })
}
