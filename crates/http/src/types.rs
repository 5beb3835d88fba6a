//! Wire types exchanged with the Pledge backends

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response payload.
///
/// The backend answers with the bare credential as the entire payload;
/// wrapped and access/refresh-pair shapes are accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LoginPayload {
    /// The credential itself
    Bare(String),
    /// `{"token": ...}`
    Wrapped { token: String },
    /// `{"access": ..., "refresh": ...}`
    Pair {
        access: String,
        #[serde(default)]
        refresh: Option<String>,
    },
}

impl LoginPayload {
    /// Access credential carried by the payload
    pub fn access(&self) -> &str {
        match self {
            Self::Bare(token) | Self::Wrapped { token } => token,
            Self::Pair { access, .. } => access,
        }
    }

    /// Distinct refresh credential, if the backend issued one
    pub fn refresh(&self) -> Option<&str> {
        match self {
            Self::Pair { refresh, .. } => refresh.as_deref(),
            _ => None,
        }
    }
}

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
}

/// Token refresh request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRefreshRequest {
    pub refresh: String,
}

/// Token refresh response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRefreshResponse {
    pub access: String,
    /// Present when the backend rotates refresh credentials
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Campaign lifecycle as reported by the service backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CampaignStatus {
    PendingVerification,
    Active,
    Rejected,
    Completed,
}

/// Campaign
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: String,
    pub target_amount: f64,
    pub collected_amount: f64,
    pub start_date: String,
    pub end_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_uploaded_at: Option<String>,
    pub status: CampaignStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Campaign creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCampaignRequest {
    pub name: String,
    pub description: String,
    pub target_amount: f64,
    /// ISO-8601 timestamp
    pub start_date: String,
    /// ISO-8601 timestamp
    pub end_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Partial campaign update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCampaignRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Donation submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationRequest {
    pub amount: f64,
    /// Empty when the donor left no message
    pub message: String,
}

/// Wallet top-up request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopUpRequest {
    pub amount: f64,
    pub payment_method: String,
    pub phone_number: String,
}

/// Wallet transaction kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Topup,
    Donation,
}

/// Wallet transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: f64,
    pub status: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Campaign summary embedded in a profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignSummary {
    pub id: i64,
    pub name: String,
    pub target_amount: f64,
    pub collected_amount: f64,
    pub status: String,
}

/// User profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub campaigns: Vec<CampaignSummary>,
}

/// Partial profile update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

/// Notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub title: String,
    pub content: String,
    /// ISO timestamp
    pub created_at: String,
    pub target_type: String,
    pub marked_as_read: bool,
}

/// Wallet balance as returned by the service backend; passed through untouched
pub type WalletSummary = JsonValue;
