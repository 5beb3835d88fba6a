//! Profile, wallet and notification endpoints

use super::{ApiClient, ApiRequest, ClientError, Origin};
use crate::types::{Notification, Profile, ProfileUpdate, TopUpRequest, Transaction, WalletSummary};
use serde_json::Value;

impl ApiClient {
    /// Profile of the logged-in user
    pub async fn my_profile(&self) -> Result<Profile, ClientError> {
        self.get(Origin::App, "/profile").await
    }

    /// Public profile of another user
    pub async fn profile(&self, id: i64) -> Result<Profile, ClientError> {
        self.get(Origin::App, &format!("/profile/{id}")).await
    }

    /// Update the logged-in user's profile
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Value, ClientError> {
        self.put(Origin::App, "/profile", update).await
    }

    /// Wallet balance, passed through as returned
    pub async fn wallet(&self) -> Result<WalletSummary, ClientError> {
        self.get(Origin::Service, "/wallet").await
    }

    /// Top up the wallet
    pub async fn top_up(&self, request: &TopUpRequest) -> Result<Value, ClientError> {
        self.post(Origin::Service, "/wallet/topup", request).await
    }

    /// Wallet transaction history
    pub async fn transactions(&self) -> Result<Vec<Transaction>, ClientError> {
        let transactions: Option<Vec<Transaction>> =
            self.get(Origin::Service, "/wallet/transactions").await?;
        Ok(transactions.unwrap_or_default())
    }

    /// Notifications for the logged-in user
    pub async fn notifications(&self) -> Result<Vec<Notification>, ClientError> {
        let notifications: Option<Vec<Notification>> =
            self.get(Origin::Service, "/api/notifications/").await?;
        Ok(notifications.unwrap_or_default())
    }

    /// Mark a notification as read
    pub async fn mark_notification_read(&self, id: i64) -> Result<(), ClientError> {
        self.execute_unit(ApiRequest::put(Origin::Service, format!("/api/notifications/{id}")))
            .await
    }

    /// Delete a notification
    pub async fn delete_notification(&self, id: i64) -> Result<(), ClientError> {
        self.execute_unit(ApiRequest::delete(Origin::Service, format!("/api/notifications/{id}")))
            .await
    }

    /// Subscribe to campaign notifications
    pub async fn subscribe_notifications(&self) -> Result<(), ClientError> {
        self.execute_unit(ApiRequest::post(Origin::Service, "/api/subscribe"))
            .await
    }
}
