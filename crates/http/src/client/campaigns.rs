//! Campaign and donation endpoints on the service origin

use super::{ApiClient, ApiRequest, ClientError, Origin};
use crate::types::{Campaign, CreateCampaignRequest, DonationRequest, UpdateCampaignRequest};
use serde_json::Value;

impl ApiClient {
    /// List all campaigns
    pub async fn list_campaigns(&self) -> Result<Vec<Campaign>, ClientError> {
        let campaigns: Option<Vec<Campaign>> = self.get(Origin::Service, "/campaigns").await?;
        Ok(campaigns.unwrap_or_default())
    }

    /// List the campaigns owned by the logged-in user
    pub async fn list_my_campaigns(&self) -> Result<Vec<Campaign>, ClientError> {
        let campaigns: Option<Vec<Campaign>> =
            self.get(Origin::Service, "/campaigns/user").await?;
        Ok(campaigns.unwrap_or_default())
    }

    /// Get one campaign
    pub async fn get_campaign(&self, id: i64) -> Result<Campaign, ClientError> {
        self.get(Origin::Service, &format!("/campaigns/{id}")).await
    }

    /// Create a campaign
    pub async fn create_campaign(&self, request: &CreateCampaignRequest) -> Result<Value, ClientError> {
        self.post(Origin::Service, "/campaigns", request).await
    }

    /// Update a campaign
    pub async fn update_campaign(
        &self,
        id: i64,
        request: &UpdateCampaignRequest,
    ) -> Result<Value, ClientError> {
        self.put(Origin::Service, &format!("/campaigns/{id}"), request)
            .await
    }

    /// Delete a campaign
    pub async fn delete_campaign(&self, id: i64) -> Result<(), ClientError> {
        self.execute_unit(ApiRequest::delete(Origin::Service, format!("/campaigns/{id}")))
            .await
    }

    /// Donate to a campaign
    pub async fn donate(&self, campaign_id: i64, request: &DonationRequest) -> Result<Value, ClientError> {
        self.post(
            Origin::Service,
            &format!("/campaigns/{campaign_id}/donations"),
            request,
        )
        .await
    }
}
