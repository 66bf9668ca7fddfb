use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shelfgate_core::MemberId;

use crate::api::ApiClient;
use crate::error::ApiResult;

/// Response of the active subscription endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActiveSubscription {
    /// Id of the active subscription, `null` if there is none
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub active: bool,
}

impl ActiveSubscription {
    pub fn has_active_id(&self) -> bool {
        self.id.is_some()
    }
}

/// A single entry of the subscription history
///
/// Its contents are never looked at, only the presence of entries matters.
pub type SubscriptionRecord = serde_json::Value;

/// Remote source of subscription state
#[async_trait]
pub trait EntitlementService: Send + Sync {
    async fn active_subscription(&self, member_id: MemberId) -> ApiResult<ActiveSubscription>;

    /// All subscriptions of the member, including expired ones
    async fn subscription_history(
        &self,
        member_id: MemberId,
    ) -> ApiResult<Vec<SubscriptionRecord>>;
}

#[async_trait]
impl EntitlementService for ApiClient {
    async fn active_subscription(&self, member_id: MemberId) -> ApiResult<ActiveSubscription> {
        ApiClient::active_subscription(self, member_id).await
    }

    async fn subscription_history(
        &self,
        member_id: MemberId,
    ) -> ApiResult<Vec<SubscriptionRecord>> {
        ApiClient::subscription_history(self, member_id).await
    }
}
