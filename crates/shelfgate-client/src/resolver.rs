use std::sync::Arc;

use shelfgate_core::{MemberId, RawMemberId};
use shelfgate_store::SessionStore;
use shelfgate_util_error::FmtCompact as _;
use tracing::{debug, info, instrument, warn};

use crate::EntitlementService;

const LOG_TARGET: &str = "shelfgate::resolver";

/// What a single entitlement check found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntitlementSignal {
    /// There is a currently active subscription
    ActiveSubscription,
    /// There is at least one subscription in the history
    ///
    /// Expired subscriptions count too. That is the established policy of the
    /// service, kept as-is.
    SubscriptionHistory,
    /// Nothing found, or the service could not be reached
    None,
}

impl EntitlementSignal {
    pub fn is_premium(self) -> bool {
        !matches!(self, EntitlementSignal::None)
    }
}

/// Decides whether a member currently has premium access
///
/// Never fails: anything that goes wrong while talking to the service counts
/// as "not premium".
#[derive(Clone)]
pub struct EntitlementResolver {
    service: Arc<dyn EntitlementService>,
    store: SessionStore,
}

impl EntitlementResolver {
    pub fn new(service: Arc<dyn EntitlementService>, store: SessionStore) -> Self {
        Self { service, store }
    }

    /// Resolve entitlement of a member id taken from untrusted state
    pub async fn resolve(&self, member_id: &RawMemberId) -> bool {
        let Some(member_id) = member_id.member_id() else {
            warn!(target: LOG_TARGET, %member_id, "Refusing to resolve entitlement of a non-numeric member id");
            return false;
        };

        self.resolve_member(member_id).await
    }

    /// Resolve entitlement and record it in the session
    #[instrument(target = "shelfgate::resolver", skip(self), ret)]
    pub async fn resolve_member(&self, member_id: MemberId) -> bool {
        let signal = self.query(member_id).await;
        let is_premium = signal.is_premium();

        info!(target: LOG_TARGET, %member_id, ?signal, is_premium, "Entitlement resolved");

        self.record(member_id, is_premium);

        is_premium
    }

    /// Run the checks in order, stopping at the first positive one
    pub async fn query(&self, member_id: MemberId) -> EntitlementSignal {
        if self.check_active_subscription(member_id).await {
            return EntitlementSignal::ActiveSubscription;
        }

        if self.check_subscription_history(member_id).await {
            return EntitlementSignal::SubscriptionHistory;
        }

        EntitlementSignal::None
    }

    pub async fn check_active_subscription(&self, member_id: MemberId) -> bool {
        match self.service.active_subscription(member_id).await {
            Ok(subscription) => {
                debug!(target: LOG_TARGET, %member_id, ?subscription, "Active subscription response");
                subscription.has_active_id()
            }
            Err(err) => {
                warn!(target: LOG_TARGET, %member_id, err = %err.fmt_compact(), "Active subscription check failed");
                false
            }
        }
    }

    pub async fn check_subscription_history(&self, member_id: MemberId) -> bool {
        match self.service.subscription_history(member_id).await {
            Ok(history) => {
                debug!(target: LOG_TARGET, %member_id, len = history.len(), "Subscription history response");
                !history.is_empty()
            }
            Err(err) => {
                warn!(target: LOG_TARGET, %member_id, err = %err.fmt_compact(), "Subscription history check failed");
                false
            }
        }
    }

    /// Update the cached `isPremium` of the session, if it changed
    ///
    /// Only applies if the stored session still belongs to `member_id`: the
    /// user might have logged out, or in as someone else, while the queries
    /// were in flight.
    fn record(&self, member_id: MemberId, is_premium: bool) {
        let session = match self.store.try_get() {
            Ok(session) => session,
            Err(err) => {
                warn!(target: LOG_TARGET, err = %err.fmt_compact(), "Failed to read session, not recording entitlement");
                return;
            }
        };

        if session.member_id() != Some(member_id) {
            debug!(target: LOG_TARGET, %member_id, "Session belongs to someone else now, not recording entitlement");
            return;
        }

        if session.is_premium == is_premium {
            return;
        }

        if let Err(err) = self.store.set(&session.with_premium(is_premium)) {
            warn!(target: LOG_TARGET, %member_id, err = %err.fmt_compact(), "Failed to record entitlement");
        }
    }
}

#[cfg(test)]
mod tests;
