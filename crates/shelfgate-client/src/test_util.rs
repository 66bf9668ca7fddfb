use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;
use shelfgate_core::MemberId;
use shelfgate_core::route::{RouteMatch, RouteRequirement};
use shelfgate_store::SessionStore;
use tokio::sync::Notify;
use url::Url;

use crate::bypass::BypassFlag;
use crate::error::{ApiError, ApiResult, StatusSnafu};
use crate::guard::NavigationGuard;
use crate::resolver::EntitlementResolver;
use crate::{ActiveSubscription, EntitlementService, SubscriptionRecord};

#[derive(Debug, Clone)]
pub(crate) enum Reply<T> {
    Ok(T),
    /// Behaves like a 500 from the server
    Fail,
}

/// In-memory [`EntitlementService`] replaying fixed replies and counting calls
pub(crate) struct ScriptedService {
    active: Reply<ActiveSubscription>,
    history: Reply<Vec<SubscriptionRecord>>,
    active_calls: AtomicUsize,
    history_calls: AtomicUsize,
    /// If set, every call waits for a permit first
    gate: Option<Arc<Notify>>,
}

impl ScriptedService {
    pub(crate) fn new(
        active: Reply<ActiveSubscription>,
        history: Reply<Vec<SubscriptionRecord>>,
    ) -> Self {
        Self {
            active,
            history,
            active_calls: AtomicUsize::new(0),
            history_calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    pub(crate) fn with_active_id(id: u64) -> Self {
        Self::new(
            Reply::Ok(ActiveSubscription {
                id: Some(json!(id)),
                active: true,
            }),
            Reply::Fail,
        )
    }

    pub(crate) fn unavailable() -> Self {
        Self::new(Reply::Fail, Reply::Fail)
    }

    pub(crate) fn gated(self, gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..self
        }
    }

    pub(crate) fn active_calls(&self) -> usize {
        self.active_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn calls(&self) -> usize {
        self.active_calls() + self.history_calls()
    }

    async fn wait_for_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
    }
}

fn server_error() -> ApiError {
    StatusSnafu {
        url: Url::parse("http://subscriptions.invalid/").expect("Can't fail"),
        status: StatusCode::INTERNAL_SERVER_ERROR,
    }
    .build()
}

#[async_trait]
impl EntitlementService for ScriptedService {
    async fn active_subscription(&self, _member_id: MemberId) -> ApiResult<ActiveSubscription> {
        self.active_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_for_gate().await;
        match &self.active {
            Reply::Ok(reply) => Ok(reply.clone()),
            Reply::Fail => Err(server_error()),
        }
    }

    async fn subscription_history(
        &self,
        _member_id: MemberId,
    ) -> ApiResult<Vec<SubscriptionRecord>> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_for_gate().await;
        match &self.history {
            Reply::Ok(reply) => Ok(reply.clone()),
            Reply::Fail => Err(server_error()),
        }
    }
}

pub(crate) struct GuardHarness {
    pub(crate) guard: NavigationGuard,
    pub(crate) store: SessionStore,
    pub(crate) bypass: BypassFlag,
    pub(crate) service: Arc<ScriptedService>,
}

impl GuardHarness {
    pub(crate) fn new(service: ScriptedService) -> Self {
        let service = Arc::new(service);
        let store = SessionStore::in_memory();
        let bypass = BypassFlag::ephemeral();
        let resolver = EntitlementResolver::new(service.clone(), store.clone());
        let guard = NavigationGuard::new(store.clone(), bypass.clone(), resolver);

        Self {
            guard,
            store,
            bypass,
            service,
        }
    }
}

pub(crate) fn premium_route() -> RouteMatch {
    RouteMatch::new(
        "/reader",
        RouteRequirement {
            requires_auth: true,
            requires_premium: true,
        },
    )
    .with_title("Reader")
}

pub(crate) fn auth_route() -> RouteMatch {
    RouteMatch::new(
        "/library",
        RouteRequirement {
            requires_auth: true,
            requires_premium: false,
        },
    )
    .with_title("Library")
}

pub(crate) fn public_route() -> RouteMatch {
    RouteMatch::new("/signup", RouteRequirement::default())
}

pub(crate) fn member(id: u64) -> MemberId {
    MemberId::new(id)
}
