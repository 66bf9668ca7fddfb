pub mod api;
pub mod bypass;
mod entitlement;
pub mod error;
pub mod guard;
pub mod resolver;

#[cfg(test)]
mod test_util;

use std::sync::Arc;
use std::time::Duration;

pub use api::{ApiClient, Credentials, DEFAULT_API_URL, DEFAULT_TIMEOUT, LoginResponse};
use bypass::BypassFlag;
pub use entitlement::{ActiveSubscription, EntitlementService, SubscriptionRecord};
use error::{InitResult, LoginApiSnafu, LoginResult, LoginStoreSnafu};
use guard::{GuardOutcome, NavigationGuard};
use resolver::EntitlementResolver;
use serde_json::Value;
use shelfgate_core::route::{RouteMatch, RouteTable};
use shelfgate_core::token::{extract_identity, identity_from_token};
use shelfgate_core::{MemberId, Session};
use shelfgate_store::{SessionStore, StoreResult};
use snafu::ResultExt as _;
use tracing::{info, warn};
use url::Url;

const LOG_TARGET: &str = "shelfgate::client";

/// Result of a single navigation through [`Client::navigate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub target: RouteMatch,
    pub outcome: GuardOutcome,
}

/// Everything needed to gate navigation for one user agent
pub struct Client {
    store: SessionStore,
    api: Arc<ApiClient>,
    bypass: BypassFlag,
    resolver: EntitlementResolver,
    guard: NavigationGuard,
    routes: RouteTable,
}

#[bon::bon]
impl Client {
    #[builder(finish_fn(name = "build"))]
    pub fn new(
        store: SessionStore,
        api_url: Url,
        #[builder(default = DEFAULT_TIMEOUT)] timeout: Duration,
        #[builder(default)] routes: RouteTable,
        // defaults to a fresh, process-lifetime flag
        bypass: Option<BypassFlag>,
        // defaults to the HTTP API at `api_url`
        entitlement_service: Option<Arc<dyn EntitlementService>>,
    ) -> InitResult<Self> {
        let api = Arc::new(
            ApiClient::builder()
                .base_url(api_url)
                .store(store.clone())
                .timeout(timeout)
                .build()?,
        );
        let bypass = bypass.unwrap_or_else(BypassFlag::ephemeral);
        let service =
            entitlement_service.unwrap_or_else(|| api.clone() as Arc<dyn EntitlementService>);
        let resolver = EntitlementResolver::new(service, store.clone());
        let guard = NavigationGuard::new(store.clone(), bypass.clone(), resolver.clone());

        Ok(Self {
            store,
            api,
            bypass,
            resolver,
            guard,
            routes,
        })
    }
}

impl Client {
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn bypass(&self) -> &BypassFlag {
        &self.bypass
    }

    pub fn resolver(&self) -> &EntitlementResolver {
        &self.resolver
    }

    pub fn guard(&self) -> &NavigationGuard {
        &self.guard
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn session(&self) -> Session {
        self.store.get()
    }

    /// Match `path` against the route table and run the guard on it
    pub async fn navigate(&self, path: &str) -> Navigation {
        let target = self.routes.resolve(path);
        let outcome = self.guard.navigate(&target).await;
        Navigation { target, outcome }
    }

    /// Log in and establish a new session
    ///
    /// The member id is taken from the login response if it has one, and
    /// recovered from the token payload otherwise. A session without a usable
    /// id is still stored; the guard will force a new login as soon as it is
    /// needed.
    pub async fn login(&self, credentials: &Credentials) -> LoginResult<Session> {
        let response = self.api.login(credentials).await.context(LoginApiSnafu)?;

        let token = response
            .get("token")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned);
        let member_id = member_id_from_login(&response, token.as_deref());
        if member_id.is_none() {
            warn!(target: LOG_TARGET, username = %credentials.username, "Login response carries no usable member id");
        }

        // A token left over from a previous login must not outlive it
        let stored = match &token {
            Some(token) => self.store.set_token(token),
            None => self.store.remove_token(),
        };
        stored.context(LoginStoreSnafu)?;
        let session = Session::logged_in(member_id, token, Some(credentials.username.clone()));
        self.store.set(&session).context(LoginStoreSnafu)?;

        info!(target: LOG_TARGET, username = %credentials.username, ?member_id, "Logged in");
        Ok(session)
    }

    pub fn logout(&self) -> StoreResult<()> {
        self.store.clear()?;
        info!(target: LOG_TARGET, "Logged out");
        Ok(())
    }
}

/// Top-level response fields first, then a nested `user` object, then the
/// token payload as a last resort
fn member_id_from_login(response: &LoginResponse, token: Option<&str>) -> Option<MemberId> {
    extract_identity(response)
        .or_else(|| {
            response
                .get("user")
                .and_then(Value::as_object)
                .and_then(extract_identity)
        })
        .or_else(|| token.and_then(identity_from_token))
}

#[cfg(test)]
mod tests;
