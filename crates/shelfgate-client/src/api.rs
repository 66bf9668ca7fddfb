use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use shelfgate_core::MemberId;
use shelfgate_store::SessionStore;
use shelfgate_util_error::FmtCompact as _;
use snafu::ResultExt as _;
use tracing::{debug, warn};
use url::Url;

use crate::error::{
    ApiResult, DecodeSnafu, HttpClientSnafu, StatusSnafu, TransportSnafu, UrlNotABaseSnafu,
};
use crate::{ActiveSubscription, SubscriptionRecord};

const LOG_TARGET: &str = "shelfgate::api";

pub const DEFAULT_API_URL: &str = "http://20.249.185.13";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const LOGIN_PATH: &[&str] = &["api", "v1", "user", "login"];

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Body of a successful login, kept as-is
///
/// Deployments disagree on where (and whether) the member id is returned, so
/// nothing beyond "a JSON object" is assumed.
pub type LoginResponse = Map<String, Value>;

/// HTTP client of the backend API
///
/// Every request except the login call is authenticated with the bearer
/// token currently kept in the [`SessionStore`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    store: SessionStore,
}

#[bon::bon]
impl ApiClient {
    #[builder(finish_fn(name = "build"))]
    pub fn new(
        base_url: Url,
        store: SessionStore,
        #[builder(default = DEFAULT_TIMEOUT)] timeout: Duration,
    ) -> ApiResult<Self> {
        if base_url.cannot_be_a_base() {
            return UrlNotABaseSnafu { url: base_url }.fail();
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("shelfgate/", env!("CARGO_PKG_VERSION")))
            .build()
            .context(HttpClientSnafu)?;

        Ok(Self {
            http,
            base_url,
            store,
        })
    }
}

impl ApiClient {
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                UrlNotABaseSnafu {
                    url: self.base_url.clone(),
                }
                .build()
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn bearer_token(&self) -> Option<String> {
        self.store.token().unwrap_or_else(|err| {
            warn!(target: LOG_TARGET, err = %err.fmt_compact(), "Failed to read token, sending request unauthenticated");
            None
        })
    }

    async fn read_json<T>(url: Url, resp: reqwest::Response) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        let status = resp.status();
        if !status.is_success() {
            return StatusSnafu { url, status }.fail();
        }
        resp.json().await.context(DecodeSnafu { url })
    }

    async fn get_json<T>(&self, segments: &[&str]) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        debug!(target: LOG_TARGET, %url, "GET");

        let mut req = self.http.get(url.clone());
        if let Some(token) = self.bearer_token() {
            req = req.bearer_auth(token);
        }
        let resp = req
            .send()
            .await
            .context(TransportSnafu { url: url.clone() })?;

        Self::read_json(url, resp).await
    }

    /// Exchange credentials for a session-bearing response
    ///
    /// Never sends the stored token, even if there is one.
    pub async fn login(&self, credentials: &Credentials) -> ApiResult<LoginResponse> {
        let url = self.endpoint(LOGIN_PATH)?;
        debug!(target: LOG_TARGET, %url, username = %credentials.username, "POST login");

        let resp = self
            .http
            .post(url.clone())
            .json(credentials)
            .send()
            .await
            .context(TransportSnafu { url: url.clone() })?;

        Self::read_json(url, resp).await
    }

    /// `GET /subscription/{memberId}`
    pub async fn active_subscription(&self, member_id: MemberId) -> ApiResult<ActiveSubscription> {
        self.get_json(&["subscription", &member_id.to_string()])
            .await
    }

    /// `GET /subscription/all/{memberId}`
    pub async fn subscription_history(
        &self,
        member_id: MemberId,
    ) -> ApiResult<Vec<SubscriptionRecord>> {
        self.get_json(&["subscription", "all", &member_id.to_string()])
            .await
    }
}
