use serde::{Deserialize, Serialize};

/// Path of the login page
pub const LOGIN_PATH: &str = "/";
/// Path of the page offering a subscription
pub const SUBSCRIPTION_PATH: &str = "/subscription";

/// Outcome of guarding a single navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Verdict {
    Allow,
    RedirectLogin,
    RedirectSubscription,
}

impl Verdict {
    /// Where the navigation should be sent instead, if anywhere
    pub fn redirect(self) -> Option<&'static str> {
        match self {
            Verdict::Allow => None,
            Verdict::RedirectLogin => Some(LOGIN_PATH),
            Verdict::RedirectSubscription => Some(SUBSCRIPTION_PATH),
        }
    }

    pub fn is_allow(self) -> bool {
        matches!(self, Verdict::Allow)
    }
}
