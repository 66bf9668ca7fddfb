use serde::{Deserialize, Serialize};

use crate::{MemberId, RawMemberId};

/// Locally persisted state of the current user
///
/// Stored as JSON under the `user` key, using the same camelCase layout the
/// web frontend uses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RawMemberId>,
    #[serde(default)]
    pub is_logged_in: bool,
    /// Last known entitlement state, as resolved from the subscription API
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Session {
    /// A freshly established session after a successful login
    ///
    /// Entitlement is unknown at this point and starts as not premium.
    pub fn logged_in(
        id: Option<MemberId>,
        token: Option<String>,
        username: Option<String>,
    ) -> Self {
        Self {
            id: id.map(RawMemberId::from),
            is_logged_in: true,
            is_premium: false,
            token,
            username,
        }
    }

    /// Validated identity, `None` if missing or corrupted
    pub fn member_id(&self) -> Option<MemberId> {
        self.id.as_ref().and_then(RawMemberId::member_id)
    }

    pub fn with_premium(self, is_premium: bool) -> Self {
        Self { is_premium, ..self }
    }
}
