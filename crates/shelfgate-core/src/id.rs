use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use snafu::Snafu;

/// Validated member identity, as used by the subscription API
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(u64);

impl MemberId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Interpret a JSON value as a member id
    ///
    /// Accepts non-negative integers and strings consisting only of ASCII
    /// digits. Everything else (floats, negative numbers, `"42abc"`, UUIDs,
    /// objects, ...) is not an id.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_u64().map(Self),
            serde_json::Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl From<u64> for MemberId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Snafu)]
pub enum MemberIdParseError {
    #[snafu(display("Member id must consist of ASCII digits only"))]
    NotNumeric,
    #[snafu(display("Member id out of range"))]
    OutOfRange { source: std::num::ParseIntError },
}

impl FromStr for MemberId {
    type Err = MemberIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // `u64::from_str` would accept a leading `+`
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return NotNumericSnafu.fail();
        }
        s.parse()
            .map(Self)
            .map_err(|source| MemberIdParseError::OutOfRange { source })
    }
}

/// Member id exactly as found in persisted session state
///
/// Persisted state is not trusted: it can be edited or corrupted outside of
/// our control, so the id is kept in its raw JSON form and only validated
/// when it is about to be used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawMemberId(serde_json::Value);

impl RawMemberId {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn member_id(&self) -> Option<MemberId> {
        MemberId::from_json(&self.0)
    }

    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }
}

impl From<MemberId> for RawMemberId {
    fn from(id: MemberId) -> Self {
        Self(serde_json::Value::from(id.0))
    }
}

impl fmt::Display for RawMemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
