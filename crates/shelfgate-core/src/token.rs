//! Bearer token payload decoding and identity recovery
//!
//! Tokens are never verified here, only read. The payload is an untrusted
//! hint used to recover an identity when the login response did not carry
//! one explicitly.

use std::sync::LazyLock;

use data_encoding::Encoding;
use serde_json::{Map, Value};
use shelfgate_util_error::FmtCompact as _;
use snafu::{ResultExt as _, Snafu};
use tracing::{debug, trace};

use crate::MemberId;

const LOG_TARGET: &str = "shelfgate::token";

pub type TokenPayload = Map<String, Value>;

/// Base64 the way browsers decode it: both alphabets, no padding required,
/// non-zero trailing bits ignored
static LENIENT_BASE64: LazyLock<Encoding> = LazyLock::new(|| {
    let mut spec = data_encoding::Specification::new();
    spec.symbols
        .push_str("ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/");
    spec.translate.from.push_str("-_");
    spec.translate.to.push_str("+/");
    spec.check_trailing_bits = false;
    spec.encoding().expect("Can't fail")
});

#[derive(Debug, Snafu)]
pub enum TokenDecodeError {
    #[snafu(display("Token has {count} segments, expected 3"))]
    SegmentCount { count: usize },
    #[snafu(display("Payload is not valid base64"))]
    Base64 { source: data_encoding::DecodeError },
    #[snafu(display("Payload is not valid JSON"))]
    Json { source: serde_json::Error },
    #[snafu(display("Payload is not a JSON object"))]
    NotAnObject,
}

pub type TokenDecodeResult<T> = std::result::Result<T, TokenDecodeError>;

/// Decode the payload (middle) segment of a `header.payload.signature` token
pub fn try_decode(token: &str) -> TokenDecodeResult<TokenPayload> {
    let segments: Vec<&str> = token.trim().split('.').collect();
    let &[_, payload, _] = segments.as_slice() else {
        return SegmentCountSnafu {
            count: segments.len(),
        }
        .fail();
    };

    let bytes = LENIENT_BASE64
        .decode(payload.trim_end_matches('=').as_bytes())
        .context(Base64Snafu)?;

    match serde_json::from_slice(&bytes).context(JsonSnafu)? {
        Value::Object(map) => Ok(map),
        _ => NotAnObjectSnafu.fail(),
    }
}

/// Like [`try_decode`], but logs the failure and returns `None`
pub fn decode(token: &str) -> Option<TokenPayload> {
    match try_decode(token) {
        Ok(payload) => Some(payload),
        Err(err) => {
            debug!(target: LOG_TARGET, err = %err.fmt_compact(), "Failed to decode bearer token payload");
            None
        }
    }
}

/// Payload fields that may carry the member id, in order of preference
pub const IDENTITY_FIELDS: [&str; 6] = ["id", "memberId", "userId", "user_id", "member_id", "jti"];

/// One way of recovering a [`MemberId`] from a key-value payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityStrategy {
    /// The named field holds an integer, or a string of digits
    Field(&'static str),
    /// `sub` looks like `<digits>@domain`
    SubjectEmailPrefix,
}

/// All strategies, in the order they are tried
pub const IDENTITY_STRATEGIES: [IdentityStrategy; 7] = [
    IdentityStrategy::Field(IDENTITY_FIELDS[0]),
    IdentityStrategy::Field(IDENTITY_FIELDS[1]),
    IdentityStrategy::Field(IDENTITY_FIELDS[2]),
    IdentityStrategy::Field(IDENTITY_FIELDS[3]),
    IdentityStrategy::Field(IDENTITY_FIELDS[4]),
    IdentityStrategy::Field(IDENTITY_FIELDS[5]),
    IdentityStrategy::SubjectEmailPrefix,
];

impl IdentityStrategy {
    pub fn name(self) -> &'static str {
        match self {
            IdentityStrategy::Field(field) => field,
            IdentityStrategy::SubjectEmailPrefix => "sub@",
        }
    }

    pub fn extract(self, payload: &TokenPayload) -> Option<MemberId> {
        match self {
            IdentityStrategy::Field(field) => payload.get(field).and_then(MemberId::from_json),
            IdentityStrategy::SubjectEmailPrefix => {
                let (prefix, _domain) = payload.get("sub")?.as_str()?.split_once('@')?;
                prefix.parse().ok()
            }
        }
    }
}

/// Try [`IDENTITY_STRATEGIES`] in order, return the first recovered id
pub fn extract_identity(payload: &TokenPayload) -> Option<MemberId> {
    IDENTITY_STRATEGIES.iter().find_map(|strategy| {
        let id = strategy.extract(payload)?;
        trace!(target: LOG_TARGET, strategy = strategy.name(), %id, "Identity recovered");
        Some(id)
    })
}

/// Decode `token` and recover the member id from its payload
pub fn identity_from_token(token: &str) -> Option<MemberId> {
    let payload = decode(token)?;
    let id = extract_identity(&payload);
    if id.is_none() {
        debug!(target: LOG_TARGET, "Token payload carries no numeric identity");
    }
    id
}
