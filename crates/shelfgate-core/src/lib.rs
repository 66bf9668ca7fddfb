mod id;
pub mod route;
mod session;
pub mod token;
mod verdict;

pub use id::{MemberId, MemberIdParseError, RawMemberId};
pub use session::Session;
pub use verdict::{LOGIN_PATH, SUBSCRIPTION_PATH, Verdict};

/// Title used when the navigation target does not define its own
pub const DEFAULT_TITLE: &str = "밀리의 서재";
