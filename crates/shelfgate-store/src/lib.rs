//! Local persisted state: a small string key-value storage, and the
//! [`SessionStore`] on top of it.
//!
//! All operations are synchronous. Each one is atomic on its own, nothing
//! spans more than a single operation.

mod memory;
mod redb_storage;

use std::sync::Arc;
use std::{fmt, io};

pub use memory::MemoryStorage;
pub use redb_storage::RedbStorage;
use shelfgate_core::Session;
use shelfgate_util_error::FmtCompact as _;
use snafu::{Location, ResultExt as _, Snafu};
use tracing::{debug, warn};

const LOG_TARGET: &str = "shelfgate::store";

/// Key of the JSON-encoded [`Session`]
pub const USER_KEY: &str = "user";
/// Key of the raw bearer token
pub const TOKEN_KEY: &str = "token";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StoreError {
    Database {
        source: redb::DatabaseError,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(transparent)]
    Table {
        source: redb::TableError,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(transparent)]
    Storage {
        source: redb::StorageError,
        #[snafu(implicit)]
        location: Location,
    },
    Transaction {
        #[snafu(source(from(redb::TransactionError, Box::new)))]
        source: Box<redb::TransactionError>,
        #[snafu(implicit)]
        location: Location,
    },
    Commit {
        source: redb::CommitError,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Can't create storage directory"))]
    DataDir {
        source: io::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Can't encode session"))]
    Encode {
        source: serde_json::Error,
        #[snafu(implicit)]
        location: Location,
    },
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// String key-value storage, in the spirit of the browser's `localStorage`
pub trait LocalStorage: fmt::Debug + Send + Sync {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove `key`, returning the value it had
    ///
    /// Must be atomic: two concurrent takes can not both observe the value.
    fn take_item(&self, key: &str) -> StoreResult<Option<String>>;

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        self.take_item(key).map(|_| ())
    }
}

/// Persisted record of the current user
///
/// Cheap to clone, all clones share the same storage.
#[derive(Debug, Clone)]
pub struct SessionStore {
    storage: Arc<dyn LocalStorage>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self { storage }
    }

    /// A store that forgets everything when dropped
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Read the stored session
    ///
    /// A missing, unparseable or non-object record reads as the default
    /// (logged out) session. Only storage failures are errors.
    pub fn try_get(&self) -> StoreResult<Session> {
        let Some(raw) = self.storage.get_item(USER_KEY)? else {
            return Ok(Session::default());
        };

        let value: serde_json::Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                warn!(target: LOG_TARGET, err = %err.fmt_compact(), "Stored session is not valid JSON, ignoring");
                return Ok(Session::default());
            }
        };

        if !value.is_object() {
            debug!(target: LOG_TARGET, "Stored session is not an object, treating as cleared");
            return Ok(Session::default());
        }

        match serde_json::from_value(value) {
            Ok(session) => Ok(session),
            Err(err) => {
                warn!(target: LOG_TARGET, err = %err.fmt_compact(), "Stored session is malformed, ignoring");
                Ok(Session::default())
            }
        }
    }

    /// Like [`Self::try_get`], but a storage failure reads as logged out
    pub fn get(&self) -> Session {
        self.try_get().unwrap_or_else(|err| {
            warn!(target: LOG_TARGET, err = %err.fmt_compact(), "Failed to read session, treating as logged out");
            Session::default()
        })
    }

    pub fn set(&self, session: &Session) -> StoreResult<()> {
        let raw = serde_json::to_string(session).context(EncodeSnafu)?;
        self.storage.set_item(USER_KEY, &raw)
    }

    /// Forget the session and the token
    pub fn clear(&self) -> StoreResult<()> {
        self.storage.remove_item(USER_KEY)?;
        self.storage.remove_item(TOKEN_KEY)?;
        Ok(())
    }

    pub fn token(&self) -> StoreResult<Option<String>> {
        self.storage.get_item(TOKEN_KEY)
    }

    pub fn set_token(&self, token: &str) -> StoreResult<()> {
        self.storage.set_item(TOKEN_KEY, token)
    }

    pub fn remove_token(&self) -> StoreResult<()> {
        self.storage.remove_item(TOKEN_KEY)
    }
}
