use std::path::{Path, PathBuf};
use std::{fmt, fs};

use redb::{ReadableTable as _, TableDefinition};
use snafu::ResultExt as _;
use tracing::debug;

use crate::{
    CommitSnafu, DataDirSnafu, DatabaseSnafu, LOG_TARGET, LocalStorage, StoreResult,
    TransactionSnafu,
};

/// Key: item key
/// Value: item value
const ITEMS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("shelfgate::local_storage");

const DB_FILE_NAME: &str = "shelfgate.redb";

/// Durable storage in a single redb file
pub struct RedbStorage {
    db: redb::Database,
    path: PathBuf,
}

impl fmt::Debug for RedbStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedbStorage")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RedbStorage {
    pub fn mk_db_path(data_dir: &Path) -> StoreResult<PathBuf> {
        fs::create_dir_all(data_dir).context(DataDirSnafu)?;
        Ok(data_dir.join(DB_FILE_NAME))
    }

    /// Open (or create) the database at `path`
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_owned();
        debug!(target: LOG_TARGET, path = %path.display(), "Opening local storage");

        let db = redb::Database::create(&path).context(DatabaseSnafu)?;

        // Make sure the table exists, so read transactions can always open it
        let tx = db.begin_write().context(TransactionSnafu)?;
        tx.open_table(ITEMS_TABLE)?;
        tx.commit().context(CommitSnafu)?;

        Ok(Self { db, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_with<T>(
        &self,
        f: impl FnOnce(&mut redb::Table<'_, &'static str, &'static str>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let tx = self.db.begin_write().context(TransactionSnafu)?;
        let res = {
            let mut table = tx.open_table(ITEMS_TABLE)?;
            f(&mut table)?
        };
        tx.commit().context(CommitSnafu)?;
        Ok(res)
    }
}

impl LocalStorage for RedbStorage {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        let tx = self.db.begin_read().context(TransactionSnafu)?;
        let table = tx.open_table(ITEMS_TABLE)?;

        let value = table.get(key)?.map(|v| v.value().to_owned());
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        self.write_with(|table| {
            table.insert(key, value)?;
            Ok(())
        })
    }

    fn take_item(&self, key: &str) -> StoreResult<Option<String>> {
        self.write_with(|table| {
            let value = table.remove(key)?.map(|v| v.value().to_owned());
            Ok(value)
        })
    }
}
