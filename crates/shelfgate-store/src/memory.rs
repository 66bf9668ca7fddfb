use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::{LocalStorage, StoreResult};

/// Process-lifetime storage
///
/// Used for state that must not survive a restart, and in tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.items.lock().expect("Locking failed").get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        self.items
            .lock()
            .expect("Locking failed")
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn take_item(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.items.lock().expect("Locking failed").remove(key))
    }
}
