//! In-memory snapshot storage (primarily for tests).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::{StorageError, StorageResult};

use super::SnapshotStorage;

/// Shared in-memory key-value storage.
///
/// Clones share the same underlying map, so a test can hand one clone to the
/// session and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemorySnapshotStorage {
    /// Create an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| StorageError::Backend("snapshot storage lock poisoned".to_string()))
    }
}

impl SnapshotStorage for MemorySnapshotStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}
