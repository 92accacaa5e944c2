//! Local snapshot persistence.
//!
//! Holds exactly one serialized [`ProductDraft`] under a fixed key in a
//! synchronous, same-device key-value store. Write failures are absorbed
//! here: the in-memory document stays the session's source of truth, so a
//! failing local store must never interrupt typing.
//!
//! Concurrent editor instances sharing one backing store overwrite each
//! other's snapshot last-write-wins. [`SnapshotStorage`] is the seam a
//! coordinated implementation would replace.

mod memory;
mod sqlite;

use std::sync::Arc;

pub use memory::MemorySnapshotStorage;
pub use sqlite::SqliteSnapshotStorage;

use crate::clock::Clock;
use crate::error::StorageResult;
use crate::models::ProductDraft;

/// Fixed, well-known key of the single draft snapshot.
pub const SNAPSHOT_KEY: &str = "product_draft_snapshot";

/// Synchronous string key-value storage scoped to the current device.
pub trait SnapshotStorage: Send + Sync + 'static {
    /// Read the value at `key`, `None` when absent.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write `value` at `key`, overwriting any previous value.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> StorageResult<()>;
}

/// Store for the single local draft snapshot.
///
/// Ownership is not enforced here; the reconciliation engine compares
/// `owner_id` against the current principal before trusting a snapshot.
pub struct LocalSnapshotStore<S> {
    storage: S,
    clock: Arc<dyn Clock>,
}

impl<S: SnapshotStorage> LocalSnapshotStore<S> {
    /// Create a store over the given backing storage.
    pub fn new(storage: S, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Persist `draft` with `saved_at` stamped to the current time.
    ///
    /// Returns the stamped timestamp. A failing write is logged and treated
    /// as a no-op; the caller keeps editing against the in-memory document.
    pub fn save(&self, draft: &ProductDraft) -> i64 {
        let saved_at = self.clock.now_ms();
        let mut stamped = draft.clone();
        stamped.saved_at = saved_at;

        let result = serde_json::to_string(&stamped)
            .map_err(Into::into)
            .and_then(|payload| self.storage.set(SNAPSHOT_KEY, &payload));
        if let Err(error) = result {
            tracing::warn!("Failed to write local draft snapshot: {error}");
        }
        saved_at
    }

    /// Load the current snapshot.
    ///
    /// Returns `None` when absent, unreadable, or corrupt; corrupt data is
    /// treated as absent, not as an error.
    pub fn load(&self) -> Option<ProductDraft> {
        let payload = match self.storage.get(SNAPSHOT_KEY) {
            Ok(Some(payload)) => payload,
            Ok(None) => return None,
            Err(error) => {
                tracing::warn!("Failed to read local draft snapshot: {error}");
                return None;
            }
        };

        match serde_json::from_str(&payload) {
            Ok(draft) => Some(draft),
            Err(error) => {
                tracing::warn!("Discarding corrupt local draft snapshot: {error}");
                None
            }
        }
    }

    /// Remove the snapshot; subsequent loads return `None` until the next save.
    pub fn clear(&self) {
        if let Err(error) = self.storage.remove(SNAPSHOT_KEY) {
            tracing::warn!("Failed to clear local draft snapshot: {error}");
        }
    }
}
