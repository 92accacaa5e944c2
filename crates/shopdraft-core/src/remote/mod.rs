//! Remote draft persistence ports and implementations.
//!
//! The remote store is the multi-device-visible copy of a draft, addressed
//! by a server-assigned id. The publish port converts a draft into a
//! permanent catalog record. Both are the session's only suspension points.

mod http;
mod memory;

use std::future::Future;
use std::sync::Arc;

pub use http::{HttpDraftStore, HttpPublishClient};
pub use memory::MemoryDraftCatalog;

use serde::{Deserialize, Serialize};

use crate::error::{PublishResult, RemoteResult};
use crate::models::{DraftId, ProductDraft};

/// A draft record as stored server-side.
///
/// `draft.saved_at` carries the server clock; server time is authoritative
/// for remote saves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDraftRecord {
    pub id: DraftId,
    #[serde(flatten)]
    pub draft: ProductDraft,
}

/// CRUD access to remote draft records.
pub trait RemoteDraftStore: Send + Sync + 'static {
    /// Persist a new record; the response carries the server-assigned id.
    fn create(
        &self,
        draft: &ProductDraft,
    ) -> impl Future<Output = RemoteResult<RemoteDraftRecord>> + Send;

    /// Overwrite the record at `id`; the server stamps `saved_at`.
    fn update(
        &self,
        id: &DraftId,
        draft: &ProductDraft,
    ) -> impl Future<Output = RemoteResult<RemoteDraftRecord>> + Send;

    /// Fetch the record at `id`.
    ///
    /// Absence (including ids that have since been published) is `Ok(None)`;
    /// only transport failure is an error.
    fn fetch_by_id(
        &self,
        id: &DraftId,
    ) -> impl Future<Output = RemoteResult<Option<RemoteDraftRecord>>> + Send;

    /// Remove the record at `id`. Deleting a non-existent id is not an error.
    fn delete(&self, id: &DraftId) -> impl Future<Output = RemoteResult<()>> + Send;
}

/// Conversion of a draft into a permanent catalog record.
pub trait PublishApi: Send + Sync + 'static {
    /// Publish the final fields of the draft at `id`.
    ///
    /// Returns the permanent product id. A second call after success fails
    /// with `DraftMissing` rather than duplicating the record.
    fn publish(
        &self,
        id: &DraftId,
        draft: &ProductDraft,
    ) -> impl Future<Output = PublishResult<String>> + Send;
}

impl<T: RemoteDraftStore> RemoteDraftStore for Arc<T> {
    fn create(
        &self,
        draft: &ProductDraft,
    ) -> impl Future<Output = RemoteResult<RemoteDraftRecord>> + Send {
        T::create(self, draft)
    }

    fn update(
        &self,
        id: &DraftId,
        draft: &ProductDraft,
    ) -> impl Future<Output = RemoteResult<RemoteDraftRecord>> + Send {
        T::update(self, id, draft)
    }

    fn fetch_by_id(
        &self,
        id: &DraftId,
    ) -> impl Future<Output = RemoteResult<Option<RemoteDraftRecord>>> + Send {
        T::fetch_by_id(self, id)
    }

    fn delete(&self, id: &DraftId) -> impl Future<Output = RemoteResult<()>> + Send {
        T::delete(self, id)
    }
}

impl<T: PublishApi> PublishApi for Arc<T> {
    fn publish(
        &self,
        id: &DraftId,
        draft: &ProductDraft,
    ) -> impl Future<Output = PublishResult<String>> + Send {
        T::publish(self, id, draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_flat() {
        let mut draft = ProductDraft::empty();
        draft.name = "Cable".to_string();
        draft.saved_at = 42;
        let record = RemoteDraftRecord {
            id: DraftId::from("d1"),
            draft,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], "d1");
        assert_eq!(json["name"], "Cable");
        assert_eq!(json["saved_at"], 42);

        let parsed: RemoteDraftRecord = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, record);
    }
}
