//! In-memory draft catalog (primarily for tests).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{PublishError, PublishResult, RemoteError, RemoteResult};
use crate::models::{DraftId, ProductDraft};

use super::{PublishApi, RemoteDraftRecord, RemoteDraftStore};

/// In-memory stand-in for the draft and publish resources.
///
/// Stamps `saved_at` from its own clock the way the server does, forgets
/// published records as drafts, and offers failure/latency injection so
/// tests can exercise offline and out-of-order-response behavior.
pub struct MemoryDraftCatalog {
    state: Mutex<CatalogState>,
    clock: Arc<dyn Clock>,
}

#[derive(Default)]
struct CatalogState {
    drafts: HashMap<DraftId, ProductDraft>,
    products: HashMap<String, ProductDraft>,
    offline: bool,
    response_latency: Duration,
    create_calls: usize,
    update_calls: usize,
}

impl MemoryDraftCatalog {
    /// Create an empty catalog stamping server time from `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(CatalogState::default()),
            clock,
        }
    }

    /// Simulate network loss: every call fails with `Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Delay write responses; the write itself commits immediately, only the
    /// response lingers in transit.
    pub fn set_response_latency(&self, latency: Duration) {
        self.lock().response_latency = latency;
    }

    /// Number of `create` calls served (including failed ones).
    pub fn create_calls(&self) -> usize {
        self.lock().create_calls
    }

    /// Number of `update` calls served (including failed ones).
    pub fn update_calls(&self) -> usize {
        self.lock().update_calls
    }

    /// Current draft record at `id`, bypassing the store interface.
    pub fn draft(&self, id: &DraftId) -> Option<ProductDraft> {
        self.lock().drafts.get(id).cloned()
    }

    /// Number of live draft records.
    pub fn draft_count(&self) -> usize {
        self.lock().drafts.len()
    }

    /// Number of published products.
    pub fn published_count(&self) -> usize {
        self.lock().products.len()
    }

    /// Seed a draft record directly, returning its id.
    pub fn insert_draft(&self, draft: ProductDraft) -> DraftId {
        let id = DraftId::mint();
        self.lock().drafts.insert(id.clone(), draft);
        id
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CatalogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn offline_error() -> RemoteError {
    RemoteError::Unavailable("network unreachable".to_string())
}

impl RemoteDraftStore for MemoryDraftCatalog {
    async fn create(&self, draft: &ProductDraft) -> RemoteResult<RemoteDraftRecord> {
        let (latency, result) = {
            let mut state = self.lock();
            state.create_calls += 1;
            let latency = state.response_latency;
            if state.offline {
                (latency, Err(offline_error()))
            } else {
                let id = DraftId::mint();
                let mut stored = draft.clone();
                stored.saved_at = self.clock.now_ms();
                state.drafts.insert(id.clone(), stored.clone());
                (latency, Ok(RemoteDraftRecord { id, draft: stored }))
            }
        };
        tokio::time::sleep(latency).await;
        result
    }

    async fn update(&self, id: &DraftId, draft: &ProductDraft) -> RemoteResult<RemoteDraftRecord> {
        let (latency, result) = {
            let mut state = self.lock();
            state.update_calls += 1;
            let latency = state.response_latency;
            if state.offline {
                (latency, Err(offline_error()))
            } else if state.drafts.contains_key(id) {
                let mut stored = draft.clone();
                stored.saved_at = self.clock.now_ms();
                state.drafts.insert(id.clone(), stored.clone());
                (
                    latency,
                    Ok(RemoteDraftRecord {
                        id: id.clone(),
                        draft: stored,
                    }),
                )
            } else {
                (latency, Err(RemoteError::NotFound))
            }
        };
        tokio::time::sleep(latency).await;
        result
    }

    async fn fetch_by_id(&self, id: &DraftId) -> RemoteResult<Option<RemoteDraftRecord>> {
        let state = self.lock();
        if state.offline {
            return Err(offline_error());
        }
        Ok(state.drafts.get(id).map(|draft| RemoteDraftRecord {
            id: id.clone(),
            draft: draft.clone(),
        }))
    }

    async fn delete(&self, id: &DraftId) -> RemoteResult<()> {
        let mut state = self.lock();
        if state.offline {
            return Err(offline_error());
        }
        state.drafts.remove(id);
        Ok(())
    }
}

impl PublishApi for MemoryDraftCatalog {
    async fn publish(&self, id: &DraftId, draft: &ProductDraft) -> PublishResult<String> {
        let mut state = self.lock();
        if state.offline {
            return Err(PublishError::Unavailable("network unreachable".to_string()));
        }
        if state.drafts.remove(id).is_none() {
            return Err(PublishError::DraftMissing);
        }

        let product_id = Uuid::now_v7().to_string();
        state.products.insert(product_id.clone(), draft.clone());
        Ok(product_id)
    }
}
