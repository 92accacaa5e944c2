//! Draft editing session - the lifecycle controller.
//!
//! Owns the authoritative draft id and drives create -> autosave ->
//! publish-or-discard. Constructed per editing session and torn down on
//! navigation away; independent sessions can coexist, which is what the
//! tests rely on.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::clock::{Clock, SystemClock};
use crate::error::{PublishError, PublishResult, RemoteError, RemoteResult};
use crate::models::{DraftId, ProductDraft, SaveEvent, SaveOutcome, SaveStatus, SaveTarget};
use crate::reconcile::{self, LoadOutcome};
use crate::remote::{PublishApi, RemoteDraftStore};
use crate::scheduler::{DebounceScheduler, DEFAULT_QUIET_PERIOD};
use crate::snapshot::{LocalSnapshotStore, SnapshotStorage};

/// Lifecycle of the session's draft. `Published` and `Discarded` are
/// terminal; both invalidate the draft id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// No remote record yet; the first successful remote save binds.
    New,
    /// A remote record exists under the active draft id.
    Bound,
    /// Converted into a permanent catalog record.
    Published,
    /// Destroyed on both sides.
    Discarded,
}

/// Both candidate documents of an unresolved load conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictCandidates {
    pub local: ProductDraft,
    pub remote: ProductDraft,
}

/// The user's whole-document pick for a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictChoice {
    Local,
    Remote,
}

/// Construction context for [`DraftSession::begin`].
pub struct SessionContext {
    current_owner: Option<String>,
    navigation_draft: Option<DraftId>,
    clock: Arc<dyn Clock>,
    quiet_period: Duration,
}

impl SessionContext {
    /// Context for the given principal (`None` for anonymous sessions).
    #[must_use]
    pub fn new(current_owner: Option<String>) -> Self {
        Self {
            current_owner,
            navigation_draft: None,
            clock: Arc::new(SystemClock),
            quiet_period: DEFAULT_QUIET_PERIOD,
        }
    }

    /// Resume the remote draft referenced by the navigation context.
    #[must_use]
    pub fn with_navigation_draft(mut self, id: DraftId) -> Self {
        self.navigation_draft = Some(id);
        self
    }

    /// Override the timestamp source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Override the autosave quiet period.
    #[must_use]
    pub const fn with_quiet_period(mut self, quiet_period: Duration) -> Self {
        self.quiet_period = quiet_period;
        self
    }
}

struct SessionState {
    document: ProductDraft,
    lifecycle: Lifecycle,
    active_draft_id: Option<DraftId>,
    save_status: SaveStatus,
    last_save_error: Option<RemoteError>,
    conflict: Option<ConflictCandidates>,
    /// Floor for applying remote responses; older stamps are stale.
    remote_saved_at: i64,
    /// Local changes not yet confirmed by the remote store.
    remote_dirty: bool,
    /// Set when the bound id turned out to be gone; stops the retry loop.
    remote_gone: bool,
    create_inflight: bool,
}

struct SessionInner<S, R, P> {
    local: LocalSnapshotStore<S>,
    remote: R,
    publisher: P,
    scheduler: DebounceScheduler,
    owner_id: Option<String>,
    state: Mutex<SessionState>,
}

/// Handle to one draft editing session.
///
/// Cheap to clone; clones share the same state. All remote persistence runs
/// through this type so the stale-response and single-create rules hold.
pub struct DraftSession<S, R, P> {
    inner: Arc<SessionInner<S, R, P>>,
}

impl<S, R, P> Clone for DraftSession<S, R, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

enum RemoteWrite {
    Create,
    Update(DraftId),
}

impl<S, R, P> DraftSession<S, R, P>
where
    S: SnapshotStorage,
    R: RemoteDraftStore,
    P: PublishApi,
{
    /// Load both snapshots, reconcile, and start the session.
    ///
    /// The remote snapshot is fetched only when the navigation context
    /// referenced a draft id. An unreachable remote degrades to local-only
    /// loading with an error status; typing is never blocked by transport.
    pub async fn begin(context: SessionContext, storage: S, remote: R, publisher: P) -> Self {
        let local_store = LocalSnapshotStore::new(storage, context.clock.clone());
        let local_snapshot = local_store.load();

        let mut remote_snapshot = None;
        let mut fetched_id = None;
        let mut initial_error = None;
        if let Some(id) = &context.navigation_draft {
            match remote.fetch_by_id(id).await {
                Ok(Some(record)) => {
                    fetched_id = Some(record.id);
                    remote_snapshot = Some(record.draft);
                }
                Ok(None) => {
                    tracing::warn!(draft_id = %id, "Referenced draft is no longer available remotely");
                }
                Err(error) => {
                    tracing::warn!(draft_id = %id, "Could not fetch remote draft: {error}");
                    initial_error = Some(error);
                }
            }
        }

        let owner = context.current_owner.as_deref();
        let outcome = reconcile::reconcile(local_snapshot, remote_snapshot, owner);

        let mut state = SessionState {
            document: reconcile::fresh_document(owner),
            lifecycle: Lifecycle::New,
            active_draft_id: None,
            save_status: SaveStatus::Idle,
            last_save_error: None,
            conflict: None,
            remote_saved_at: 0,
            remote_dirty: false,
            remote_gone: false,
            create_inflight: false,
        };

        match outcome {
            LoadOutcome::Fresh(document) => state.document = document,
            LoadOutcome::Local(document) => {
                state.document = document;
                state.remote_dirty = true;
            }
            LoadOutcome::Remote(document) => {
                state.remote_saved_at = document.saved_at;
                state.document = document;
                state.save_status = SaveStatus::Saved;
                state.lifecycle = Lifecycle::Bound;
                state.active_draft_id = fetched_id;
            }
            LoadOutcome::Conflict { local, remote } => {
                state.conflict = Some(ConflictCandidates { local, remote });
                state.lifecycle = Lifecycle::Bound;
                state.active_draft_id = fetched_id;
            }
        }
        if let Some(error) = initial_error {
            state.save_status = SaveStatus::Error;
            state.last_save_error = Some(error);
        }

        Self {
            inner: Arc::new(SessionInner {
                local: local_store,
                remote,
                publisher,
                scheduler: DebounceScheduler::new(context.quiet_period),
                owner_id: context.current_owner,
                state: Mutex::new(state),
            }),
        }
    }

    /// Apply one field mutation.
    ///
    /// The local snapshot is written immediately; the remote write is
    /// debounced behind the quiet period, and a newer edit supersedes the
    /// pending timer. Ignored in terminal states and while a conflict is
    /// unresolved.
    pub async fn edit(&self, mut draft: ProductDraft) -> SaveEvent {
        let saved_at = {
            let mut state = self.inner.state.lock().await;
            if matches!(state.lifecycle, Lifecycle::Published | Lifecycle::Discarded) {
                tracing::warn!("Ignoring edit on a terminated draft session");
                return skipped(SaveTarget::Local);
            }
            if state.conflict.is_some() {
                tracing::warn!("Ignoring edit while a draft conflict is unresolved");
                return skipped(SaveTarget::Local);
            }

            if draft.owner_id.is_none() {
                draft.owner_id = self.inner.owner_id.clone();
            }
            let saved_at = self.inner.local.save(&draft);
            draft.saved_at = saved_at;
            state.document = draft;
            state.remote_dirty = true;
            saved_at
        };

        let token = self.inner.scheduler.begin_edit();
        let session = self.clone();
        tokio::spawn(async move {
            if session.inner.scheduler.wait_for_quiet(token).await {
                session.persist_remote().await;
            }
        });

        SaveEvent {
            target: SaveTarget::Local,
            outcome: SaveOutcome::Saved { saved_at },
        }
    }

    /// Cancel any pending timer and persist remotely right now.
    ///
    /// Used by the explicit "Save Draft" action and before navigation away.
    pub async fn flush_now(&self) -> SaveEvent {
        self.inner.scheduler.supersede();
        self.persist_remote().await
    }

    /// Drop any pending debounced write without persisting.
    pub fn cancel_pending(&self) {
        self.inner.scheduler.supersede();
    }

    /// Resolve a pending load conflict with a whole-document choice.
    ///
    /// Picking local leaves the document unsaved-remote, so the next
    /// debounce or flush writes it; picking remote needs no forced write.
    /// Returns the chosen document, or `None` when no conflict was pending.
    pub async fn resolve_conflict(&self, choice: ConflictChoice) -> Option<ProductDraft> {
        let mut state = self.inner.state.lock().await;
        let candidates = state.conflict.take()?;
        match choice {
            ConflictChoice::Local => {
                state.document = candidates.local;
                state.remote_dirty = true;
                state.save_status = SaveStatus::Idle;
            }
            ConflictChoice::Remote => {
                state.remote_saved_at = candidates.remote.saved_at;
                state.document = candidates.remote;
                state.remote_dirty = false;
                state.save_status = SaveStatus::Saved;
            }
        }
        tracing::debug!(?choice, "Draft conflict resolved");
        Some(state.document.clone())
    }

    /// Convert the draft into a permanent catalog record.
    ///
    /// Flushes first so a never-synced draft reaches the remote store. On
    /// success the remote draft record is deleted, the local snapshot is
    /// cleared, and the session terminates. On failure everything stays
    /// intact and the error blocks only this action.
    pub async fn publish(&self, final_fields: ProductDraft) -> PublishResult<String> {
        {
            let state = self.inner.state.lock().await;
            if matches!(state.lifecycle, Lifecycle::Published | Lifecycle::Discarded) {
                return Err(PublishError::DraftMissing);
            }
            if state.conflict.is_some() {
                return Err(PublishError::Rejected(
                    "draft has an unresolved conflict".to_string(),
                ));
            }
        }

        self.edit(final_fields).await;
        let flush = self.flush_now().await;
        if let SaveOutcome::Failed { message } = flush.outcome {
            return Err(PublishError::Unavailable(message));
        }

        let (id, document) = {
            let state = self.inner.state.lock().await;
            match (state.lifecycle, &state.active_draft_id) {
                (Lifecycle::Bound, Some(id)) => (id.clone(), state.document.clone()),
                _ => {
                    return Err(PublishError::Unavailable(
                        "draft has not reached the remote store".to_string(),
                    ))
                }
            }
        };

        let product_id = self.inner.publisher.publish(&id, &document).await?;
        tracing::debug!(draft_id = %id, product_id = %product_id, "Draft published");

        {
            let mut state = self.inner.state.lock().await;
            state.lifecycle = Lifecycle::Published;
            state.active_draft_id = None;
            state.remote_dirty = false;
            state.save_status = SaveStatus::Idle;
        }
        self.inner.scheduler.supersede();
        self.inner.local.clear();
        // The server already treats published drafts as gone and delete is
        // idempotent, so a failure here cannot resurrect the record.
        self.delete_remote_record(id).await;
        Ok(product_id)
    }

    /// Destroy the draft on both sides. Destructive and user-confirmed;
    /// there is no undo.
    ///
    /// A failing remote delete blocks the transition so the record never
    /// silently outlives a confirmed discard.
    pub async fn discard(&self) -> RemoteResult<()> {
        self.inner.scheduler.supersede();

        let id = {
            let state = self.inner.state.lock().await;
            if matches!(state.lifecycle, Lifecycle::Published | Lifecycle::Discarded) {
                return Ok(());
            }
            state.active_draft_id.clone()
        };

        if let Some(id) = &id {
            self.inner.remote.delete(id).await?;
        }
        self.inner.local.clear();

        let mut state = self.inner.state.lock().await;
        state.lifecycle = Lifecycle::Discarded;
        state.active_draft_id = None;
        state.conflict = None;
        state.document = reconcile::fresh_document(self.inner.owner_id.as_deref());
        state.remote_dirty = false;
        state.remote_gone = false;
        state.save_status = SaveStatus::Idle;
        tracing::debug!("Draft discarded");
        Ok(())
    }

    /// The currently reconciled document.
    pub async fn document(&self) -> ProductDraft {
        self.inner.state.lock().await.document.clone()
    }

    /// Save-status signal for the editing surface.
    pub async fn save_status(&self) -> SaveStatus {
        self.inner.state.lock().await.save_status
    }

    /// Most recent remote failure, if any.
    pub async fn last_save_error(&self) -> Option<RemoteError> {
        self.inner.state.lock().await.last_save_error.clone()
    }

    /// Pending conflict candidates, if reconciliation found divergence.
    pub async fn conflict(&self) -> Option<ConflictCandidates> {
        self.inner.state.lock().await.conflict.clone()
    }

    /// The authoritative draft id, `None` until the first remote save
    /// succeeds and again after publish/discard.
    pub async fn active_draft_id(&self) -> Option<DraftId> {
        self.inner.state.lock().await.active_draft_id.clone()
    }

    /// Current lifecycle state.
    pub async fn lifecycle(&self) -> Lifecycle {
        self.inner.state.lock().await.lifecycle
    }

    /// Timestamp of the newest applied remote save.
    pub async fn last_remote_saved_at(&self) -> i64 {
        self.inner.state.lock().await.remote_saved_at
    }

    /// Whether local changes have not been confirmed remotely.
    ///
    /// Drives the unload prompt: callers should `flush_now` before letting
    /// navigation complete while this is true.
    pub async fn has_unsaved_remote_changes(&self) -> bool {
        self.inner.state.lock().await.remote_dirty
    }

    async fn persist_remote(&self) -> SaveEvent {
        let (document, write, token) = {
            let mut state = self.inner.state.lock().await;
            if matches!(state.lifecycle, Lifecycle::Published | Lifecycle::Discarded)
                || state.conflict.is_some()
                || state.remote_gone
                || !state.remote_dirty
            {
                return skipped(SaveTarget::Remote);
            }

            let write = match state.active_draft_id.clone() {
                Some(id) if state.lifecycle == Lifecycle::Bound => RemoteWrite::Update(id),
                _ => {
                    if state.create_inflight {
                        // One create at a time; exactly one id may be adopted.
                        return skipped(SaveTarget::Remote);
                    }
                    state.create_inflight = true;
                    RemoteWrite::Create
                }
            };
            state.save_status = SaveStatus::Saving;
            (
                state.document.clone(),
                write,
                self.inner.scheduler.current(),
            )
        };

        match write {
            RemoteWrite::Create => {
                let result = self.inner.remote.create(&document).await;
                let mut state = self.inner.state.lock().await;
                state.create_inflight = false;
                match result {
                    Ok(record) => {
                        if matches!(state.lifecycle, Lifecycle::Published | Lifecycle::Discarded) {
                            // The session ended while the create was in
                            // flight; do not adopt the id.
                            drop(state);
                            self.delete_remote_record(record.id).await;
                            return skipped(SaveTarget::Remote);
                        }
                        state.lifecycle = Lifecycle::Bound;
                        state.active_draft_id = Some(record.id.clone());
                        let saved_at = record.draft.saved_at;
                        apply_remote_success(&mut state, &self.inner.scheduler, token, saved_at);
                        tracing::debug!(draft_id = %record.id, "Draft bound to remote record");
                        SaveEvent {
                            target: SaveTarget::Remote,
                            outcome: SaveOutcome::Saved { saved_at },
                        }
                    }
                    Err(error) => fail_remote(&mut state, error),
                }
            }
            RemoteWrite::Update(id) => {
                let result = self.inner.remote.update(&id, &document).await;
                let mut state = self.inner.state.lock().await;
                match result {
                    Ok(record) => {
                        let saved_at = record.draft.saved_at;
                        if apply_remote_success(&mut state, &self.inner.scheduler, token, saved_at)
                        {
                            SaveEvent {
                                target: SaveTarget::Remote,
                                outcome: SaveOutcome::Saved { saved_at },
                            }
                        } else {
                            skipped(SaveTarget::Remote)
                        }
                    }
                    Err(error) => fail_remote(&mut state, error),
                }
            }
        }
    }

    async fn delete_remote_record(&self, id: DraftId) {
        if let Err(error) = self.inner.remote.delete(&id).await {
            tracing::warn!(draft_id = %id, "Failed to delete remote draft record: {error}");
        }
    }
}

const fn skipped(target: SaveTarget) -> SaveEvent {
    SaveEvent {
        target,
        outcome: SaveOutcome::Skipped,
    }
}

/// Apply a successful remote save if it is not stale.
///
/// Last-write-wins by `saved_at`, not by arrival order: a response older
/// than the applied floor leaves status, floor, and document untouched.
fn apply_remote_success(
    state: &mut SessionState,
    scheduler: &DebounceScheduler,
    token: u64,
    saved_at: i64,
) -> bool {
    if saved_at < state.remote_saved_at {
        tracing::debug!(
            stale = saved_at,
            current = state.remote_saved_at,
            "Ignoring stale remote save response"
        );
        return false;
    }

    state.remote_saved_at = saved_at;
    state.save_status = SaveStatus::Saved;
    state.last_save_error = None;
    if scheduler.is_current(token) {
        // No newer edit raced the write; the stores are in agreement.
        state.remote_dirty = false;
    }
    true
}

fn fail_remote(state: &mut SessionState, error: RemoteError) -> SaveEvent {
    if matches!(error, RemoteError::NotFound) && state.lifecycle == Lifecycle::Bound {
        tracing::warn!("Remote draft no longer exists; suspending remote autosave");
        state.remote_gone = true;
    } else {
        tracing::warn!("Remote draft save failed: {error}");
    }
    state.save_status = SaveStatus::Error;
    state.last_save_error = Some(error.clone());
    SaveEvent {
        target: SaveTarget::Remote,
        outcome: SaveOutcome::Failed {
            message: error.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::remote::MemoryDraftCatalog;
    use crate::snapshot::{MemorySnapshotStorage, SNAPSHOT_KEY};
    use pretty_assertions::assert_eq;

    type TestSession =
        DraftSession<MemorySnapshotStorage, Arc<MemoryDraftCatalog>, Arc<MemoryDraftCatalog>>;

    struct Harness {
        clock: Arc<ManualClock>,
        storage: MemorySnapshotStorage,
        catalog: Arc<MemoryDraftCatalog>,
    }

    impl Harness {
        fn new(start_ms: i64) -> Self {
            let clock = Arc::new(ManualClock::new(start_ms));
            Self {
                storage: MemorySnapshotStorage::new(),
                catalog: Arc::new(MemoryDraftCatalog::new(clock.clone())),
                clock,
            }
        }

        fn context(&self, owner: Option<&str>) -> SessionContext {
            SessionContext::new(owner.map(str::to_string)).with_clock(self.clock.clone())
        }

        async fn session(&self, context: SessionContext) -> TestSession {
            DraftSession::begin(
                context,
                self.storage.clone(),
                self.catalog.clone(),
                self.catalog.clone(),
            )
            .await
        }

        fn local_store(&self) -> LocalSnapshotStore<MemorySnapshotStorage> {
            LocalSnapshotStore::new(self.storage.clone(), self.clock.clone())
        }

        fn named(&self, name: &str) -> ProductDraft {
            let mut draft = ProductDraft::empty();
            draft.name = name.to_string();
            draft
        }

        fn owned(&self, name: &str, owner: &str) -> ProductDraft {
            let mut draft = self.named(name);
            draft.owner_id = Some(owner.to_string());
            draft
        }
    }

    #[tokio::test(start_paused = true)]
    async fn every_edit_is_immediately_durable_locally() {
        let h = Harness::new(1_000);
        let session = h.session(h.context(Some("alice"))).await;

        session.edit(h.named("12V Battery")).await;
        let first = h.local_store().load().unwrap();
        assert_eq!(first.name, "12V Battery");
        assert_eq!(first.owner_id.as_deref(), Some("alice"));

        h.clock.advance(500);
        session.edit(h.named("12V Battery Pro")).await;
        let second = h.local_store().load().unwrap();
        assert_eq!(second.name, "12V Battery Pro");
        assert!(second.saved_at >= first.saved_at);
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_coalesce_into_one_remote_write() {
        let h = Harness::new(0);
        let session = h.session(h.context(Some("alice"))).await;

        session.edit(h.named("12V")).await;
        tokio::time::sleep(Duration::from_millis(500)).await;
        session.edit(h.named("12V Battery")).await;
        tokio::time::sleep(Duration::from_millis(500)).await;
        session.edit(h.named("12V Battery Pro")).await;

        tokio::time::sleep(Duration::from_secs(3)).await;

        assert_eq!(h.catalog.create_calls(), 1);
        assert_eq!(h.catalog.update_calls(), 0);
        assert_eq!(session.lifecycle().await, Lifecycle::Bound);
        assert_eq!(session.save_status().await, SaveStatus::Saved);
        assert!(!session.has_unsaved_remote_changes().await);

        let id = session.active_draft_id().await.unwrap();
        assert_eq!(h.catalog.draft(&id).unwrap().name, "12V Battery Pro");
    }

    #[tokio::test(start_paused = true)]
    async fn stale_remote_response_is_ignored() {
        let h = Harness::new(1_000);
        let session = h.session(h.context(Some("alice"))).await;

        session.edit(h.named("v1")).await;
        session.flush_now().await;
        assert_eq!(session.lifecycle().await, Lifecycle::Bound);

        // First update: committed at 2_000 but its response lingers in
        // transit for ten seconds.
        h.clock.set(2_000);
        h.catalog.set_response_latency(Duration::from_secs(10));
        session.edit(h.named("slow")).await;
        let slow = tokio::spawn({
            let session = session.clone();
            async move { session.flush_now().await }
        });
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        // Second update lands first with the newer stamp.
        h.clock.set(3_000);
        h.catalog.set_response_latency(Duration::from_secs(1));
        session.edit(h.named("fast")).await;
        let fast = session.flush_now().await;
        assert_eq!(
            fast.outcome,
            SaveOutcome::Saved { saved_at: 3_000 },
            "newer write should apply"
        );

        // The older response arrives last and must change nothing.
        let slow_event = slow.await.unwrap();
        assert_eq!(slow_event.outcome, SaveOutcome::Skipped);
        assert_eq!(session.last_remote_saved_at().await, 3_000);
        assert_eq!(session.save_status().await, SaveStatus::Saved);
        assert_eq!(session.document().await.name, "fast");
    }

    #[tokio::test(start_paused = true)]
    async fn publish_clears_both_stores_and_terminates() {
        let h = Harness::new(1_000);
        let session = h.session(h.context(Some("alice"))).await;

        session.edit(h.named("12V Battery")).await;
        let product_id = session.publish(h.named("12V Battery Pro")).await.unwrap();
        assert!(!product_id.is_empty());

        assert_eq!(session.lifecycle().await, Lifecycle::Published);
        assert_eq!(session.active_draft_id().await, None);
        assert_eq!(h.storage.get(SNAPSHOT_KEY).unwrap(), None);
        assert_eq!(h.catalog.draft_count(), 0);
        assert_eq!(h.catalog.published_count(), 1);

        // A second publish fails cleanly instead of duplicating.
        let again = session.publish(h.named("12V Battery Pro")).await;
        assert_eq!(again, Err(PublishError::DraftMissing));
        assert_eq!(h.catalog.published_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_publish_keeps_the_draft() {
        let h = Harness::new(0);
        let session = h.session(h.context(Some("alice"))).await;
        session.edit(h.named("keep me")).await;
        session.flush_now().await;

        h.catalog.set_offline(true);
        let result = session.publish(h.named("final")).await;
        assert!(matches!(result, Err(PublishError::Unavailable(_))));

        assert_eq!(session.lifecycle().await, Lifecycle::Bound);
        assert_eq!(h.catalog.draft_count(), 1);
        assert!(h.storage.get(SNAPSHOT_KEY).unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn discard_removes_draft_everywhere() {
        let h = Harness::new(0);
        let session = h.session(h.context(Some("alice"))).await;

        session.edit(h.named("doomed")).await;
        session.flush_now().await;
        assert_eq!(h.catalog.draft_count(), 1);

        session.discard().await.unwrap();
        assert_eq!(session.lifecycle().await, Lifecycle::Discarded);
        assert_eq!(session.active_draft_id().await, None);
        assert_eq!(h.storage.get(SNAPSHOT_KEY).unwrap(), None);
        assert_eq!(h.catalog.draft_count(), 0);

        // Editing a discarded session is a no-op.
        let event = session.edit(h.named("zombie")).await;
        assert_eq!(event.outcome, SaveOutcome::Skipped);
    }

    #[tokio::test(start_paused = true)]
    async fn remote_outage_never_blocks_local_editing() {
        let h = Harness::new(0);
        let session = h.session(h.context(Some("alice"))).await;

        h.catalog.set_offline(true);
        session.edit(h.named("offline edit")).await;
        let event = session.flush_now().await;
        assert!(matches!(event.outcome, SaveOutcome::Failed { .. }));
        assert_eq!(session.save_status().await, SaveStatus::Error);
        assert!(matches!(
            session.last_save_error().await,
            Some(RemoteError::Unavailable(_))
        ));
        assert_eq!(h.local_store().load().unwrap().name, "offline edit");
        assert_eq!(session.lifecycle().await, Lifecycle::New);

        // The next natural edit retries; no background retry loop needed.
        h.catalog.set_offline(false);
        session.edit(h.named("back online")).await;
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(session.save_status().await, SaveStatus::Saved);
        assert_eq!(session.lifecycle().await, Lifecycle::Bound);
        assert_eq!(h.catalog.create_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dead_draft_id_stops_remote_autosave() {
        let h = Harness::new(0);
        let session = h.session(h.context(Some("alice"))).await;
        session.edit(h.named("v1")).await;
        session.flush_now().await;
        let id = session.active_draft_id().await.unwrap();

        // Published or deleted from another device.
        h.catalog.delete(&id).await.unwrap();

        session.edit(h.named("v2")).await;
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(session.last_save_error().await, Some(RemoteError::NotFound));
        assert_eq!(session.save_status().await, SaveStatus::Error);

        let updates = h.catalog.update_calls();
        session.edit(h.named("v3")).await;
        tokio::time::sleep(Duration::from_secs(3)).await;
        // No retry loop against the dead id; local snapshots continue.
        assert_eq!(h.catalog.update_calls(), updates);
        assert_eq!(h.local_store().load().unwrap().name, "v3");
    }

    #[tokio::test(start_paused = true)]
    async fn reload_without_remote_reference_loads_local() {
        let h = Harness::new(5_000);
        h.local_store().save(&h.owned("local copy", "alice"));

        let session = h.session(h.context(Some("alice"))).await;
        assert_eq!(session.document().await.name, "local copy");
        assert_eq!(session.lifecycle().await, Lifecycle::New);
        assert!(session.has_unsaved_remote_changes().await);
    }

    #[tokio::test(start_paused = true)]
    async fn foreign_local_snapshot_starts_fresh() {
        let h = Harness::new(5_000);
        h.local_store().save(&h.owned("bobs work", "bob"));

        let session = h.session(h.context(Some("alice"))).await;
        assert!(session.document().await.is_empty());
        assert_eq!(session.lifecycle().await, Lifecycle::New);
    }

    #[tokio::test(start_paused = true)]
    async fn navigation_to_remote_draft_binds_and_loads() {
        let h = Harness::new(9_000);
        let mut seed = h.owned("remote copy", "alice");
        seed.saved_at = 8_000;
        let id = h.catalog.insert_draft(seed);

        let session = h
            .session(h.context(Some("alice")).with_navigation_draft(id.clone()))
            .await;
        assert_eq!(session.document().await.name, "remote copy");
        assert_eq!(session.lifecycle().await, Lifecycle::Bound);
        assert_eq!(session.active_draft_id().await, Some(id));
        assert_eq!(session.save_status().await, SaveStatus::Saved);
        assert!(!session.has_unsaved_remote_changes().await);
    }

    #[tokio::test(start_paused = true)]
    async fn diverged_copies_prompt_and_block_until_resolved() {
        let h = Harness::new(100);
        h.local_store().save(&h.owned("local side", "alice"));

        let mut seed = h.owned("remote side", "alice");
        seed.saved_at = 200;
        let id = h.catalog.insert_draft(seed);

        h.clock.set(10_000);
        let session = h
            .session(h.context(Some("alice")).with_navigation_draft(id.clone()))
            .await;

        let conflict = session.conflict().await.unwrap();
        assert_eq!(conflict.local.saved_at, 100);
        assert_eq!(conflict.remote.saved_at, 200);

        // Edits are rejected while the conflict is pending.
        let event = session.edit(h.named("nope")).await;
        assert_eq!(event.outcome, SaveOutcome::Skipped);

        let chosen = session
            .resolve_conflict(ConflictChoice::Local)
            .await
            .unwrap();
        assert_eq!(chosen.name, "local side");
        assert!(session.has_unsaved_remote_changes().await);

        // Picking local forces the next flush to write remotely.
        session.flush_now().await;
        assert_eq!(h.catalog.draft(&id).unwrap().name, "local side");
    }

    #[tokio::test(start_paused = true)]
    async fn picking_remote_needs_no_forced_write() {
        let h = Harness::new(100);
        h.local_store().save(&h.owned("local side", "alice"));

        let mut seed = h.owned("remote side", "alice");
        seed.saved_at = 200;
        let id = h.catalog.insert_draft(seed);

        let session = h
            .session(h.context(Some("alice")).with_navigation_draft(id))
            .await;
        session.resolve_conflict(ConflictChoice::Remote).await;

        assert_eq!(session.save_status().await, SaveStatus::Saved);
        assert!(!session.has_unsaved_remote_changes().await);

        let event = session.flush_now().await;
        assert_eq!(event.outcome, SaveOutcome::Skipped);
        assert_eq!(h.catalog.update_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_remote_degrades_to_local_at_load() {
        let h = Harness::new(100);
        h.local_store().save(&h.owned("local copy", "alice"));
        let id = h.catalog.insert_draft(h.owned("remote copy", "alice"));
        h.catalog.set_offline(true);

        let session = h
            .session(h.context(Some("alice")).with_navigation_draft(id))
            .await;
        assert_eq!(session.document().await.name, "local copy");
        assert_eq!(session.conflict().await, None);
        assert_eq!(session.save_status().await, SaveStatus::Error);
        assert_eq!(session.lifecycle().await, Lifecycle::New);
    }

    #[tokio::test(start_paused = true)]
    async fn dead_navigation_reference_starts_from_local() {
        let h = Harness::new(100);
        let session = h
            .session(
                h.context(Some("alice"))
                    .with_navigation_draft(DraftId::from("gone")),
            )
            .await;
        assert!(session.document().await.is_empty());
        assert_eq!(session.lifecycle().await, Lifecycle::New);
        assert_eq!(session.active_draft_id().await, None);
    }
}
