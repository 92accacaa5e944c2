//! Load-time reconciliation of local and remote snapshots.
//!
//! Decides which copy of the draft the user should see. Pure decision logic:
//! both snapshots are supplied by the caller, and no store is touched here.

use crate::models::ProductDraft;

/// Which document to load, decided once per editor load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No usable snapshot on either side; start from the empty factory.
    Fresh(ProductDraft),
    /// Only the local snapshot is usable; it has not reached the remote yet.
    Local(ProductDraft),
    /// The remote record is canonical.
    Remote(ProductDraft),
    /// Both sides diverged; the user must pick one, no automatic merge.
    Conflict {
        local: ProductDraft,
        remote: ProductDraft,
    },
}

/// Compare the snapshots and decide what to load.
///
/// A snapshot owned by a different principal is discarded before comparison,
/// as if it did not exist - one user's in-progress edits must not leak into
/// another user's session on a shared device. Equal `saved_at` loads the
/// remote copy; differing `saved_at` is a conflict surfacing both documents.
pub fn reconcile(
    local: Option<ProductDraft>,
    remote: Option<ProductDraft>,
    current_owner: Option<&str>,
) -> LoadOutcome {
    let local = local.and_then(|draft| retain_owned(draft, current_owner, "local"));
    let remote = remote.and_then(|draft| retain_owned(draft, current_owner, "remote"));

    match (local, remote) {
        (None, None) => LoadOutcome::Fresh(fresh_document(current_owner)),
        (Some(local), None) => LoadOutcome::Local(local),
        (None, Some(remote)) => LoadOutcome::Remote(remote),
        (Some(local), Some(remote)) => {
            if local.saved_at == remote.saved_at {
                LoadOutcome::Remote(remote)
            } else {
                tracing::debug!(
                    local_saved_at = local.saved_at,
                    remote_saved_at = remote.saved_at,
                    "Draft snapshots diverged; prompting for a choice"
                );
                LoadOutcome::Conflict { local, remote }
            }
        }
    }
}

/// Build the empty document handed out by every "no usable snapshot" branch.
pub fn fresh_document(current_owner: Option<&str>) -> ProductDraft {
    let mut draft = ProductDraft::empty();
    draft.owner_id = current_owner.map(str::to_string);
    draft
}

fn retain_owned(
    draft: ProductDraft,
    current_owner: Option<&str>,
    side: &'static str,
) -> Option<ProductDraft> {
    match draft.owner_id.as_deref() {
        None => Some(draft),
        Some(owner) if Some(owner) == current_owner => Some(draft),
        Some(_) => {
            // Silent by design: mismatched snapshots read as absent.
            tracing::debug!(side, "Dropping draft snapshot owned by another user");
            None
        }
    }
}
