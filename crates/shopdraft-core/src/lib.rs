//! shopdraft-core - Core library for Shopdraft
//!
//! This crate contains the draft synchronization engine used by the product
//! authoring flow: a mutable product draft kept as a client-local snapshot
//! and a remote draft record, with debounced autosave, load-time
//! reconciliation, and a lifecycle controller driving create -> autosave ->
//! publish-or-discard.

pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod reconcile;
pub mod remote;
pub mod scheduler;
pub mod session;
pub mod snapshot;
pub mod util;

pub use error::{PublishError, RemoteError, StorageError};
pub use models::{DraftId, ProductDraft, SaveStatus};
pub use reconcile::LoadOutcome;
pub use session::{ConflictChoice, DraftSession, Lifecycle, SessionContext};
