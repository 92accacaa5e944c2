//! Error types for shopdraft-core.
//!
//! Each persistence boundary gets its own error enum so callers can react per
//! the failure taxonomy: local storage failures are absorbed at the snapshot
//! store, remote failures propagate as typed results up to the session.

use thiserror::Error;

/// Result type alias for local snapshot storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Errors from the client-local key-value backing store.
///
/// These never reach the editing surface; the snapshot store logs them and
/// treats the affected snapshot as absent.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend read/write failure (quota, locked file, poisoned lock)
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Local database error
    #[error("Local database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Snapshot payload could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for remote draft store operations.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Errors from the remote draft resource.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Network or server failure; editing continues against the local snapshot
    #[error("Draft service unavailable: {0}")]
    Unavailable(String),

    /// The referenced draft id no longer exists (published or deleted elsewhere)
    #[error("Draft record not found")]
    NotFound,
}

/// Result type alias for publish operations.
pub type PublishResult<T> = std::result::Result<T, PublishError>;

/// Errors from the publish resource. Blocking for the publish action only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// Network or server failure; the draft remains bound and intact
    #[error("Publish service unavailable: {0}")]
    Unavailable(String),

    /// The draft was already published or discarded; never duplicates a record
    #[error("Draft is no longer available to publish")]
    DraftMissing,

    /// The catalog rejected the final fields
    #[error("Publish rejected: {0}")]
    Rejected(String),
}
