//! Save status and save event types

/// Which store a persistence attempt targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTarget {
    Local,
    Remote,
}

/// Unified save-status signal exposed to the editing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Idle,
    Saving,
    Saved,
    Error,
}

/// Outcome of one persistence attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The store accepted the write and stamped this timestamp
    Saved { saved_at: i64 },
    /// The write failed; the in-memory document is unchanged
    Failed { message: String },
    /// Nothing to do (superseded, terminal state, or no pending changes)
    Skipped,
}

/// Ephemeral description of one persistence attempt. Drives UI status and
/// retry decisions; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveEvent {
    pub target: SaveTarget,
    pub outcome: SaveOutcome,
}

impl SaveEvent {
    /// Convenience check for a successful outcome.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        matches!(self.outcome, SaveOutcome::Saved { .. })
    }
}
