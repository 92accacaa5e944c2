//! Debounced persistence scheduling.
//!
//! Version-token debounce: every edit bumps an atomic save version, and a
//! timer only fires its remote write if no newer version appeared while it
//! slept. Under continuous editing only the latest token survives, so at
//! most one scheduler-triggered remote write carries each quiet period's
//! final document state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Idle delay before a remote write - save after 2 seconds of no typing.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_secs(2);

/// Debounce gate over an atomic save version.
///
/// The gate never cancels in-flight network calls; superseding only
/// invalidates timers that have not fired yet. Stale responses are handled
/// downstream by the monotonic `saved_at` rule.
#[derive(Debug)]
pub struct DebounceScheduler {
    version: AtomicU64,
    quiet_period: Duration,
}

impl DebounceScheduler {
    /// Create a scheduler with the given quiet period.
    #[must_use]
    pub const fn new(quiet_period: Duration) -> Self {
        Self {
            version: AtomicU64::new(0),
            quiet_period,
        }
    }

    /// Quiet period between the last edit and the remote write.
    #[must_use]
    pub const fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Record an edit; returns the token a timer must hold to fire.
    pub fn begin_edit(&self) -> u64 {
        self.version.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Invalidate any pending timer without scheduling a new write.
    ///
    /// Used by flush (the write happens immediately instead) and by discard.
    pub fn supersede(&self) -> u64 {
        self.begin_edit()
    }

    /// Latest issued token.
    pub fn current(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Whether `token` is still the latest.
    pub fn is_current(&self, token: u64) -> bool {
        self.current() == token
    }

    /// Sleep out the quiet period, then report whether `token` survived.
    ///
    /// `false` means a newer edit (or a flush/cancel) superseded this timer
    /// and no write must be issued for it.
    pub async fn wait_for_quiet(&self, token: u64) -> bool {
        tokio::time::sleep(self.quiet_period).await;
        self.is_current(token)
    }
}
