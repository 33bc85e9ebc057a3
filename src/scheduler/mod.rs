//! Pass scheduling: startup, late re-check, and debounced change batching.
//!
//! [`SyncScheduler`] owns every piece of timing state the synchronizer
//! needs, with an explicit start/stop lifecycle. It is driven by caller
//! timestamps (milliseconds from any fixed origin) rather than wall-clock
//! reads, so scheduling behavior is deterministic under test.
//!
//! Debounce semantics are trailing-edge: a burst of notifications inside
//! the quiescence window yields exactly one pass, fired only after the
//! window elapses with no further notification. There is no leading-edge
//! fire and no periodic guarantee during a continuous burst.

/// Why a synchronization pass is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassReason {
    /// First pass after the scheduler started.
    Startup,
    /// Fixed-delay pass catching editors mounted after startup.
    Recheck,
    /// Debounced change-notification pass.
    Change,
}

/// Scheduler for synchronization passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncScheduler {
    debounce_ms: u64,
    recheck_delay_ms: u64,
    running: bool,
    startup_pending: bool,
    recheck_at: Option<u64>,
    change_pending_since: Option<u64>,
}

impl SyncScheduler {
    /// Default quiescence window for change notifications.
    pub const DEFAULT_DEBOUNCE_MS: u64 = 50;
    /// Default delay before the late re-check pass.
    pub const DEFAULT_RECHECK_MS: u64 = 500;

    /// Create a stopped scheduler with the given windows.
    pub const fn new(debounce_ms: u64, recheck_delay_ms: u64) -> Self {
        Self {
            debounce_ms,
            recheck_delay_ms,
            running: false,
            startup_pending: false,
            recheck_at: None,
            change_pending_since: None,
        }
    }

    /// Start scheduling: queues the startup pass immediately and the late
    /// re-check pass at `now_ms + recheck_delay_ms`.
    pub const fn start(&mut self, now_ms: u64) {
        self.running = true;
        self.startup_pending = true;
        self.recheck_at = Some(now_ms.saturating_add(self.recheck_delay_ms));
        self.change_pending_since = None;
    }

    /// Stop scheduling and drop all pending work.
    ///
    /// Notifications received while stopped are ignored.
    pub const fn stop(&mut self) {
        self.running = false;
        self.startup_pending = false;
        self.recheck_at = None;
        self.change_pending_since = None;
    }

    /// Returns true if the scheduler has been started and not stopped.
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Record a change notification, restarting the debounce window.
    pub const fn notify(&mut self, now_ms: u64) {
        if !self.running {
            return;
        }
        self.change_pending_since = Some(now_ms);
    }

    /// Returns true if any pass is queued or a debounce window is open.
    pub const fn is_pending(&self) -> bool {
        self.startup_pending || self.recheck_at.is_some() || self.change_pending_since.is_some()
    }

    /// Take the next due pass, if any.
    ///
    /// Startup fires first, then an elapsed debounce window, then the late
    /// re-check. Call repeatedly; each due pass is returned once.
    pub fn take_ready(&mut self, now_ms: u64) -> Option<PassReason> {
        if !self.running {
            return None;
        }
        if self.startup_pending {
            self.startup_pending = false;
            return Some(PassReason::Startup);
        }
        if let Some(since) = self.change_pending_since
            && now_ms.saturating_sub(since) >= self.debounce_ms
        {
            self.change_pending_since = None;
            return Some(PassReason::Change);
        }
        if let Some(at) = self.recheck_at
            && now_ms >= at
        {
            self.recheck_at = None;
            return Some(PassReason::Recheck);
        }
        None
    }
}

impl Default for SyncScheduler {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DEBOUNCE_MS, Self::DEFAULT_RECHECK_MS)
    }
}
