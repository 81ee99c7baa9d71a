//! Controller metrics.
//!
//! Atomic counters for one controller instance, snapshotted for shutdown
//! reporting and test assertions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for one controller instance.
#[derive(Debug, Default)]
pub struct ControllerMetrics {
    sessions_created: AtomicU64,
    sessions_joined: AtomicU64,
    join_rejections: AtomicU64,
    errors: AtomicU64,
    calls_completed: AtomicU64,
    transport_faults: AtomicU64,
    stale_completions: AtomicU64,
    commands_ignored: AtomicU64,
}

impl ControllerMetrics {
    /// Create shared metrics.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A session was created and entered `ringing`.
    pub fn record_session_created(&self) {
        self.sessions_created.fetch_add(1, Ordering::Relaxed);
    }

    /// A session was joined and the transport connect began.
    pub fn record_session_joined(&self) {
        self.sessions_joined.fetch_add(1, Ordering::Relaxed);
    }

    /// A join attempt was rejected by the registry.
    pub fn record_join_rejection(&self) {
        self.join_rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// The controller entered the error state.
    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// An attempt reached `ended`.
    pub fn record_call_completed(&self) {
        self.calls_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// The transport reported a fault (including recoverable camera faults).
    pub fn record_transport_fault(&self) {
        self.transport_faults.fetch_add(1, Ordering::Relaxed);
    }

    /// A completion or linger arrived for a superseded generation.
    pub fn record_stale_completion(&self) {
        self.stale_completions.fetch_add(1, Ordering::Relaxed);
    }

    /// A command was ignored because the state did not allow it.
    pub fn record_command_ignored(&self) {
        self.commands_ignored.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time view of all counters.
    #[must_use]
    pub fn snapshot(&self) -> ControllerMetricsSnapshot {
        ControllerMetricsSnapshot {
            sessions_created: self.sessions_created.load(Ordering::Relaxed),
            sessions_joined: self.sessions_joined.load(Ordering::Relaxed),
            join_rejections: self.join_rejections.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            calls_completed: self.calls_completed.load(Ordering::Relaxed),
            transport_faults: self.transport_faults.load(Ordering::Relaxed),
            stale_completions: self.stale_completions.load(Ordering::Relaxed),
            commands_ignored: self.commands_ignored.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of the controller counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerMetricsSnapshot {
    /// Sessions created (entered `ringing`).
    pub sessions_created: u64,
    /// Sessions joined (transport connect began).
    pub sessions_joined: u64,
    /// Join attempts rejected by the registry.
    pub join_rejections: u64,
    /// Error-state entries.
    pub errors: u64,
    /// Attempts that reached `ended`.
    pub calls_completed: u64,
    /// Transport faults, including recoverable camera faults.
    pub transport_faults: u64,
    /// Stale completions dropped by the generation guard.
    pub stale_completions: u64,
    /// Commands ignored because the state did not allow them.
    pub commands_ignored: u64,
}
