//! Message types for the session controller mailbox.
//!
//! User intent arrives as [`Command`] values through the handle; spawned
//! registry requests and linger timers resume the controller with
//! [`Internal`] values on the same mailbox, preserving the single-threaded
//! run-to-completion model.

use crate::errors::RegistryError;
use crate::registry::{CreatedSession, JoinedSession};
use common::types::UserId;

/// Messages accepted by the controller mailbox.
#[derive(Debug)]
pub(crate) enum ControllerMessage {
    /// User intent, sent through the handle.
    Command(Command),
    /// Completion of work the controller started.
    Internal(Internal),
}

/// User-intent commands.
#[derive(Debug)]
pub(crate) enum Command {
    /// Start a new session from `idle`.
    StartSession {
        /// User to invite.
        invited_user: UserId,
    },
    /// Cancel a `ringing` session (creator only by construction).
    CancelSession,
    /// End the active call.
    EndCall,
    /// Out-of-band notification that the counterpart joined a `ringing`
    /// session.
    CounterpartJoined,
    /// Re-attempt the join that previously failed.
    RetryJoin,
    /// Toggle the local camera feed.
    SetCameraEnabled {
        /// Desired camera state.
        enabled: bool,
    },
}

/// Completions and timers resumed onto the controller.
///
/// Every variant carries the generation it was issued under; mismatches are
/// dropped as stale.
#[derive(Debug)]
pub(crate) enum Internal {
    /// An outstanding registry request completed.
    Completion {
        generation: u64,
        outcome: Outcome,
    },
    /// A scheduled linger elapsed.
    LingerElapsed {
        generation: u64,
        outcome: LingerOutcome,
    },
}

/// Result of an outstanding registry request.
#[derive(Debug)]
pub(crate) enum Outcome {
    /// `createVideoSession` completed.
    Created(Result<CreatedSession, RegistryError>),
    /// `joinVideoSession` completed.
    Joined(Result<JoinedSession, RegistryError>),
}

/// Terminal transition deferred behind a linger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LingerOutcome {
    /// The counterpart left the transport session.
    RemoteLeft,
    /// The transport reported the session itself is gone.
    SessionGone,
}

impl LingerOutcome {
    /// Label for logging.
    pub(crate) const fn label(self) -> &'static str {
        match self {
            LingerOutcome::RemoteLeft => "remote_left",
            LingerOutcome::SessionGone => "session_gone",
        }
    }
}
