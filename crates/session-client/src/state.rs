//! User-visible call state.
//!
//! [`CallState`] is the secret-free snapshot published on the controller's
//! watch channel. Each variant carries only the data valid in that state;
//! access tokens are held internally by the controller and never appear
//! here.

use crate::errors::JoinRejection;
use chrono::{DateTime, Utc};
use common::types::SessionId;

/// Snapshot of the controller's current phase.
#[derive(Debug, Clone, PartialEq)]
pub enum CallState {
    /// No session identifier present and no create action issued yet.
    Idle,

    /// A create-session request is in flight.
    Creating,

    /// A join-session request is in flight.
    Joining,

    /// The creator is waiting for the counterpart; no transport connection
    /// exists yet.
    Ringing {
        /// Registry-assigned session identifier.
        session_id: SessionId,
        /// Instant after which the invite can no longer be accepted.
        expires_at: DateTime<Utc>,
    },

    /// The transport session is active.
    InCall {
        /// Registry-assigned session identifier.
        session_id: SessionId,
        /// Whether the local participant created the session.
        is_creator: bool,
        /// Whether the local camera feed is enabled.
        camera_enabled: bool,
        /// Recoverable local media-device fault, shown as a banner while the
        /// call continues.
        camera_fault: Option<String>,
        /// Session-gone fault message, shown during the linger before the
        /// call ends.
        room_fault: Option<String>,
    },

    /// Terminal: the session has been closed.
    Ended,

    /// Terminal for this attempt.
    Error {
        /// Failure class, selecting the available remediation.
        kind: ErrorKind,
        /// User-facing message.
        message: String,
        /// Whether a retry is offered (only when a session identifier was
        /// present, i.e. this was a join attempt).
        can_retry: bool,
    },
}

impl CallState {
    /// Short label for logging and metrics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            CallState::Idle => "idle",
            CallState::Creating => "creating",
            CallState::Joining => "joining",
            CallState::Ringing { .. } => "ringing",
            CallState::InCall { .. } => "in_call",
            CallState::Ended => "ended",
            CallState::Error { .. } => "error",
        }
    }

    /// Whether this state is terminal for the current attempt.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, CallState::Ended | CallState::Error { .. })
    }
}

/// Failure class carried by [`CallState::Error`].
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    /// The identity/session lookup before any action failed.
    Initialization,
    /// The registry rejected session creation.
    Creation,
    /// The registry rejected a join, subclassified by message content.
    Join(JoinRejection),
    /// The transport SDK reported a fatal runtime fault.
    Transport,
}

impl ErrorKind {
    /// Short label for logging and metrics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            ErrorKind::Initialization => "initialization",
            ErrorKind::Creation => "creation",
            ErrorKind::Join(_) => "join",
            ErrorKind::Transport => "transport",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(CallState::Idle.label(), "idle");
        assert_eq!(
            CallState::Error {
                kind: ErrorKind::Join(JoinRejection::Expired),
                message: "This session has expired".into(),
                can_retry: true,
            }
            .label(),
            "error"
        );
        assert_eq!(ErrorKind::Join(JoinRejection::Expired).label(), "join");
    }

    #[test]
    fn test_terminal_states() {
        assert!(CallState::Ended.is_terminal());
        assert!(CallState::Error {
            kind: ErrorKind::Creation,
            message: "quota exceeded".into(),
            can_retry: false,
        }
        .is_terminal());
        assert!(!CallState::Creating.is_terminal());
    }
}
