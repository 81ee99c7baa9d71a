//! Navigation context capability.
//!
//! The controller reads an optional session identifier from the navigation
//! location at startup (the user followed an invite link) and writes a newly
//! created identifier back (replace, not push) so refreshes land on the same
//! session.

use common::types::SessionId;
use std::sync::{Mutex, PoisonError};

/// Capability for the host application's navigation location.
pub trait NavigationContext: Send + Sync + 'static {
    /// Session identifier present in the location at startup, if any.
    fn session_hint(&self) -> Option<SessionId>;

    /// Record a newly created session identifier. Replace semantics;
    /// idempotent if the identifier is already recorded.
    fn record_session(&self, session_id: &SessionId);
}

/// In-memory navigation location for the headless binary and tests.
#[derive(Debug, Default)]
pub struct InMemoryNavigation {
    location: Mutex<Option<SessionId>>,
}

impl InMemoryNavigation {
    /// Create a location with no session identifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a location that already carries a session identifier, as when
    /// following an invite link.
    #[must_use]
    pub fn with_session(session_id: SessionId) -> Self {
        Self {
            location: Mutex::new(Some(session_id)),
        }
    }

    /// Current recorded session identifier.
    #[must_use]
    pub fn current(&self) -> Option<SessionId> {
        self.location
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl NavigationContext for InMemoryNavigation {
    fn session_hint(&self) -> Option<SessionId> {
        self.current()
    }

    fn record_session(&self, session_id: &SessionId) {
        let mut location = self
            .location
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *location = Some(session_id.clone());
    }
}
