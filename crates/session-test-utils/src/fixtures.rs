//! Fixture builders for registry payloads.

use chrono::{Duration, Utc};
use common::types::Session;
use session_client::identity::UserProfile;
use session_client::registry::{CreatedSession, JoinedSession};

/// A create response expiring the given number of minutes from now.
#[must_use]
pub fn created_session(session_id: &str, minutes: i64, token: &str) -> CreatedSession {
    CreatedSession {
        session_id: session_id.into(),
        expires_at: Utc::now() + Duration::minutes(minutes),
        creator_token: token.into(),
    }
}

/// A join response for a session expiring the given number of minutes from
/// now.
#[must_use]
pub fn joined_session(session_id: &str, minutes: i64, token: &str) -> JoinedSession {
    JoinedSession {
        session: Session {
            id: session_id.into(),
            expires_at: Utc::now() + Duration::minutes(minutes),
        },
        participant_token: token.into(),
    }
}

/// A minimal user profile.
#[must_use]
pub fn user_profile(user_id: &str) -> UserProfile {
    UserProfile {
        id: user_id.into(),
        display_name: None,
        email: None,
    }
}
