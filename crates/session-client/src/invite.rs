//! Invite link helpers for the ringing state.

use chrono::{DateTime, Utc};
use common::types::SessionId;

/// Build the shareable invite URL for a session.
#[must_use]
pub fn invite_url(app_origin: &str, session_id: &SessionId) -> String {
    format!(
        "{}/session/{}",
        app_origin.trim_end_matches('/'),
        session_id
    )
}

/// Parse a session reference: either a raw session identifier or a full
/// invite URL, whose last path segment is the identifier.
#[must_use]
pub fn parse_session_ref(raw: &str) -> Option<SessionId> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }

    let id = trimmed.rsplit('/').next().unwrap_or(trimmed);
    if id.is_empty() {
        return None;
    }

    Some(SessionId::from(id))
}

/// Format the time remaining until expiry as `M:SS`, or `"Expired"` once the
/// expiry has passed.
#[must_use]
pub fn format_remaining(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let remaining = expires_at - now;
    let total_seconds = remaining.num_seconds();
    if total_seconds <= 0 {
        return "Expired".to_string();
    }

    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}
