//! Session client error types.
//!
//! All remote-call failures are caught at the controller boundary and
//! converted into one of these kinds; none propagate further. The only
//! user-visible effect is the error state's message and available actions.

use thiserror::Error;

/// Failure reported by the session registry adapter.
#[derive(Debug, Error, Clone)]
pub enum RegistryError {
    /// The service handled the request and rejected it. Carries the
    /// service-provided message verbatim.
    #[error("{0}")]
    Rejected(String),

    /// The request never produced a usable response (connect failure,
    /// timeout, non-success status without a service message).
    #[error("HTTP error: {0}")]
    Http(String),

    /// A response arrived but could not be decoded.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Adapter configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Join-rejection classes. The caller-visible remediation differs per class:
/// expired/ended leave nothing to retry, unauthorized means contacting the
/// inviter, anything else gets a generic retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinRejection {
    /// The session's expiry has passed (the registry's "not found or
    /// expired" rejection classifies here).
    Expired,
    /// The session was terminated by its creator.
    Ended,
    /// The joining user was not invited to the session.
    Unauthorized,
    /// Any other rejection; carries the original message.
    Other(String),
}

impl JoinRejection {
    /// Classify a registry failure by inspecting its message.
    ///
    /// The exact substrings are a registry-service contract detail; unknown
    /// messages fall through to [`JoinRejection::Other`].
    #[must_use]
    pub fn classify(error: &RegistryError) -> Self {
        let message = match error {
            RegistryError::Rejected(message) => message.clone(),
            other => other.to_string(),
        };

        if message.contains("expired") {
            JoinRejection::Expired
        } else if message.contains("ended") {
            JoinRejection::Ended
        } else if message.contains("not authorized") {
            JoinRejection::Unauthorized
        } else {
            JoinRejection::Other(message)
        }
    }

    /// User-facing message for this rejection class.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            JoinRejection::Expired => "This session has expired".to_string(),
            JoinRejection::Ended => "This session has ended".to_string(),
            JoinRejection::Unauthorized => "You are not invited to this session".to_string(),
            JoinRejection::Other(message) => message.clone(),
        }
    }

    /// Label for logging and metrics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            JoinRejection::Expired => "expired",
            JoinRejection::Ended => "ended",
            JoinRejection::Unauthorized => "unauthorized",
            JoinRejection::Other(_) => "other",
        }
    }
}

/// Failure reported by the media transport layer.
#[derive(Debug, Error, Clone)]
pub enum TransportError {
    /// Establishing the media session failed.
    #[error("Failed to join media session: {0}")]
    Connect(String),

    /// A local media device could not be used.
    #[error("Media device error: {0}")]
    Device(String),
}

impl TransportError {
    /// User-facing message, with remediation-specific phrasing for
    /// secure-context and camera-permission failures.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            TransportError::Connect(message) => {
                if message.contains("HTTPS") || message.contains("secure") {
                    "Video sessions require a secure connection (HTTPS)".to_string()
                } else if message.contains("permission") {
                    "Camera permission denied. Please enable camera access.".to_string()
                } else {
                    message.clone()
                }
            }
            TransportError::Device(message) => message.clone(),
        }
    }
}

/// Controller-boundary error type, returned by handle operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The identity/session lookup needed before any action failed.
    #[error("Session initialization failed: {0}")]
    Initialization(String),

    /// Registry call failed.
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Transport layer failed.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Internal error (controller mailbox gone).
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_expired() {
        let rejection =
            JoinRejection::classify(&RegistryError::Rejected("This session has expired".into()));
        assert_eq!(rejection, JoinRejection::Expired);
    }

    #[test]
    fn test_classify_not_found_or_expired_as_expired() {
        let rejection = JoinRejection::classify(&RegistryError::Rejected(
            "session not found or expired".into(),
        ));
        assert_eq!(rejection, JoinRejection::Expired);
        assert_eq!(rejection.user_message(), "This session has expired");
    }

    #[test]
    fn test_classify_ended() {
        let rejection =
            JoinRejection::classify(&RegistryError::Rejected("session has ended".into()));
        assert_eq!(rejection, JoinRejection::Ended);
        assert_eq!(rejection.user_message(), "This session has ended");
    }

    #[test]
    fn test_classify_unauthorized() {
        let rejection = JoinRejection::classify(&RegistryError::Rejected(
            "user is not authorized to join this session".into(),
        ));
        assert_eq!(rejection, JoinRejection::Unauthorized);
        assert_eq!(
            rejection.user_message(),
            "You are not invited to this session"
        );
    }

    #[test]
    fn test_classify_unknown_message_passes_through() {
        let rejection =
            JoinRejection::classify(&RegistryError::Rejected("quota exceeded".into()));
        assert_eq!(rejection, JoinRejection::Other("quota exceeded".into()));
        assert_eq!(rejection.user_message(), "quota exceeded");
    }

    #[test]
    fn test_classify_http_failure_as_other() {
        let rejection = JoinRejection::classify(&RegistryError::Http("connect refused".into()));
        assert!(matches!(rejection, JoinRejection::Other(_)));
    }

    #[test]
    fn test_transport_user_messages() {
        let secure = TransportError::Connect("Video requires HTTPS or localhost".into());
        assert_eq!(
            secure.user_message(),
            "Video sessions require a secure connection (HTTPS)"
        );

        let permission = TransportError::Connect("camera permission denied by user".into());
        assert_eq!(
            permission.user_message(),
            "Camera permission denied. Please enable camera access."
        );

        let other = TransportError::Connect("ice negotiation failed".into());
        assert_eq!(other.user_message(), "ice negotiation failed");
    }

    #[test]
    fn test_rejected_display_is_message_verbatim() {
        let error = RegistryError::Rejected("quota exceeded".into());
        assert_eq!(error.to_string(), "quota exceeded");
    }
}
