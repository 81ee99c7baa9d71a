//! Common data types for Perihelion session components.
//!
//! Identifiers are opaque strings minted by the session registry service;
//! the client never parses or synthesizes them.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for a video session, as minted by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// View the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for SessionId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

/// Opaque identifier for a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// View the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for UserId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for UserId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

/// A registry-tracked session record: one potential or active 1:1 call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Session {
    /// Registry-assigned session identifier.
    pub id: SessionId,
    /// Instant after which the session can no longer be joined.
    pub expires_at: DateTime<Utc>,
}

/// Participant-and-session-scoped credential required to join the transport
/// layer. Opaque to the client; redacted in `Debug` output.
#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(SecretString);

impl AccessToken {
    /// Expose the raw token for handing to the transport SDK.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

impl From<String> for AccessToken {
    fn from(raw: String) -> Self {
        Self(SecretString::from(raw))
    }
}

impl From<&str> for AccessToken {
    fn from(raw: &str) -> Self {
        Self(SecretString::from(raw.to_string()))
    }
}

/// Identity disclosure tier required of session participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdentityRequirement {
    /// No identity disclosure required.
    #[default]
    Anonymous,
    /// Participants must be identity-verified.
    Verified,
    /// Verified trust level with anonymous display.
    VerifiedAnonymous,
}

impl IdentityRequirement {
    /// Wire/label form of the tier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            IdentityRequirement::Anonymous => "anonymous",
            IdentityRequirement::Verified => "verified",
            IdentityRequirement::VerifiedAnonymous => "verified-anonymous",
        }
    }
}

/// Trust level required of session participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustRequirement {
    /// Below-standard trust signals accepted.
    Low,
    /// Default trust level.
    #[default]
    Standard,
    /// Elevated trust signals required.
    High,
}

impl TrustRequirement {
    /// Wire/label form of the level.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            TrustRequirement::Low => "low",
            TrustRequirement::Standard => "standard",
            TrustRequirement::High => "high",
        }
    }
}
