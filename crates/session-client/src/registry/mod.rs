//! Session registry capability.
//!
//! The registry service owns session records, join authorization, and token
//! minting. The controller consumes it through the narrow [`SessionRegistry`]
//! trait so neither the state machine nor its tests depend on a particular
//! backend.

pub mod http;

pub use http::HttpBackend;

use crate::errors::RegistryError;
use chrono::{DateTime, Utc};
use common::types::{
    AccessToken, IdentityRequirement, Session, SessionId, TrustRequirement, UserId,
};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Parameters for creating a session.
#[derive(Debug, Clone, Serialize)]
pub struct CreateSessionRequest {
    /// User invited to the session.
    pub invited_user_id: UserId,
    /// Identity disclosure tier required of participants.
    pub identity_requirement: IdentityRequirement,
    /// Trust level required of participants.
    pub trust_requirement: TrustRequirement,
    /// Requested session lifetime.
    pub session_duration_minutes: u32,
}

/// Registry response to a successful create.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedSession {
    /// Identifier of the new session.
    pub session_id: SessionId,
    /// Instant after which the session can no longer be joined.
    pub expires_at: DateTime<Utc>,
    /// Creator-scoped access token for the transport layer.
    pub creator_token: AccessToken,
}

/// Registry response to a successful join.
#[derive(Debug, Clone, Deserialize)]
pub struct JoinedSession {
    /// The joined session record.
    pub session: Session,
    /// Joinee-scoped access token for the transport layer.
    pub participant_token: AccessToken,
}

/// Capability for the remote session registry.
///
/// `end_session` is creator-only: the registry enforces it server-side and
/// the controller never issues it for a non-creator participant.
pub trait SessionRegistry: Send + Sync + 'static {
    /// Create a session and mint the creator token.
    fn create_session(
        &self,
        request: CreateSessionRequest,
    ) -> impl Future<Output = Result<CreatedSession, RegistryError>> + Send;

    /// Join an existing session and mint the participant token.
    fn join_session(
        &self,
        session_id: SessionId,
    ) -> impl Future<Output = Result<JoinedSession, RegistryError>> + Send;

    /// Terminate a session (creator-only).
    fn end_session(
        &self,
        session_id: SessionId,
    ) -> impl Future<Output = Result<(), RegistryError>> + Send;
}
