//! Identity lookup capability.
//!
//! The controller issues exactly one identity lookup at startup, before any
//! lifecycle action. Authentication itself is owned by the backend service;
//! only the lookup call is modeled here.

use crate::errors::RegistryError;
use common::types::UserId;
use serde::Deserialize;
use std::future::Future;

/// Profile of the locally signed-in user.
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    /// Backend-assigned user identifier.
    pub id: UserId,
    /// Preferred display name, if set.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Account email, if visible.
    #[serde(default)]
    pub email: Option<String>,
}

/// Capability for resolving the current user.
pub trait IdentityProvider: Send + Sync + 'static {
    /// Look up the locally signed-in user.
    fn current_user(&self) -> impl Future<Output = Result<UserProfile, RegistryError>> + Send;
}
