//! Mock identity provider.

use session_client::errors::RegistryError;
use session_client::identity::{IdentityProvider, UserProfile};
use std::sync::Mutex;

use crate::fixtures;

/// Identity provider with a configurable lookup outcome.
#[derive(Debug)]
pub struct MockIdentity {
    response: Mutex<Result<UserProfile, RegistryError>>,
}

impl MockIdentity {
    /// Identity lookup resolving to the given profile.
    #[must_use]
    pub fn resolving(profile: UserProfile) -> Self {
        Self {
            response: Mutex::new(Ok(profile)),
        }
    }

    /// Identity lookup failing with the given error.
    #[must_use]
    pub fn failing(error: RegistryError) -> Self {
        Self {
            response: Mutex::new(Err(error)),
        }
    }
}

impl Default for MockIdentity {
    /// Identity lookup resolving to a default dev user.
    fn default() -> Self {
        Self::resolving(fixtures::user_profile("user_local"))
    }
}

impl IdentityProvider for MockIdentity {
    async fn current_user(&self) -> Result<UserProfile, RegistryError> {
        self.response.lock().expect("mock poisoned").clone()
    }
}
