//! Session client configuration.
//!
//! Configuration is loaded from environment variables. Sensitive fields are
//! redacted in Debug output.

use common::secret::SecretString;
use common::types::{IdentityRequirement, TrustRequirement};
use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;

/// Default application origin used when building invite links.
pub const DEFAULT_APP_ORIGIN: &str = "https://perihelion.app";

/// Default registry request timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 10;

/// Default requested session lifetime in minutes.
pub const DEFAULT_SESSION_DURATION_MINUTES: u32 = 60;

/// Default client instance ID prefix.
pub const DEFAULT_CLIENT_ID_PREFIX: &str = "session";

/// Session client configuration.
///
/// Loaded from environment variables with sensible defaults.
/// Sensitive fields are redacted in Debug output.
#[derive(Clone)]
pub struct Config {
    /// Base URL of the registry backend (e.g. `https://api.perihelion.app`).
    pub registry_base_url: String,

    /// Application origin for invite links (default: `https://perihelion.app`).
    pub app_origin: String,

    /// Bearer token for registry requests, if the deployment requires one.
    /// Protected by `SecretString` to prevent accidental logging.
    pub registry_bearer_token: Option<SecretString>,

    /// Registry request timeout in seconds (default: 10).
    pub http_timeout_seconds: u64,

    /// Requested session lifetime in minutes (default: 60).
    pub session_duration_minutes: u32,

    /// Identity disclosure tier requested for created sessions
    /// (default: anonymous).
    pub identity_requirement: IdentityRequirement,

    /// Trust level requested for created sessions (default: standard).
    pub trust_requirement: TrustRequirement,

    /// Unique identifier for this client instance, used in logs.
    pub client_id: String,
}

/// Custom Debug implementation that redacts sensitive fields.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("registry_base_url", &self.registry_base_url)
            .field("app_origin", &self.app_origin)
            .field(
                "registry_bearer_token",
                &self.registry_bearer_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("http_timeout_seconds", &self.http_timeout_seconds)
            .field("session_duration_minutes", &self.session_duration_minutes)
            .field("identity_requirement", &self.identity_requirement)
            .field("trust_requirement", &self.trust_requirement)
            .field("client_id", &self.client_id)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let registry_base_url = vars
            .get("REGISTRY_BASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("REGISTRY_BASE_URL".to_string()))?
            .clone();

        let app_origin = vars
            .get("PERIHELION_APP_ORIGIN")
            .cloned()
            .unwrap_or_else(|| DEFAULT_APP_ORIGIN.to_string());

        let registry_bearer_token = vars
            .get("REGISTRY_BEARER_TOKEN")
            .cloned()
            .map(SecretString::from);

        let http_timeout_seconds = vars
            .get("REGISTRY_HTTP_TIMEOUT_SECONDS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECONDS);

        let session_duration_minutes = vars
            .get("SESSION_DURATION_MINUTES")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_SESSION_DURATION_MINUTES);

        let identity_requirement = match vars.get("SESSION_IDENTITY_REQUIREMENT") {
            Some(raw) => parse_identity_requirement(raw)?,
            None => IdentityRequirement::default(),
        };

        let trust_requirement = match vars.get("SESSION_TRUST_REQUIREMENT") {
            Some(raw) => parse_trust_requirement(raw)?,
            None => TrustRequirement::default(),
        };

        // Generate client instance ID
        let client_id = vars.get("SESSION_CLIENT_ID").cloned().unwrap_or_else(|| {
            let uuid_suffix = uuid::Uuid::new_v4().to_string();
            let short_suffix = uuid_suffix.get(..8).unwrap_or("00000000");
            format!("{DEFAULT_CLIENT_ID_PREFIX}-{short_suffix}")
        });

        Ok(Config {
            registry_base_url,
            app_origin,
            registry_bearer_token,
            http_timeout_seconds,
            session_duration_minutes,
            identity_requirement,
            trust_requirement,
            client_id,
        })
    }
}

fn parse_identity_requirement(raw: &str) -> Result<IdentityRequirement, ConfigError> {
    match raw {
        "anonymous" => Ok(IdentityRequirement::Anonymous),
        "verified" => Ok(IdentityRequirement::Verified),
        "verified-anonymous" => Ok(IdentityRequirement::VerifiedAnonymous),
        other => Err(ConfigError::InvalidValue(format!(
            "unknown identity requirement: {other}"
        ))),
    }
}

fn parse_trust_requirement(raw: &str) -> Result<TrustRequirement, ConfigError> {
    match raw {
        "low" => Ok(TrustRequirement::Low),
        "standard" => Ok(TrustRequirement::Standard),
        "high" => Ok(TrustRequirement::High),
        other => Err(ConfigError::InvalidValue(format!(
            "unknown trust requirement: {other}"
        ))),
    }
}
