//! HTTP adapter for the session registry.
//!
//! Talks to the backend's function-invoke endpoints
//! (`POST {base}/functions/<name>`) with JSON bodies. A 2xx response whose
//! body carries an `error` field is a service rejection and surfaces that
//! message verbatim; everything else that is not a decodable success maps to
//! an HTTP error class.

use super::{CreateSessionRequest, CreatedSession, JoinedSession, SessionRegistry};
use crate::errors::RegistryError;
use crate::identity::{IdentityProvider, UserProfile};
use common::secret::{ExposeSecret, SecretString};
use common::types::SessionId;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Default request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Connect timeout for the HTTP client.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct JoinSessionBody<'a> {
    session_id: &'a SessionId,
    accept_invite: bool,
}

#[derive(Serialize)]
struct EndSessionBody<'a> {
    session_id: &'a SessionId,
}

/// HTTP client for the registry's function endpoints.
///
/// Cheap to share behind an `Arc`; the underlying `reqwest::Client` pools
/// connections internally.
pub struct HttpBackend {
    base_url: String,
    bearer: Option<SecretString>,
    http: reqwest::Client,
}

impl HttpBackend {
    /// Create a backend client.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Configuration` if the HTTP client cannot be
    /// built.
    pub fn new(
        base_url: impl Into<String>,
        bearer: Option<SecretString>,
        request_timeout: Duration,
    ) -> Result<Self, RegistryError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| {
                RegistryError::Configuration(format!("failed to build HTTP client: {e}"))
            })?;

        let base_url: String = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();

        Ok(Self {
            base_url,
            bearer,
            http,
        })
    }

    /// Invoke a backend function with a JSON body.
    async fn invoke<Req, Resp>(&self, function: &str, body: &Req) -> Result<Resp, RegistryError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = format!("{}/functions/{function}", self.base_url);
        debug!(target: "session.registry", function, "Invoking registry function");

        let mut request = self.http.post(&url).json(body);
        if let Some(bearer) = &self.bearer {
            request = request.bearer_auth(bearer.expose_secret());
        }

        let response = request.send().await.map_err(|e| {
            warn!(target: "session.registry", function, error = %e, "Registry request failed");
            RegistryError::Http(e.to_string())
        })?;

        let status = response.status();
        let payload: serde_json::Value = response.json().await.map_err(|e| {
            if status.is_success() {
                RegistryError::InvalidResponse(e.to_string())
            } else {
                RegistryError::Http(format!("{function} returned {status}"))
            }
        })?;

        // A service-level rejection carries its message in an `error` field,
        // regardless of HTTP status.
        if let Some(message) = payload.get("error").and_then(serde_json::Value::as_str) {
            debug!(target: "session.registry", function, message, "Registry rejected request");
            return Err(RegistryError::Rejected(message.to_string()));
        }

        if !status.is_success() {
            return Err(RegistryError::Http(format!("{function} returned {status}")));
        }

        serde_json::from_value(payload).map_err(|e| RegistryError::InvalidResponse(e.to_string()))
    }

    /// Issue an authenticated GET against a backend path.
    async fn get<Resp>(&self, path: &str) -> Result<Resp, RegistryError>
    where
        Resp: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);

        let mut request = self.http.get(&url);
        if let Some(bearer) = &self.bearer {
            request = request.bearer_auth(bearer.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|e| RegistryError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::Http(format!("{path} returned {status}")));
        }

        response
            .json()
            .await
            .map_err(|e| RegistryError::InvalidResponse(e.to_string()))
    }
}

impl SessionRegistry for HttpBackend {
    async fn create_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<CreatedSession, RegistryError> {
        self.invoke("createVideoSession", &request).await
    }

    async fn join_session(&self, session_id: SessionId) -> Result<JoinedSession, RegistryError> {
        let body = JoinSessionBody {
            session_id: &session_id,
            accept_invite: true,
        };
        self.invoke("joinVideoSession", &body).await
    }

    async fn end_session(&self, session_id: SessionId) -> Result<(), RegistryError> {
        let body = EndSessionBody {
            session_id: &session_id,
        };
        let _: serde_json::Value = self.invoke("endVideoSession", &body).await?;
        Ok(())
    }
}

impl IdentityProvider for HttpBackend {
    async fn current_user(&self) -> Result<UserProfile, RegistryError> {
        self.get("/auth/me").await
    }
}
