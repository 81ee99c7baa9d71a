//! Mock session registry.
//!
//! Scripted create/join/end outcomes with call counters, optional per-call
//! latency, and a notification for observing the fire-and-forget end
//! request.
//!
//! # Example
//!
//! ```rust,ignore
//! use session_test_utils::{fixtures, MockRegistry};
//! use session_client::errors::RegistryError;
//!
//! let registry = MockRegistry::builder()
//!     .join_response(Err(RegistryError::Rejected("session not found or expired".into())))
//!     .join_response(Ok(fixtures::joined_session("sess_1", 60, "tok_b")))
//!     .build();
//! // First join fails, every later join succeeds.
//! ```

use session_client::errors::RegistryError;
use session_client::registry::{
    CreateSessionRequest, CreatedSession, JoinedSession, SessionRegistry,
};
use common::types::SessionId;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;

/// Scripted mock of the session registry.
///
/// Responses are consumed in order; the last configured response repeats.
/// An unscripted call fails with a rejection naming the function, so tests
/// that accidentally hit an unexpected endpoint fail loudly.
#[derive(Debug, Default)]
pub struct MockRegistry {
    create_responses: Mutex<Vec<Result<CreatedSession, RegistryError>>>,
    join_responses: Mutex<Vec<Result<JoinedSession, RegistryError>>>,
    end_responses: Mutex<Vec<Result<(), RegistryError>>>,
    create_delay: Option<Duration>,
    join_delay: Option<Duration>,
    create_calls: AtomicUsize,
    join_calls: AtomicUsize,
    end_calls: AtomicUsize,
    end_sessions: Mutex<Vec<SessionId>>,
    end_notify: Notify,
}

impl MockRegistry {
    /// Create a new builder.
    #[must_use]
    pub fn builder() -> MockRegistryBuilder {
        MockRegistryBuilder::default()
    }

    /// Number of create requests issued.
    #[must_use]
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Number of join requests issued.
    #[must_use]
    pub fn join_calls(&self) -> usize {
        self.join_calls.load(Ordering::SeqCst)
    }

    /// Number of end requests issued.
    #[must_use]
    pub fn end_calls(&self) -> usize {
        self.end_calls.load(Ordering::SeqCst)
    }

    /// Session identifiers passed to end requests.
    #[must_use]
    pub fn ended_sessions(&self) -> Vec<SessionId> {
        self.end_sessions.lock().expect("mock poisoned").clone()
    }

    /// Wait until at least one end request has been issued. The end request
    /// is fire-and-forget in the controller, so tests use this to observe it
    /// deterministically.
    pub async fn wait_for_end_call(&self) {
        while self.end_calls() == 0 {
            self.end_notify.notified().await;
        }
    }

    fn next_response<T: Clone>(
        responses: &Mutex<Vec<Result<T, RegistryError>>>,
        calls: &AtomicUsize,
        function: &str,
    ) -> Result<T, RegistryError> {
        let index = calls.fetch_add(1, Ordering::SeqCst);
        let responses = responses.lock().expect("mock poisoned");
        match responses.get(index).or_else(|| responses.last()) {
            Some(response) => response.clone(),
            None => Err(RegistryError::Rejected(format!(
                "no scripted response for {function}"
            ))),
        }
    }
}

impl SessionRegistry for MockRegistry {
    async fn create_session(
        &self,
        _request: CreateSessionRequest,
    ) -> Result<CreatedSession, RegistryError> {
        let response =
            Self::next_response(&self.create_responses, &self.create_calls, "createVideoSession");
        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }
        response
    }

    async fn join_session(&self, _session_id: SessionId) -> Result<JoinedSession, RegistryError> {
        let response =
            Self::next_response(&self.join_responses, &self.join_calls, "joinVideoSession");
        if let Some(delay) = self.join_delay {
            tokio::time::sleep(delay).await;
        }
        response
    }

    async fn end_session(&self, session_id: SessionId) -> Result<(), RegistryError> {
        let response = Self::next_response(&self.end_responses, &self.end_calls, "endVideoSession");
        self.end_sessions
            .lock()
            .expect("mock poisoned")
            .push(session_id);
        self.end_notify.notify_one();
        response
    }
}

/// Builder for [`MockRegistry`].
#[derive(Debug, Default)]
pub struct MockRegistryBuilder {
    create_responses: Vec<Result<CreatedSession, RegistryError>>,
    join_responses: Vec<Result<JoinedSession, RegistryError>>,
    end_responses: Vec<Result<(), RegistryError>>,
    create_delay: Option<Duration>,
    join_delay: Option<Duration>,
}

impl MockRegistryBuilder {
    /// Queue a create response. The last queued response repeats.
    #[must_use]
    pub fn create_response(mut self, response: Result<CreatedSession, RegistryError>) -> Self {
        self.create_responses.push(response);
        self
    }

    /// Queue a join response. The last queued response repeats.
    #[must_use]
    pub fn join_response(mut self, response: Result<JoinedSession, RegistryError>) -> Self {
        self.join_responses.push(response);
        self
    }

    /// Queue an end response. The last queued response repeats.
    #[must_use]
    pub fn end_response(mut self, response: Result<(), RegistryError>) -> Self {
        self.end_responses.push(response);
        self
    }

    /// Delay every create response, simulating a slow registry.
    #[must_use]
    pub fn create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = Some(delay);
        self
    }

    /// Delay every join response, simulating a slow registry.
    #[must_use]
    pub fn join_delay(mut self, delay: Duration) -> Self {
        self.join_delay = Some(delay);
        self
    }

    /// Build the mock.
    #[must_use]
    pub fn build(self) -> MockRegistry {
        let mut end_responses = self.end_responses;
        if end_responses.is_empty() {
            // Ending a session succeeds unless scripted otherwise.
            end_responses.push(Ok(()));
        }

        MockRegistry {
            create_responses: Mutex::new(self.create_responses),
            join_responses: Mutex::new(self.join_responses),
            end_responses: Mutex::new(end_responses),
            create_delay: self.create_delay,
            join_delay: self.join_delay,
            ..MockRegistry::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[tokio::test]
    async fn test_responses_consume_in_order_and_repeat_last() {
        let registry = MockRegistry::builder()
            .join_response(Err(RegistryError::Rejected("session has ended".into())))
            .join_response(Ok(fixtures::joined_session("sess_1", 60, "tok_b")))
            .build();

        assert!(registry.join_session("sess_1".into()).await.is_err());
        assert!(registry.join_session("sess_1".into()).await.is_ok());
        // Last response repeats.
        assert!(registry.join_session("sess_1".into()).await.is_ok());
        assert_eq!(registry.join_calls(), 3);
    }

    #[tokio::test]
    async fn test_unscripted_call_fails_loudly() {
        let registry = MockRegistry::builder().build();

        let result = registry.join_session("sess_1".into()).await;
        assert!(matches!(result, Err(RegistryError::Rejected(m)) if m.contains("joinVideoSession")));
    }

    #[tokio::test]
    async fn test_end_records_session_and_notifies() {
        let registry = MockRegistry::builder().build();

        registry.end_session("sess_9".into()).await.unwrap();
        registry.wait_for_end_call().await;

        assert_eq!(registry.end_calls(), 1);
        assert_eq!(registry.ended_sessions(), vec!["sess_9".into()]);
    }
}
