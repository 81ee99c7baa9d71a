//! Mock media transport.
//!
//! Observes connect attempts (including the token used), lets tests inject
//! transport events into an active session, and records camera toggles and
//! release.

use common::types::AccessToken;
use session_client::errors::TransportError;
use session_client::transport::{MediaTransport, TransportEvent, TransportSession};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Notify};

/// Channel buffer for injected events.
const EVENT_CHANNEL_BUFFER: usize = 16;

#[derive(Debug, Default)]
struct MockTransportState {
    connect_count: AtomicUsize,
    connect_error: Mutex<Option<TransportError>>,
    tokens: Mutex<Vec<String>>,
    event_tx: Mutex<Option<mpsc::Sender<TransportEvent>>>,
    released: AtomicBool,
    camera_calls: Mutex<Vec<bool>>,
    connected_notify: Notify,
}

/// Mock of the media transport SDK.
#[derive(Debug, Default, Clone)]
pub struct MockTransport {
    state: Arc<MockTransportState>,
}

impl MockTransport {
    /// Transport whose connect succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport whose connect fails with the given error.
    #[must_use]
    pub fn failing(error: TransportError) -> Self {
        let transport = Self::default();
        *transport.state.connect_error.lock().expect("mock poisoned") = Some(error);
        transport
    }

    /// Number of connect attempts.
    #[must_use]
    pub fn connect_count(&self) -> usize {
        self.state.connect_count.load(Ordering::SeqCst)
    }

    /// Tokens used on connect attempts, in order.
    #[must_use]
    pub fn tokens(&self) -> Vec<String> {
        self.state.tokens.lock().expect("mock poisoned").clone()
    }

    /// Whether the active session has been released via `leave`.
    #[must_use]
    pub fn released(&self) -> bool {
        self.state.released.load(Ordering::SeqCst)
    }

    /// Camera toggle values observed, in order.
    #[must_use]
    pub fn camera_calls(&self) -> Vec<bool> {
        self.state
            .camera_calls
            .lock()
            .expect("mock poisoned")
            .clone()
    }

    /// Wait until a session has been connected.
    pub async fn wait_for_connect(&self) {
        while self.connect_count() == 0 {
            self.state.connected_notify.notified().await;
        }
    }

    /// Inject a transport event into the active session.
    ///
    /// # Panics
    ///
    /// Panics if no session has been connected.
    pub async fn emit(&self, event: TransportEvent) {
        let sender = self
            .state
            .event_tx
            .lock()
            .expect("mock poisoned")
            .clone()
            .expect("no transport session connected");
        sender.send(event).await.expect("event channel closed");
    }
}

impl MediaTransport for MockTransport {
    type Session = MockTransportSession;

    async fn connect(
        &self,
        token: &AccessToken,
    ) -> Result<(Self::Session, mpsc::Receiver<TransportEvent>), TransportError> {
        self.state.connect_count.fetch_add(1, Ordering::SeqCst);
        self.state
            .tokens
            .lock()
            .expect("mock poisoned")
            .push(token.expose().to_string());

        if let Some(error) = self.state.connect_error.lock().expect("mock poisoned").clone() {
            return Err(error);
        }

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_BUFFER);
        *self.state.event_tx.lock().expect("mock poisoned") = Some(tx);
        self.state.released.store(false, Ordering::SeqCst);
        self.state.connected_notify.notify_one();

        Ok((
            MockTransportSession {
                state: Arc::clone(&self.state),
            },
            rx,
        ))
    }
}

/// Session handle produced by [`MockTransport`].
#[derive(Debug)]
pub struct MockTransportSession {
    state: Arc<MockTransportState>,
}

impl TransportSession for MockTransportSession {
    async fn set_camera_enabled(&mut self, enabled: bool) -> Result<(), TransportError> {
        self.state
            .camera_calls
            .lock()
            .expect("mock poisoned")
            .push(enabled);
        Ok(())
    }

    async fn leave(&mut self) {
        self.state.released.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_records_token_and_emits() {
        let transport = MockTransport::new();
        let token = AccessToken::from("tok_a");

        let (mut session, mut events) = transport.connect(&token).await.unwrap();
        assert_eq!(transport.connect_count(), 1);
        assert_eq!(transport.tokens(), vec!["tok_a".to_string()]);
        assert!(!transport.released());

        transport.emit(TransportEvent::RemoteJoined).await;
        assert_eq!(events.recv().await, Some(TransportEvent::RemoteJoined));

        session.leave().await;
        assert!(transport.released());
    }

    #[tokio::test]
    async fn test_failing_transport() {
        let transport = MockTransport::failing(TransportError::Connect(
            "camera permission denied".into(),
        ));
        let token = AccessToken::from("tok_a");

        let result = transport.connect(&token).await;
        assert!(result.is_err());
        assert_eq!(transport.connect_count(), 1);
    }
}
