//! Media transport capability.
//!
//! The transport SDK owns media connection establishment and real-time
//! participant events; this module only defines the narrow surface the
//! controller needs: connect with an access token, observe events, toggle
//! the camera, and release the session.

use crate::errors::TransportError;
use common::types::AccessToken;
use std::future::Future;
use tokio::sync::mpsc;
use tracing::debug;

/// Events emitted by an active transport session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The local participant finished joining the media session.
    Connected,
    /// The counterpart is present in the media session.
    RemoteJoined,
    /// The counterpart departed (not the local participant).
    RemoteLeft,
    /// The local departure was confirmed by the SDK.
    LocalLeft,
    /// Recoverable local media-device fault; the call continues.
    CameraFault {
        /// SDK-provided fault description.
        message: String,
    },
    /// SDK runtime fault.
    Fault {
        /// SDK-provided fault description.
        message: String,
    },
}

/// Whether a fault message indicates the session itself is gone
/// (fatal after a short linger) rather than a generic transport error.
#[must_use]
pub fn is_session_gone(message: &str) -> bool {
    message.contains("room") || message.contains("deleted")
}

/// Capability for establishing media sessions.
pub trait MediaTransport: Send + Sync + 'static {
    /// Active session handle type.
    type Session: TransportSession;

    /// Establish a media session with the given access token.
    ///
    /// Returns the session handle and the event stream for its lifetime.
    fn connect(
        &self,
        token: &AccessToken,
    ) -> impl Future<Output = Result<(Self::Session, mpsc::Receiver<TransportEvent>), TransportError>>
           + Send;
}

/// An established media session.
pub trait TransportSession: Send + 'static {
    /// Enable or disable the local camera feed.
    fn set_camera_enabled(
        &mut self,
        enabled: bool,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Release the media session. Must be safe to call on any exit path.
    fn leave(&mut self) -> impl Future<Output = ()> + Send;
}

/// Stand-in transport for environments without a media SDK.
///
/// Connects trivially, reports `Connected`, and never carries media. Used by
/// the headless binary to exercise the registry and lifecycle paths.
#[derive(Debug, Default)]
pub struct HeadlessTransport;

impl HeadlessTransport {
    /// Create a headless transport.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl MediaTransport for HeadlessTransport {
    type Session = HeadlessSession;

    async fn connect(
        &self,
        _token: &AccessToken,
    ) -> Result<(Self::Session, mpsc::Receiver<TransportEvent>), TransportError> {
        let (tx, rx) = mpsc::channel(4);
        // Deliver the join confirmation; the sender is then dropped and the
        // stream stays silent.
        let _ = tx.send(TransportEvent::Connected).await;
        Ok((HeadlessSession, rx))
    }
}

/// Session handle for [`HeadlessTransport`].
#[derive(Debug)]
pub struct HeadlessSession;

impl TransportSession for HeadlessSession {
    async fn set_camera_enabled(&mut self, enabled: bool) -> Result<(), TransportError> {
        debug!(target: "session.transport", enabled, "Headless camera toggle");
        Ok(())
    }

    async fn leave(&mut self) {
        debug!(target: "session.transport", "Headless session released");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_session_gone_classification() {
        assert!(is_session_gone("the room was deleted"));
        assert!(is_session_gone("no such room"));
        assert!(is_session_gone("call deleted by host"));
        assert!(!is_session_gone("ice negotiation failed"));
    }

    #[tokio::test]
    async fn test_headless_transport_reports_connected() {
        let transport = HeadlessTransport::new();
        let token = AccessToken::from("tok_test");

        let (mut session, mut events) = transport.connect(&token).await.unwrap();
        assert_eq!(events.recv().await, Some(TransportEvent::Connected));
        // Stream closes once the connect-time sender is gone.
        assert_eq!(events.recv().await, None);

        session.set_camera_enabled(false).await.unwrap();
        session.leave().await;
    }
}
