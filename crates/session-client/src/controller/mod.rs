//! Session lifecycle controller.
//!
//! Drives one outgoing or incoming call attempt from initiation to
//! termination, translating registry responses and transport events into a
//! finite set of user-visible states:
//!
//! ```text
//! idle -> creating -> ringing -> in_call -> ended
//!             \           \          \-> error
//!              \-> error   \-> ended (cancel)
//! joining -> in_call | error (retry re-enters joining)
//! ```
//!
//! # Execution model
//!
//! A single actor task owns all controller state. Commands arrive through
//! [`SessionControllerHandle`]; registry requests and linger timers are
//! spawned onto the runtime and resume the actor by sending completions into
//! the same mailbox. At most one lifecycle request (create/join/end) is in
//! flight at a time; a second lifecycle command while one is pending is
//! ignored. Every outstanding request carries a generation tag, and
//! completions whose generation no longer matches are dropped as stale.
//!
//! # Resource guarantees
//!
//! The access token and the transport session are owned exclusively by the
//! controller. Every exit from `in_call` (including cancellation) releases
//! the transport session before or at the moment the terminal state is
//! published.

pub mod metrics;

mod messages;

pub use metrics::{ControllerMetrics, ControllerMetricsSnapshot};

use crate::errors::{JoinRejection, SessionError};
use crate::identity::IdentityProvider;
use crate::navigation::NavigationContext;
use crate::registry::{CreateSessionRequest, SessionRegistry};
use crate::state::{CallState, ErrorKind};
use crate::transport::{is_session_gone, MediaTransport, TransportEvent, TransportSession};
use messages::{Command, ControllerMessage, Internal, LingerOutcome, Outcome};

use common::types::{AccessToken, IdentityRequirement, Session, SessionId, TrustRequirement, UserId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Channel buffer size for the controller mailbox.
const CONTROLLER_CHANNEL_BUFFER: usize = 64;

/// Bound on transport release so shutdown cannot hang on the SDK.
const RELEASE_TIMEOUT: Duration = Duration::from_secs(5);

/// Linger between the counterpart leaving and the call ending.
pub const REMOTE_LEFT_LINGER: Duration = Duration::from_secs(1);

/// Linger between a session-gone transport fault and the call ending.
pub const SESSION_GONE_LINGER: Duration = Duration::from_secs(2);

/// Tunables for one controller instance.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Identity disclosure tier requested for created sessions.
    pub identity_requirement: IdentityRequirement,
    /// Trust level requested for created sessions.
    pub trust_requirement: TrustRequirement,
    /// Requested session lifetime in minutes.
    pub session_duration_minutes: u32,
    /// Linger after the counterpart leaves before ending the call.
    pub remote_left_linger: Duration,
    /// Linger after a session-gone fault before ending the call.
    pub session_gone_linger: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            identity_requirement: IdentityRequirement::default(),
            trust_requirement: TrustRequirement::default(),
            session_duration_minutes: 60,
            remote_left_linger: REMOTE_LEFT_LINGER,
            session_gone_linger: SESSION_GONE_LINGER,
        }
    }
}

/// Handle to a running [`SessionController`].
#[derive(Clone)]
pub struct SessionControllerHandle {
    sender: mpsc::Sender<ControllerMessage>,
    cancel_token: CancellationToken,
    state_rx: watch::Receiver<CallState>,
}

impl SessionControllerHandle {
    /// Current published state.
    #[must_use]
    pub fn state(&self) -> CallState {
        self.state_rx.borrow().clone()
    }

    /// Subscribe to state transitions.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<CallState> {
        self.state_rx.clone()
    }

    /// Start a new session, inviting the given user. Valid in `idle`;
    /// ignored elsewhere and while a lifecycle request is in flight.
    pub async fn start_session(&self, invited_user: UserId) -> Result<(), SessionError> {
        self.send(Command::StartSession { invited_user }).await
    }

    /// Cancel a `ringing` session. Issues the creator-only end request.
    pub async fn cancel_session(&self) -> Result<(), SessionError> {
        self.send(Command::CancelSession).await
    }

    /// End the active call. Releases the transport; the creator additionally
    /// ends the session server-side.
    pub async fn end_call(&self) -> Result<(), SessionError> {
        self.send(Command::EndCall).await
    }

    /// Notify the controller that the invited counterpart has joined a
    /// `ringing` session. Delivered out-of-band by the embedding
    /// application's signaling.
    pub async fn counterpart_joined(&self) -> Result<(), SessionError> {
        self.send(Command::CounterpartJoined).await
    }

    /// Re-attempt a failed join. Valid in the error state of a join attempt.
    pub async fn retry_join(&self) -> Result<(), SessionError> {
        self.send(Command::RetryJoin).await
    }

    /// Enable or disable the local camera feed.
    pub async fn set_camera_enabled(&self, enabled: bool) -> Result<(), SessionError> {
        self.send(Command::SetCameraEnabled { enabled }).await
    }

    async fn send(&self, command: Command) -> Result<(), SessionError> {
        self.sender
            .send(ControllerMessage::Command(command))
            .await
            .map_err(|e| SessionError::Internal(format!("channel send failed: {e}")))
    }

    /// Cancel the controller. The transport session is released before the
    /// actor exits.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Check if the controller is cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Get a child token tied to the controller's lifetime.
    #[must_use]
    pub fn child_token(&self) -> CancellationToken {
        self.cancel_token.child_token()
    }
}

/// Data valid only while a call is active.
#[derive(Debug)]
struct ActiveCall {
    session: Session,
    is_creator: bool,
    camera_enabled: bool,
    camera_fault: Option<String>,
    room_fault: Option<String>,
    /// Generation of the scheduled terminal linger, if any.
    pending_linger: Option<u64>,
}

/// Internal machine state. Each variant carries only the data valid in that
/// state, so holding a token while idle is unrepresentable.
#[derive(Debug)]
enum Phase {
    Idle,
    Creating { generation: u64 },
    Joining { generation: u64 },
    Ringing { session: Session, token: AccessToken },
    InCall(ActiveCall),
    Ended,
    Failed { kind: ErrorKind, message: String },
}

/// The session lifecycle controller actor.
pub struct SessionController<I, R, T, N>
where
    I: IdentityProvider,
    R: SessionRegistry,
    T: MediaTransport,
    N: NavigationContext,
{
    identity: Arc<I>,
    registry: Arc<R>,
    transport: Arc<T>,
    navigation: Arc<N>,
    config: ControllerConfig,
    receiver: mpsc::Receiver<ControllerMessage>,
    /// Cloned into spawned request/timer tasks so completions land on the
    /// same mailbox as commands.
    internal_tx: mpsc::Sender<ControllerMessage>,
    cancel_token: CancellationToken,
    state_tx: watch::Sender<CallState>,
    metrics: Arc<ControllerMetrics>,
    phase: Phase,
    /// Active media session; `Some` exactly while `phase` is `InCall`.
    media_session: Option<T::Session>,
    /// Event stream of the active media session.
    transport_events: Option<mpsc::Receiver<TransportEvent>>,
    /// Session identifier present in the navigation context at startup.
    session_hint: Option<SessionId>,
    /// Monotonic tag for outstanding requests and lingers.
    generation: u64,
}

impl<I, R, T, N> SessionController<I, R, T, N>
where
    I: IdentityProvider,
    R: SessionRegistry,
    T: MediaTransport,
    N: NavigationContext,
{
    /// Spawn a controller.
    ///
    /// Reads the session hint from the navigation context: with a hint the
    /// controller joins that session immediately after the identity lookup;
    /// without one it waits in `idle` for `start_session`.
    ///
    /// Returns a handle and the task join handle.
    pub fn spawn(
        identity: Arc<I>,
        registry: Arc<R>,
        transport: Arc<T>,
        navigation: Arc<N>,
        config: ControllerConfig,
        metrics: Arc<ControllerMetrics>,
    ) -> (SessionControllerHandle, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(CONTROLLER_CHANNEL_BUFFER);
        let (state_tx, state_rx) = watch::channel(CallState::Idle);
        let cancel_token = CancellationToken::new();
        let session_hint = navigation.session_hint();

        let controller = Self {
            identity,
            registry,
            transport,
            navigation,
            config,
            receiver,
            internal_tx: sender.clone(),
            cancel_token: cancel_token.clone(),
            state_tx,
            metrics,
            phase: Phase::Idle,
            media_session: None,
            transport_events: None,
            session_hint,
            generation: 0,
        };

        let task_handle = tokio::spawn(controller.run());

        let handle = SessionControllerHandle {
            sender,
            cancel_token,
            state_rx,
        };

        (handle, task_handle)
    }

    /// Run the actor message loop.
    #[instrument(skip_all, name = "session.controller")]
    async fn run(mut self) {
        info!(
            target: "session.controller",
            has_session_hint = self.session_hint.is_some(),
            "Session controller started"
        );

        self.initialize().await;

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(
                        target: "session.controller",
                        "Controller received cancellation signal"
                    );
                    self.graceful_shutdown().await;
                    break;
                }

                event = next_transport_event(&mut self.transport_events) => {
                    self.handle_transport_event(event).await;
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => self.handle_message(message).await,
                        None => break,
                    }
                }
            }
        }

        info!(
            target: "session.controller",
            state = self.snapshot().label(),
            "Session controller stopped"
        );
    }

    /// Resolve the local user, then route on the session hint.
    async fn initialize(&mut self) {
        let identity = Arc::clone(&self.identity);
        let cancel = self.cancel_token.clone();

        let profile = tokio::select! {
            () = cancel.cancelled() => return,
            result = identity.current_user() => result,
        };

        match profile {
            Ok(user) => {
                debug!(
                    target: "session.controller",
                    user_id = %user.id,
                    "Resolved local user"
                );

                if let Some(session_id) = self.session_hint.clone() {
                    self.begin_join(session_id);
                }
            }
            Err(e) => {
                warn!(
                    target: "session.controller",
                    error = %e,
                    "Identity lookup failed"
                );
                self.fail(ErrorKind::Initialization, "Failed to initialize session");
            }
        }
    }

    /// Handle a single mailbox message.
    async fn handle_message(&mut self, message: ControllerMessage) {
        match message {
            ControllerMessage::Command(command) => self.handle_command(command).await,
            ControllerMessage::Internal(internal) => self.handle_internal(internal).await,
        }
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::StartSession { invited_user } => self.handle_start_session(invited_user),
            Command::CancelSession => self.handle_cancel_session(),
            Command::EndCall => self.handle_end_call().await,
            Command::CounterpartJoined => self.handle_counterpart_joined().await,
            Command::RetryJoin => self.handle_retry_join(),
            Command::SetCameraEnabled { enabled } => self.handle_set_camera(enabled).await,
        }
    }

    async fn handle_internal(&mut self, internal: Internal) {
        match internal {
            Internal::Completion {
                generation,
                outcome,
            } => self.handle_completion(generation, outcome).await,
            Internal::LingerElapsed {
                generation,
                outcome,
            } => self.handle_linger_elapsed(generation, outcome).await,
        }
    }

    fn handle_start_session(&mut self, invited_user: UserId) {
        match &self.phase {
            Phase::Idle => self.begin_create(invited_user),
            Phase::Creating { .. } | Phase::Joining { .. } => {
                debug!(
                    target: "session.controller",
                    "Lifecycle request already in flight, ignoring start"
                );
                self.metrics.record_command_ignored();
            }
            _ => {
                debug!(
                    target: "session.controller",
                    state = self.snapshot().label(),
                    "Ignoring start outside idle"
                );
                self.metrics.record_command_ignored();
            }
        }
    }

    fn handle_cancel_session(&mut self) {
        if let Phase::Ringing { session, .. } = &self.phase {
            let session_id = session.id.clone();
            info!(
                target: "session.controller",
                session_id = %session_id,
                "Cancelling session"
            );
            self.spawn_end_session(session_id);
            self.metrics.record_call_completed();
            self.phase = Phase::Ended;
            self.publish();
        } else {
            debug!(
                target: "session.controller",
                state = self.snapshot().label(),
                "Ignoring cancel outside ringing"
            );
            self.metrics.record_command_ignored();
        }
    }

    async fn handle_end_call(&mut self) {
        if let Phase::InCall(call) = &self.phase {
            let is_creator = call.is_creator;
            let session_id = call.session.id.clone();
            info!(
                target: "session.controller",
                session_id = %session_id,
                is_creator,
                "Ending call"
            );

            self.release_transport().await;
            // Only the creator holds authority to terminate the session
            // server-side; a joinee leaving just ends the local view.
            if is_creator {
                self.spawn_end_session(session_id);
            }
            self.metrics.record_call_completed();
            self.phase = Phase::Ended;
            self.publish();
        } else {
            debug!(
                target: "session.controller",
                state = self.snapshot().label(),
                "Ignoring end outside call"
            );
            self.metrics.record_command_ignored();
        }
    }

    async fn handle_counterpart_joined(&mut self) {
        if matches!(self.phase, Phase::Ringing { .. }) {
            if let Phase::Ringing { session, token } =
                std::mem::replace(&mut self.phase, Phase::Idle)
            {
                info!(
                    target: "session.controller",
                    session_id = %session.id,
                    "Counterpart joined, connecting transport"
                );
                self.enter_call(session, token, true).await;
            }
        } else {
            debug!(
                target: "session.controller",
                state = self.snapshot().label(),
                "Ignoring counterpart notification outside ringing"
            );
            self.metrics.record_command_ignored();
        }
    }

    fn handle_retry_join(&mut self) {
        match (&self.phase, self.session_hint.clone()) {
            (Phase::Failed { .. }, Some(session_id)) => {
                info!(
                    target: "session.controller",
                    session_id = %session_id,
                    "Retrying join"
                );
                self.begin_join(session_id);
            }
            _ => {
                debug!(
                    target: "session.controller",
                    state = self.snapshot().label(),
                    "Ignoring retry"
                );
                self.metrics.record_command_ignored();
            }
        }
    }

    async fn handle_set_camera(&mut self, enabled: bool) {
        if !matches!(self.phase, Phase::InCall(_)) {
            debug!(
                target: "session.controller",
                state = self.snapshot().label(),
                "Ignoring camera toggle outside call"
            );
            self.metrics.record_command_ignored();
            return;
        }

        let Some(media) = self.media_session.as_mut() else {
            return;
        };

        match media.set_camera_enabled(enabled).await {
            Ok(()) => {
                if let Phase::InCall(call) = &mut self.phase {
                    call.camera_enabled = enabled;
                }
                self.publish();
            }
            Err(e) => {
                warn!(
                    target: "session.controller",
                    error = %e,
                    "Camera toggle failed"
                );
            }
        }
    }

    /// Issue the create request and enter `creating`.
    fn begin_create(&mut self, invited_user: UserId) {
        let generation = self.next_generation();
        let request = CreateSessionRequest {
            invited_user_id: invited_user,
            identity_requirement: self.config.identity_requirement,
            trust_requirement: self.config.trust_requirement,
            session_duration_minutes: self.config.session_duration_minutes,
        };

        info!(
            target: "session.controller",
            invited_user = %request.invited_user_id,
            duration_minutes = request.session_duration_minutes,
            "Creating session"
        );
        self.phase = Phase::Creating { generation };
        self.publish();

        let registry = Arc::clone(&self.registry);
        let tx = self.internal_tx.clone();
        tokio::spawn(async move {
            let result = registry.create_session(request).await;
            let _ = tx
                .send(ControllerMessage::Internal(Internal::Completion {
                    generation,
                    outcome: Outcome::Created(result),
                }))
                .await;
        });
    }

    /// Issue the join request and enter `joining`.
    fn begin_join(&mut self, session_id: SessionId) {
        let generation = self.next_generation();

        info!(
            target: "session.controller",
            session_id = %session_id,
            "Joining session"
        );
        self.phase = Phase::Joining { generation };
        self.publish();

        let registry = Arc::clone(&self.registry);
        let tx = self.internal_tx.clone();
        tokio::spawn(async move {
            let result = registry.join_session(session_id).await;
            let _ = tx
                .send(ControllerMessage::Internal(Internal::Completion {
                    generation,
                    outcome: Outcome::Joined(result),
                }))
                .await;
        });
    }

    /// Issue the creator-only end request. Fire-and-forget: the state
    /// machine transitions regardless, the outcome is logged.
    fn spawn_end_session(&self, session_id: SessionId) {
        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            match registry.end_session(session_id.clone()).await {
                Ok(()) => {
                    debug!(
                        target: "session.registry",
                        session_id = %session_id,
                        "Session ended"
                    );
                }
                Err(e) => {
                    warn!(
                        target: "session.registry",
                        session_id = %session_id,
                        error = %e,
                        "End session request failed"
                    );
                }
            }
        });
    }

    async fn handle_completion(&mut self, generation: u64, outcome: Outcome) {
        match outcome {
            Outcome::Created(result) => {
                let expected = matches!(
                    &self.phase,
                    Phase::Creating { generation: g } if *g == generation
                );
                if !expected {
                    debug!(
                        target: "session.controller",
                        generation,
                        "Dropping stale create completion"
                    );
                    self.metrics.record_stale_completion();
                    return;
                }

                match result {
                    Ok(created) => {
                        let session = Session {
                            id: created.session_id,
                            expires_at: created.expires_at,
                        };
                        // Reflect the new session into the navigation
                        // context (replace, not push) before publishing.
                        self.navigation.record_session(&session.id);
                        self.metrics.record_session_created();
                        info!(
                            target: "session.controller",
                            session_id = %session.id,
                            expires_at = %session.expires_at,
                            "Session created, waiting for counterpart"
                        );
                        self.phase = Phase::Ringing {
                            session,
                            token: created.creator_token,
                        };
                        self.publish();
                    }
                    Err(e) => {
                        self.fail(ErrorKind::Creation, e.to_string());
                    }
                }
            }

            Outcome::Joined(result) => {
                let expected = matches!(
                    &self.phase,
                    Phase::Joining { generation: g } if *g == generation
                );
                if !expected {
                    debug!(
                        target: "session.controller",
                        generation,
                        "Dropping stale join completion"
                    );
                    self.metrics.record_stale_completion();
                    return;
                }

                match result {
                    Ok(joined) => {
                        self.metrics.record_session_joined();
                        info!(
                            target: "session.controller",
                            session_id = %joined.session.id,
                            "Joined session, connecting transport"
                        );
                        self.enter_call(joined.session, joined.participant_token, false)
                            .await;
                    }
                    Err(e) => {
                        let rejection = JoinRejection::classify(&e);
                        self.metrics.record_join_rejection();
                        warn!(
                            target: "session.controller",
                            class = rejection.label(),
                            error = %e,
                            "Join rejected"
                        );
                        self.fail(ErrorKind::Join(rejection.clone()), rejection.user_message());
                    }
                }
            }
        }
    }

    async fn handle_linger_elapsed(&mut self, generation: u64, outcome: LingerOutcome) {
        let expected = matches!(
            &self.phase,
            Phase::InCall(call) if call.pending_linger == Some(generation)
        );
        if !expected {
            debug!(
                target: "session.controller",
                generation,
                "Dropping stale linger"
            );
            self.metrics.record_stale_completion();
            return;
        }

        info!(
            target: "session.controller",
            reason = outcome.label(),
            "Call ended"
        );
        self.release_transport().await;
        self.metrics.record_call_completed();
        self.phase = Phase::Ended;
        self.publish();
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        if !matches!(self.phase, Phase::InCall(_)) {
            debug!(
                target: "session.transport",
                event = ?event,
                "Transport event outside call, ignoring"
            );
            return;
        }

        match event {
            TransportEvent::Connected => {
                debug!(target: "session.transport", "Transport join complete");
            }

            TransportEvent::RemoteJoined => {
                info!(target: "session.transport", "Counterpart joined the call");
            }

            TransportEvent::RemoteLeft => {
                info!(target: "session.transport", "Counterpart left the call");
                self.schedule_linger(LingerOutcome::RemoteLeft, self.config.remote_left_linger);
            }

            TransportEvent::LocalLeft => {
                info!(target: "session.transport", "Local participant left the call");
                self.release_transport().await;
                self.metrics.record_call_completed();
                self.phase = Phase::Ended;
                self.publish();
            }

            TransportEvent::CameraFault { message } => {
                self.metrics.record_transport_fault();
                warn!(target: "session.transport", %message, "Camera fault");
                // Recoverable: the call continues with a banner.
                if let Phase::InCall(call) = &mut self.phase {
                    call.camera_fault =
                        Some("Camera access error. Please check your permissions.".to_string());
                }
                self.publish();
            }

            TransportEvent::Fault { message } => {
                self.metrics.record_transport_fault();
                if is_session_gone(&message) {
                    warn!(
                        target: "session.transport",
                        %message,
                        "Session gone, ending call shortly"
                    );
                    let linger = self.config.session_gone_linger;
                    if let Phase::InCall(call) = &mut self.phase {
                        call.room_fault = Some("The session has been ended".to_string());
                    }
                    self.publish();
                    self.schedule_linger(LingerOutcome::SessionGone, linger);
                } else {
                    error!(target: "session.transport", %message, "Transport fault");
                    self.release_transport().await;
                    self.fail(ErrorKind::Transport, message);
                }
            }
        }
    }

    /// Connect the transport with the held token and enter `in_call`.
    async fn enter_call(&mut self, session: Session, token: AccessToken, is_creator: bool) {
        let transport = Arc::clone(&self.transport);
        let cancel = self.cancel_token.clone();

        let result = tokio::select! {
            () = cancel.cancelled() => return,
            result = transport.connect(&token) => result,
        };

        match result {
            Ok((media_session, events)) => {
                info!(
                    target: "session.controller",
                    session_id = %session.id,
                    is_creator,
                    "Transport connected"
                );
                self.media_session = Some(media_session);
                self.transport_events = Some(events);
                self.phase = Phase::InCall(ActiveCall {
                    session,
                    is_creator,
                    camera_enabled: true,
                    camera_fault: None,
                    room_fault: None,
                    pending_linger: None,
                });
                self.publish();
            }
            Err(e) => {
                self.metrics.record_transport_fault();
                warn!(
                    target: "session.controller",
                    error = %e,
                    "Transport connect failed"
                );
                self.fail(ErrorKind::Transport, e.user_message());
            }
        }
    }

    /// Schedule a deferred terminal transition.
    fn schedule_linger(&mut self, outcome: LingerOutcome, delay: Duration) {
        let generation = self.next_generation();
        if let Phase::InCall(call) = &mut self.phase {
            call.pending_linger = Some(generation);
        }

        let tx = self.internal_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx
                .send(ControllerMessage::Internal(Internal::LingerElapsed {
                    generation,
                    outcome,
                }))
                .await;
        });
    }

    /// Release the transport session. Safe to call on any exit path; a no-op
    /// when no session is active.
    async fn release_transport(&mut self) {
        self.transport_events = None;
        if let Some(mut media) = self.media_session.take() {
            if tokio::time::timeout(RELEASE_TIMEOUT, media.leave())
                .await
                .is_err()
            {
                warn!(
                    target: "session.controller",
                    "Transport release timed out"
                );
            } else {
                debug!(
                    target: "session.controller",
                    "Transport session released"
                );
            }
        }
    }

    /// Enter the error state.
    fn fail(&mut self, kind: ErrorKind, message: impl Into<String>) {
        let message = message.into();
        self.metrics.record_error();
        warn!(
            target: "session.controller",
            kind = kind.label(),
            %message,
            "Session attempt failed"
        );
        self.phase = Phase::Failed { kind, message };
        self.publish();
    }

    /// Perform graceful shutdown, releasing the transport best-effort.
    async fn graceful_shutdown(&mut self) {
        info!(
            target: "session.controller",
            state = self.snapshot().label(),
            "Performing graceful shutdown"
        );
        self.release_transport().await;
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Publish the current snapshot on the watch channel.
    fn publish(&self) {
        self.state_tx.send_replace(self.snapshot());
    }

    /// Build the secret-free snapshot of the current phase.
    fn snapshot(&self) -> CallState {
        match &self.phase {
            Phase::Idle => CallState::Idle,
            Phase::Creating { .. } => CallState::Creating,
            Phase::Joining { .. } => CallState::Joining,
            Phase::Ringing { session, .. } => CallState::Ringing {
                session_id: session.id.clone(),
                expires_at: session.expires_at,
            },
            Phase::InCall(call) => CallState::InCall {
                session_id: call.session.id.clone(),
                is_creator: call.is_creator,
                camera_enabled: call.camera_enabled,
                camera_fault: call.camera_fault.clone(),
                room_fault: call.room_fault.clone(),
            },
            Phase::Ended => CallState::Ended,
            Phase::Failed { kind, message } => CallState::Error {
                kind: kind.clone(),
                message: message.clone(),
                can_retry: self.session_hint.is_some(),
            },
        }
    }
}

/// Await the next event of the active transport session, or pend forever
/// when no session is active or the stream has finished.
async fn next_transport_event(
    events: &mut Option<mpsc::Receiver<TransportEvent>>,
) -> TransportEvent {
    let received = match events.as_mut() {
        Some(receiver) => receiver.recv().await,
        None => return std::future::pending().await,
    };

    match received {
        Some(event) => event,
        None => {
            // The SDK dropped its sender; the stream is finished.
            *events = None;
            std::future::pending().await
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_config_defaults() {
        let config = ControllerConfig::default();
        assert_eq!(config.identity_requirement, IdentityRequirement::Anonymous);
        assert_eq!(config.trust_requirement, TrustRequirement::Standard);
        assert_eq!(config.session_duration_minutes, 60);
        assert_eq!(config.remote_left_linger, Duration::from_secs(1));
        assert_eq!(config.session_gone_linger, Duration::from_secs(2));
    }
}
