//! Integration tests for the session lifecycle controller.
//!
//! Drives the full state machine through scripted registry and transport
//! mocks: create/join flows, error classification, linger behavior, and the
//! transport-release guarantees.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use common::types::SessionId;
use session_client::controller::{
    ControllerConfig, ControllerMetrics, SessionController, SessionControllerHandle,
};
use session_client::errors::{JoinRejection, RegistryError, TransportError};
use session_client::navigation::InMemoryNavigation;
use session_client::state::{CallState, ErrorKind};
use session_client::transport::TransportEvent;
use session_test_utils::{fixtures, MockIdentity, MockRegistry, MockTransport};
use tokio::sync::watch;
use tokio::task::JoinHandle;

// ============================================================================
// Test rig
// ============================================================================

struct TestRig {
    registry: Arc<MockRegistry>,
    transport: Arc<MockTransport>,
    navigation: Arc<InMemoryNavigation>,
    metrics: Arc<ControllerMetrics>,
    handle: SessionControllerHandle,
    task: JoinHandle<()>,
    state_rx: watch::Receiver<CallState>,
}

fn spawn_rig(
    registry: MockRegistry,
    transport: MockTransport,
    navigation: InMemoryNavigation,
) -> TestRig {
    spawn_rig_with_identity(registry, transport, navigation, MockIdentity::default())
}

fn spawn_rig_with_identity(
    registry: MockRegistry,
    transport: MockTransport,
    navigation: InMemoryNavigation,
    identity: MockIdentity,
) -> TestRig {
    let registry = Arc::new(registry);
    let transport = Arc::new(transport);
    let navigation = Arc::new(navigation);
    let metrics = ControllerMetrics::new();

    let (handle, task) = SessionController::spawn(
        Arc::new(identity),
        Arc::clone(&registry),
        Arc::clone(&transport),
        Arc::clone(&navigation),
        ControllerConfig::default(),
        Arc::clone(&metrics),
    );

    let state_rx = handle.watch_state();

    TestRig {
        registry,
        transport,
        navigation,
        metrics,
        handle,
        task,
        state_rx,
    }
}

/// Wait until the published state satisfies the predicate, returning it.
async fn wait_for<F>(rx: &mut watch::Receiver<CallState>, pred: F) -> CallState
where
    F: Fn(&CallState) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            {
                let state = rx.borrow_and_update().clone();
                if pred(&state) {
                    return state;
                }
            }
            rx.changed()
                .await
                .expect("controller dropped the state channel");
        }
    })
    .await
    .expect("timed out waiting for state")
}

/// Let queued messages drain without advancing the clock.
async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

/// Drive a rig into `in_call` as the joinee of `session_id`.
async fn join_call(session_id: &str, token: &str) -> TestRig {
    let registry = MockRegistry::builder()
        .join_response(Ok(fixtures::joined_session(session_id, 60, token)))
        .build();
    let navigation = InMemoryNavigation::with_session(SessionId::from(session_id));
    let mut rig = spawn_rig(registry, MockTransport::new(), navigation);

    wait_for(&mut rig.state_rx, |s| matches!(s, CallState::InCall { .. })).await;
    rig
}

// ============================================================================
// Create flow
// ============================================================================

#[tokio::test]
async fn test_start_session_reaches_ringing_with_returned_values() {
    let created = fixtures::created_session("sess_123", 60, "tok_a");
    let expected_expiry = created.expires_at;

    let registry = MockRegistry::builder().create_response(Ok(created)).build();
    let mut rig = spawn_rig(registry, MockTransport::new(), InMemoryNavigation::new());

    assert_eq!(rig.handle.state(), CallState::Idle);

    rig.handle.start_session("user_b".into()).await.unwrap();

    let state = wait_for(&mut rig.state_rx, |s| {
        matches!(s, CallState::Ringing { .. })
    })
    .await;
    assert_eq!(
        state,
        CallState::Ringing {
            session_id: SessionId::from("sess_123"),
            expires_at: expected_expiry,
        }
    );

    // The new session id is reflected into the navigation context.
    assert_eq!(
        rig.navigation.current(),
        Some(SessionId::from("sess_123"))
    );

    // No transport connection while ringing.
    assert_eq!(rig.transport.connect_count(), 0);
    assert_eq!(rig.metrics.snapshot().sessions_created, 1);
}

#[tokio::test]
async fn test_counterpart_joined_connects_transport_with_creator_token() {
    let registry = MockRegistry::builder()
        .create_response(Ok(fixtures::created_session("sess_123", 60, "tok_a")))
        .build();
    let mut rig = spawn_rig(registry, MockTransport::new(), InMemoryNavigation::new());

    rig.handle.start_session("user_b".into()).await.unwrap();
    wait_for(&mut rig.state_rx, |s| {
        matches!(s, CallState::Ringing { .. })
    })
    .await;

    rig.handle.counterpart_joined().await.unwrap();

    let state = wait_for(&mut rig.state_rx, |s| {
        matches!(s, CallState::InCall { .. })
    })
    .await;
    assert!(matches!(
        state,
        CallState::InCall {
            is_creator: true,
            camera_enabled: true,
            ..
        }
    ));

    // The creator token minted at create time is the one handed to the
    // transport, exactly once.
    assert_eq!(rig.transport.tokens(), vec!["tok_a".to_string()]);
    assert_eq!(rig.transport.connect_count(), 1);
}

#[tokio::test]
async fn test_create_failure_passes_message_through() {
    let registry = MockRegistry::builder()
        .create_response(Err(RegistryError::Rejected("quota exceeded".into())))
        .build();
    let mut rig = spawn_rig(registry, MockTransport::new(), InMemoryNavigation::new());

    rig.handle.start_session("user_b".into()).await.unwrap();

    let state = wait_for(&mut rig.state_rx, |s| matches!(s, CallState::Error { .. })).await;
    assert_eq!(
        state,
        CallState::Error {
            kind: ErrorKind::Creation,
            message: "quota exceeded".into(),
            // No session identifier was present, so no retry is offered.
            can_retry: false,
        }
    );
    assert!(rig.navigation.current().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_rapid_starts_issue_single_create_request() {
    let registry = MockRegistry::builder()
        .create_response(Ok(fixtures::created_session("sess_123", 60, "tok_a")))
        .create_delay(Duration::from_millis(100))
        .build();
    let mut rig = spawn_rig(registry, MockTransport::new(), InMemoryNavigation::new());

    // Two rapid starts while the first create request is still pending.
    rig.handle.start_session("user_b".into()).await.unwrap();
    rig.handle.start_session("user_b".into()).await.unwrap();

    wait_for(&mut rig.state_rx, |s| {
        matches!(s, CallState::Ringing { .. })
    })
    .await;

    assert_eq!(rig.registry.create_calls(), 1);
    assert_eq!(rig.metrics.snapshot().commands_ignored, 1);
}

// ============================================================================
// Join flow
// ============================================================================

#[tokio::test]
async fn test_startup_with_hint_joins_and_enters_call() {
    let registry = MockRegistry::builder()
        .join_response(Ok(fixtures::joined_session("sess_123", 60, "tok_b")))
        .build();
    let navigation = InMemoryNavigation::with_session(SessionId::from("sess_123"));
    let mut rig = spawn_rig(registry, MockTransport::new(), navigation);

    let state = wait_for(&mut rig.state_rx, |s| {
        matches!(s, CallState::InCall { .. })
    })
    .await;

    // Joinee never carries the creator flag.
    assert!(matches!(
        state,
        CallState::InCall {
            is_creator: false,
            ..
        }
    ));
    assert_eq!(rig.registry.join_calls(), 1);
    assert_eq!(rig.transport.tokens(), vec!["tok_b".to_string()]);
    assert_eq!(rig.metrics.snapshot().sessions_joined, 1);
}

#[tokio::test]
async fn test_join_expired_session_classifies_expired() {
    let registry = MockRegistry::builder()
        .join_response(Err(RegistryError::Rejected(
            "session not found or expired".into(),
        )))
        .build();
    let navigation = InMemoryNavigation::with_session(SessionId::from("sess_404"));
    let mut rig = spawn_rig(registry, MockTransport::new(), navigation);

    let state = wait_for(&mut rig.state_rx, |s| matches!(s, CallState::Error { .. })).await;
    assert_eq!(
        state,
        CallState::Error {
            kind: ErrorKind::Join(JoinRejection::Expired),
            message: "This session has expired".into(),
            can_retry: true,
        }
    );

    // No token stored, no transport connection attempted.
    assert_eq!(rig.transport.connect_count(), 0);
    assert_eq!(rig.metrics.snapshot().join_rejections, 1);
}

#[tokio::test]
async fn test_join_rejection_classes() {
    for (message, kind, user_message) in [
        (
            "this session has ended",
            JoinRejection::Ended,
            "This session has ended",
        ),
        (
            "user not authorized for this session",
            JoinRejection::Unauthorized,
            "You are not invited to this session",
        ),
    ] {
        let registry = MockRegistry::builder()
            .join_response(Err(RegistryError::Rejected(message.into())))
            .build();
        let navigation = InMemoryNavigation::with_session(SessionId::from("sess_1"));
        let mut rig = spawn_rig(registry, MockTransport::new(), navigation);

        let state =
            wait_for(&mut rig.state_rx, |s| matches!(s, CallState::Error { .. })).await;
        assert_eq!(
            state,
            CallState::Error {
                kind: ErrorKind::Join(kind.clone()),
                message: user_message.into(),
                can_retry: true,
            }
        );
        rig.handle.cancel();
    }
}

#[tokio::test]
async fn test_retry_join_reenters_joining_for_same_session() {
    let registry = MockRegistry::builder()
        .join_response(Err(RegistryError::Http("connection reset".into())))
        .join_response(Ok(fixtures::joined_session("sess_123", 60, "tok_b")))
        .build();
    let navigation = InMemoryNavigation::with_session(SessionId::from("sess_123"));
    let mut rig = spawn_rig(registry, MockTransport::new(), navigation);

    let state = wait_for(&mut rig.state_rx, |s| matches!(s, CallState::Error { .. })).await;
    assert!(matches!(
        state,
        CallState::Error {
            can_retry: true,
            ..
        }
    ));

    rig.handle.retry_join().await.unwrap();

    wait_for(&mut rig.state_rx, |s| {
        matches!(s, CallState::InCall { .. })
    })
    .await;
    assert_eq!(rig.registry.join_calls(), 2);
}

#[tokio::test]
async fn test_init_failure_surfaces_generic_error() {
    let identity = MockIdentity::failing(RegistryError::Http("auth backend down".into()));
    let mut rig = spawn_rig_with_identity(
        MockRegistry::builder().build(),
        MockTransport::new(),
        InMemoryNavigation::new(),
        identity,
    );

    let state = wait_for(&mut rig.state_rx, |s| matches!(s, CallState::Error { .. })).await;
    assert_eq!(
        state,
        CallState::Error {
            kind: ErrorKind::Initialization,
            message: "Failed to initialize session".into(),
            can_retry: false,
        }
    );
    assert_eq!(rig.registry.join_calls(), 0);
}

// ============================================================================
// Ending a call
// ============================================================================

#[tokio::test]
async fn test_cancel_ringing_ends_session_server_side() {
    let registry = MockRegistry::builder()
        .create_response(Ok(fixtures::created_session("sess_123", 60, "tok_a")))
        .build();
    let mut rig = spawn_rig(registry, MockTransport::new(), InMemoryNavigation::new());

    rig.handle.start_session("user_b".into()).await.unwrap();
    wait_for(&mut rig.state_rx, |s| {
        matches!(s, CallState::Ringing { .. })
    })
    .await;

    rig.handle.cancel_session().await.unwrap();

    wait_for(&mut rig.state_rx, |s| matches!(s, CallState::Ended)).await;
    rig.registry.wait_for_end_call().await;
    assert_eq!(rig.registry.end_calls(), 1);
    assert_eq!(
        rig.registry.ended_sessions(),
        vec![SessionId::from("sess_123")]
    );
}

#[tokio::test]
async fn test_creator_end_call_releases_transport_and_ends_session() {
    let registry = MockRegistry::builder()
        .create_response(Ok(fixtures::created_session("sess_123", 60, "tok_a")))
        .build();
    let mut rig = spawn_rig(registry, MockTransport::new(), InMemoryNavigation::new());

    rig.handle.start_session("user_b".into()).await.unwrap();
    wait_for(&mut rig.state_rx, |s| {
        matches!(s, CallState::Ringing { .. })
    })
    .await;
    rig.handle.counterpart_joined().await.unwrap();
    wait_for(&mut rig.state_rx, |s| {
        matches!(s, CallState::InCall { .. })
    })
    .await;

    rig.handle.end_call().await.unwrap();

    wait_for(&mut rig.state_rx, |s| matches!(s, CallState::Ended)).await;
    assert!(rig.transport.released());

    rig.registry.wait_for_end_call().await;
    assert_eq!(rig.registry.end_calls(), 1);
}

#[tokio::test]
async fn test_non_creator_never_triggers_end_session() {
    let rig = join_call("sess_123", "tok_b").await;
    let mut state_rx = rig.handle.watch_state();

    rig.handle.end_call().await.unwrap();

    wait_for(&mut state_rx, |s| matches!(s, CallState::Ended)).await;
    assert!(rig.transport.released());

    // The creator-only termination call is never issued by a joinee.
    settle().await;
    assert_eq!(rig.registry.end_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_remote_left_ends_call_after_linger() {
    let rig = join_call("sess_123", "tok_b").await;
    let mut state_rx = rig.handle.watch_state();

    rig.transport.emit(TransportEvent::RemoteLeft).await;
    settle().await;

    // The call lingers briefly before ending.
    assert!(matches!(
        rig.handle.state(),
        CallState::InCall { .. }
    ));
    assert!(!rig.transport.released());

    tokio::time::advance(Duration::from_millis(1100)).await;

    wait_for(&mut state_rx, |s| matches!(s, CallState::Ended)).await;
    assert!(rig.transport.released());
}

#[tokio::test(start_paused = true)]
async fn test_session_gone_fault_shows_banner_then_ends() {
    let rig = join_call("sess_123", "tok_b").await;
    let mut state_rx = rig.handle.watch_state();

    rig.transport
        .emit(TransportEvent::Fault {
            message: "the room was deleted".into(),
        })
        .await;

    // The fault is visible on the snapshot during the linger.
    let state = wait_for(&mut state_rx, |s| {
        matches!(s, CallState::InCall { room_fault: Some(_), .. })
    })
    .await;
    assert!(matches!(
        state,
        CallState::InCall { room_fault: Some(message), .. }
            if message == "The session has been ended"
    ));

    tokio::time::advance(Duration::from_millis(2100)).await;

    wait_for(&mut state_rx, |s| matches!(s, CallState::Ended)).await;
    assert!(rig.transport.released());
}

#[tokio::test]
async fn test_generic_transport_fault_is_terminal_error() {
    let rig = join_call("sess_123", "tok_b").await;
    let mut state_rx = rig.handle.watch_state();

    rig.transport
        .emit(TransportEvent::Fault {
            message: "ice negotiation failed".into(),
        })
        .await;

    let state = wait_for(&mut state_rx, |s| matches!(s, CallState::Error { .. })).await;
    assert!(matches!(
        state,
        CallState::Error {
            kind: ErrorKind::Transport,
            message,
            ..
        } if message == "ice negotiation failed"
    ));
    // The transport is released before the terminal state is published.
    assert!(rig.transport.released());
}

#[tokio::test]
async fn test_local_left_event_ends_call() {
    let rig = join_call("sess_123", "tok_b").await;
    let mut state_rx = rig.handle.watch_state();

    rig.transport.emit(TransportEvent::LocalLeft).await;

    wait_for(&mut state_rx, |s| matches!(s, CallState::Ended)).await;
    assert!(rig.transport.released());
    assert_eq!(rig.registry.end_calls(), 0);
}

#[tokio::test]
async fn test_cancellation_releases_transport() {
    let rig = join_call("sess_123", "tok_b").await;

    rig.handle.cancel();
    rig.task.await.unwrap();

    assert!(rig.transport.released());
}

// ============================================================================
// In-call behavior
// ============================================================================

#[tokio::test]
async fn test_camera_fault_keeps_call_alive_with_banner() {
    let rig = join_call("sess_123", "tok_b").await;
    let mut state_rx = rig.handle.watch_state();

    rig.transport
        .emit(TransportEvent::CameraFault {
            message: "device busy".into(),
        })
        .await;

    let state = wait_for(&mut state_rx, |s| {
        matches!(s, CallState::InCall { camera_fault: Some(_), .. })
    })
    .await;
    assert!(matches!(
        state,
        CallState::InCall { camera_fault: Some(message), .. }
            if message == "Camera access error. Please check your permissions."
    ));

    // The call is still alive and can be ended normally.
    assert!(!rig.transport.released());
    rig.handle.end_call().await.unwrap();
    wait_for(&mut state_rx, |s| matches!(s, CallState::Ended)).await;
}

#[tokio::test]
async fn test_camera_toggle_forwards_to_transport() {
    let rig = join_call("sess_123", "tok_b").await;
    let mut state_rx = rig.handle.watch_state();

    rig.handle.set_camera_enabled(false).await.unwrap();

    let state = wait_for(&mut state_rx, |s| {
        matches!(
            s,
            CallState::InCall {
                camera_enabled: false,
                ..
            }
        )
    })
    .await;
    assert!(matches!(state, CallState::InCall { .. }));
    assert_eq!(rig.transport.camera_calls(), vec![false]);
}

#[tokio::test]
async fn test_transport_connect_failure_maps_permission_message() {
    let registry = MockRegistry::builder()
        .join_response(Ok(fixtures::joined_session("sess_123", 60, "tok_b")))
        .build();
    let transport = MockTransport::failing(TransportError::Connect(
        "camera permission denied by user".into(),
    ));
    let navigation = InMemoryNavigation::with_session(SessionId::from("sess_123"));
    let mut rig = spawn_rig(registry, transport, navigation);

    let state = wait_for(&mut rig.state_rx, |s| matches!(s, CallState::Error { .. })).await;
    assert_eq!(
        state,
        CallState::Error {
            kind: ErrorKind::Transport,
            message: "Camera permission denied. Please enable camera access.".into(),
            can_retry: true,
        }
    );
}
