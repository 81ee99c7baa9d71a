//! Perihelion Session Client
//!
//! Headless driver for the session lifecycle controller. Starts or joins one
//! 1:1 video session against the registry backend and follows the call state
//! until it terminates.
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment
//! 2. Build the HTTP backend (registry + identity)
//! 3. Seed the navigation context from `--join`, if given
//! 4. Spawn the controller
//! 5. Follow the state watch, logging transitions (and the invite link while
//!    ringing), until `ended`/`error` or a shutdown signal
//!
//! Ctrl+C / SIGTERM cancel the controller, which releases any active
//! transport session before exiting.

#![warn(clippy::pedantic)]
#![allow(clippy::too_many_lines)] // main.rs orchestrates startup, naturally longer

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use session_client::config::Config;
use session_client::controller::{ControllerConfig, ControllerMetrics, SessionController};
use session_client::invite::{format_remaining, invite_url, parse_session_ref};
use session_client::navigation::InMemoryNavigation;
use session_client::registry::HttpBackend;
use session_client::state::CallState;
use session_client::transport::HeadlessTransport;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Bound on controller shutdown after cancellation.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Parser)]
#[command(name = "session-client", about = "Perihelion 1:1 video session client")]
struct Cli {
    /// Start a session and invite this user.
    #[arg(long, value_name = "USER_ID", conflicts_with = "join")]
    invite: Option<String>,

    /// Join a session by identifier or invite URL.
    #[arg(long, value_name = "SESSION_REF")]
    join: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "session_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;

    info!(
        client_id = %config.client_id,
        registry_base_url = %config.registry_base_url,
        app_origin = %config.app_origin,
        session_duration_minutes = config.session_duration_minutes,
        identity_requirement = config.identity_requirement.as_str(),
        trust_requirement = config.trust_requirement.as_str(),
        "Configuration loaded successfully"
    );

    // Build the HTTP backend (registry + identity lookup)
    let backend = Arc::new(
        HttpBackend::new(
            config.registry_base_url.clone(),
            config.registry_bearer_token.clone(),
            Duration::from_secs(config.http_timeout_seconds),
        )
        .context("Failed to build registry backend")?,
    );

    // Seed the navigation context from --join, if given
    let navigation = Arc::new(match &cli.join {
        Some(raw) => {
            let session_id = parse_session_ref(raw)
                .with_context(|| format!("Invalid session reference: {raw}"))?;
            InMemoryNavigation::with_session(session_id)
        }
        None => InMemoryNavigation::new(),
    });

    let transport = Arc::new(HeadlessTransport::new());
    let metrics = ControllerMetrics::new();
    let controller_config = ControllerConfig {
        identity_requirement: config.identity_requirement,
        trust_requirement: config.trust_requirement,
        session_duration_minutes: config.session_duration_minutes,
        ..ControllerConfig::default()
    };

    let (handle, task_handle) = SessionController::spawn(
        Arc::clone(&backend),
        Arc::clone(&backend),
        transport,
        navigation,
        controller_config,
        Arc::clone(&metrics),
    );

    if let Some(invited_user) = &cli.invite {
        handle.start_session(invited_user.as_str().into()).await?;
    } else if cli.join.is_none() {
        info!("No --invite or --join given; waiting in idle (Ctrl+C to exit)");
    }

    // Follow state transitions until the attempt terminates
    let mut state_rx = handle.watch_state();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    loop {
        let state = state_rx.borrow_and_update().clone();
        if state != CallState::Idle {
            report_state(&config, &state);
        }
        if state.is_terminal() {
            break;
        }

        tokio::select! {
            () = &mut shutdown => {
                info!("Shutdown signal received, cancelling controller");
                break;
            }
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    // Cancel and wait for the controller to release its resources
    handle.cancel();
    if tokio::time::timeout(SHUTDOWN_TIMEOUT, task_handle)
        .await
        .is_err()
    {
        warn!("Controller shutdown timed out");
    }

    let snapshot = metrics.snapshot();
    info!(
        sessions_created = snapshot.sessions_created,
        sessions_joined = snapshot.sessions_joined,
        join_rejections = snapshot.join_rejections,
        calls_completed = snapshot.calls_completed,
        errors = snapshot.errors,
        "Session client exiting"
    );

    Ok(())
}

/// Log a state transition for the operator.
fn report_state(config: &Config, state: &CallState) {
    match state {
        CallState::Idle => info!("Idle"),
        CallState::Creating => info!("Creating session..."),
        CallState::Joining => info!("Joining session..."),
        CallState::Ringing {
            session_id,
            expires_at,
        } => {
            let url = invite_url(&config.app_origin, session_id);
            let remaining = format_remaining(*expires_at, chrono::Utc::now());
            info!(
                session_id = %session_id,
                invite_url = %url,
                time_remaining = %remaining,
                "Waiting for participant - share the invite link"
            );
        }
        CallState::InCall {
            session_id,
            is_creator,
            ..
        } => {
            info!(session_id = %session_id, is_creator, "In call");
        }
        CallState::Ended => info!("Session ended"),
        CallState::Error {
            kind,
            message,
            can_retry,
        } => {
            error!(
                kind = kind.label(),
                can_retry,
                "Session error: {message}"
            );
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
///
/// # Panics
///
/// Panics if signal handlers cannot be installed. This is acceptable because
/// without signal handlers, we cannot shut down cleanly.
async fn shutdown_signal() {
    let ctrl_c = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
