//! wsack gateway binary.
//!
//! - WebSocket endpoint at `gateway.ws_path` (default `/api/socket`)
//! - Every frame validated and answered with an acknowledgement or error
//! - Tracing span per session, heartbeat ping + idle timeout
//! - Ops: /healthz, /readyz, /metrics; graceful shutdown on Ctrl-C / SIGTERM closes live sessions

use std::net::SocketAddr;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wsack_core::error::{Result, WsAckError};
use wsack_gateway::{app_state::AppState, config, router};

const DEFAULT_CONFIG_PATH: &str = "wsack.yaml";
/// How long open sessions get to flush their close frames after shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, code = e.code(), "wsack-gateway failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let cfg = config::load_from_file(&path)?;
    let listen = cfg.gateway.listen_addr()?;

    let state = AppState::new(cfg)?;
    let app = router::build_router(state.clone());

    tracing::info!(%listen, ws_path = %state.cfg().gateway.ws_path, "wsack-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| WsAckError::Internal(format!("failed to bind {listen}: {e}")))?;

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal(state.clone()))
        .await
        .map_err(|e| WsAckError::Internal(format!("server failed: {e}")))?;

    // Upgraded sockets outlive the HTTP server; wait for their close handshakes.
    if !state.wait_sessions_closed(SHUTDOWN_GRACE).await {
        tracing::warn!(
            remaining = state.active_sessions(),
            grace_ms = SHUTDOWN_GRACE.as_millis() as u64,
            "sessions still open after shutdown grace"
        );
    }

    tracing::info!("wsack-gateway stopped");
    Ok(())
}

async fn shutdown_signal(state: AppState) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    state.begin_shutdown();
    tracing::info!("signal received, starting graceful shutdown");
}
