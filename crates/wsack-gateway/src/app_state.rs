//! Shared application state for the wsack gateway.
//!
//! `AppState` is the server object: built once in `main` from a validated
//! config and handed to the router. Cloning is cheap (one `Arc`), and every
//! connection gets its own id from the counter held here. Shutdown is
//! broadcast to live sessions through a `watch` channel so each one can run
//! its server-initiated close.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::Duration;

use wsack_core::error::Result;
use wsack_core::session::log::event_ctx;
use wsack_core::session::{ConnectionId, EventLogger, TracingLogger};

use crate::config::GatewayConfig;
use crate::obs::GatewayMetrics;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    next_conn: AtomicU64,
    metrics: GatewayMetrics,
    shutdown: watch::Sender<bool>,
}

impl AppState {
    /// Build application state.
    /// Returns Result so main can handle errors gracefully (no panic).
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        cfg.validate()?;

        let mut ctx = event_ctx("server_init");
        ctx.insert("ws_path".into(), cfg.gateway.ws_path.clone().into());
        TracingLogger.info(&ctx, "WebSocket server initialized");

        let (shutdown, _) = watch::channel(false);
        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                next_conn: AtomicU64::new(1),
                metrics: GatewayMetrics::default(),
                shutdown,
            }),
        })
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn next_connection_id(&self) -> ConnectionId {
        ConnectionId(self.inner.next_conn.fetch_add(1, Ordering::Relaxed))
    }

    pub fn metrics(&self) -> &GatewayMetrics {
        &self.inner.metrics
    }

    pub fn is_draining(&self) -> bool {
        self.inner.metrics.is_draining()
    }

    /// Stop accepting new sockets; `/readyz` reports 503 from here on.
    pub fn set_draining(&self) {
        self.inner.metrics.set_draining();
    }

    /// Drain, then ask every live session to close.
    pub fn begin_shutdown(&self) {
        self.set_draining();
        self.inner.shutdown.send_replace(true);
    }

    /// Shutdown flag as seen by one session; `true` once shutdown has begun.
    pub fn shutdown_rx(&self) -> watch::Receiver<bool> {
        self.inner.shutdown.subscribe()
    }

    pub fn active_sessions(&self) -> i64 {
        self.inner.metrics.ws_active_sessions.get(&[])
    }

    /// Wait until no session is active. Returns false if `grace` elapsed first.
    pub async fn wait_sessions_closed(&self, grace: Duration) -> bool {
        let drained = async {
            while self.active_sessions() > 0 {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        };
        tokio::time::timeout(grace, drained).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;

    #[test]
    fn connection_ids_are_unique() {
        let state = AppState::new(config::load_from_str("version: 1").unwrap()).unwrap();
        let a = state.next_connection_id();
        let b = state.clone().next_connection_id();
        assert_ne!(a, b);
    }

    #[test]
    fn logs_server_init() {
        use std::io::Write;
        use std::sync::Mutex;

        #[derive(Clone, Default)]
        struct Buf(Arc<Mutex<Vec<u8>>>);

        impl Write for Buf {
            fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(data);
                Ok(data.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let buf = Buf::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            AppState::new(config::load_from_str("version: 1").unwrap()).unwrap();
        });

        let out = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert!(out.contains("WebSocket server initialized"));
        assert!(out.contains("event=\"server_init\""));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_reaches_existing_receivers() {
        let state = AppState::new(config::load_from_str("version: 1").unwrap()).unwrap();
        let mut rx = state.shutdown_rx();
        assert!(!*rx.borrow());

        state.begin_shutdown();
        assert!(state.is_draining());
        rx.wait_for(|stop| *stop).await.unwrap();
        assert!(*state.shutdown_rx().borrow());
    }

    #[tokio::test(start_paused = true)]
    async fn wait_sessions_closed_times_out_while_busy() {
        let state = AppState::new(config::load_from_str("version: 1").unwrap()).unwrap();
        state.metrics().ws_active_sessions.inc(&[]);
        assert!(!state.wait_sessions_closed(Duration::from_secs(1)).await);

        state.metrics().ws_active_sessions.dec(&[]);
        assert!(state.wait_sessions_closed(Duration::from_secs(1)).await);
    }

    #[test]
    fn draining_is_shared_across_clones() {
        let state = AppState::new(config::load_from_str("version: 1").unwrap()).unwrap();
        let other = state.clone();
        state.set_draining();
        assert!(other.is_draining());
    }
}
