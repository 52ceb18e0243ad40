//! WebSocket adapter.
//!
//! Responsibilities:
//! - Upgrade HTTP -> WS (refused while draining)
//! - Writer task: drains the per-session outbound queue into the socket sink
//! - Reader loop: feeds socket events into the `ConnectionHandler`
//! - Lifecycle: ping + idle timeout + server shutdown
//!
//! The protocol itself lives in `wsack_core::session`; nothing here inspects
//! envelope contents.

use std::net::SocketAddr;

use async_trait::async_trait;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::Instrument;

use wsack_core::error::{Result, WsAckError};
use wsack_core::session::{
    ConnectionHandler, ConnectionId, EventLogger, Transport, TracingLogger,
};

use crate::app_state::AppState;
use crate::transport::codec::{decode, Inbound};

/// Outbound queue depth per session.
const OUTBOUND_QUEUE: usize = 1024;

// --------------------
// Transport adapter
// --------------------
/// `Transport` backed by the session's outbound queue.
pub struct ChannelTransport {
    tx: mpsc::Sender<Message>,
    app: AppState,
}

impl ChannelTransport {
    pub fn new(tx: mpsc::Sender<Message>, app: AppState) -> Self {
        Self { tx, app }
    }

    async fn push(&mut self, msg: Message) -> Result<()> {
        self.tx.send(msg).await.map_err(|_| {
            self.app.metrics().send_failures.inc(&[]);
            WsAckError::SendFailure("socket writer closed".into())
        })
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send(&mut self, frame: String) -> Result<()> {
        self.push(Message::Text(frame)).await
    }

    async fn close(&mut self) -> Result<()> {
        self.push(Message::Close(None)).await
    }
}

// --------------------
// Entry
// --------------------
pub async fn ws_upgrade(
    State(app): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> Response {
    if app.is_draining() {
        app.metrics().ws_upgrade_rejections.inc(&[("reason", "draining")]);
        return (StatusCode::SERVICE_UNAVAILABLE, "draining").into_response();
    }
    app.metrics().ws_upgrades.inc(&[]);

    let max = app.cfg().gateway.max_frame_bytes;
    ws.max_message_size(max)
        .max_frame_size(max)
        .on_failed_upgrade(move |e| {
            tracing::warn!(%peer, error = %e, "websocket upgrade failed");
        })
        .on_upgrade(move |socket| {
            let conn_id = app.next_connection_id();
            let span = tracing::info_span!("ws_session", %conn_id, %peer);
            run_session(app, conn_id, socket).instrument(span)
        })
}

// --------------------
// Writer task
// --------------------
async fn write_loop(mut ws_tx: SplitSink<WebSocket, Message>, mut out_rx: mpsc::Receiver<Message>) {
    while let Some(msg) = out_rx.recv().await {
        let closing = matches!(msg, Message::Close(_));
        if let Err(e) = ws_tx.send(msg).await {
            tracing::debug!(error = %e, "socket write failed");
            break;
        }
        if closing {
            break;
        }
    }
    let _ = ws_tx.close().await;
}

// --------------------
// Core session loop
// --------------------
/// Why a session loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    PeerClosed,
    Fault,
    IdleTimeout,
    Shutdown,
}

async fn run_session(app: AppState, conn_id: ConnectionId, socket: WebSocket) {
    let metrics = app.metrics();
    metrics.ws_active_sessions.inc(&[]);

    let (out_tx, out_rx) = mpsc::channel::<Message>(OUTBOUND_QUEUE);
    let (ws_tx, ws_rx) = socket.split();
    let writer = tokio::spawn(write_loop(ws_tx, out_rx).in_current_span());

    let transport = ChannelTransport::new(out_tx.clone(), app.clone());
    let handler = ConnectionHandler::new(conn_id, transport, TracingLogger);
    drive_session(&app, handler, ws_rx, out_tx).await;

    // All senders are gone now; the writer drains and exits.
    let _ = writer.await;

    metrics.ws_active_sessions.dec(&[]);
}

/// Feed socket events into `handler` until the connection ends.
///
/// Takes ownership of the handler and the outbound sender so both are
/// dropped on return.
pub async fn drive_session<S, T, L>(
    app: &AppState,
    mut handler: ConnectionHandler<T, L>,
    mut inbound: S,
    out_tx: mpsc::Sender<Message>,
) -> SessionEnd
where
    S: Stream<Item = std::result::Result<Message, axum::Error>> + Unpin,
    T: Transport,
    L: EventLogger,
{
    let metrics = app.metrics();
    let mut shutdown = app.shutdown_rx();
    handler.on_open().await;

    // ---- timers
    let gw = &app.cfg().gateway;
    let ping_every = Duration::from_millis(gw.ping_interval_ms);
    let idle_timeout = Duration::from_millis(gw.idle_timeout_ms);

    let mut ping_tick = interval_at(Instant::now() + ping_every, ping_every);
    ping_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_activity = Instant::now();

    let end = loop {
        tokio::select! {
            incoming = inbound.next() => {
                let msg = match incoming {
                    Some(Ok(msg)) => msg,
                    Some(Err(e)) => {
                        metrics.connection_errors.inc(&[]);
                        handler.on_error(&WsAckError::ConnectionFault(e.to_string()));
                        break SessionEnd::Fault;
                    }
                    None => {
                        handler.on_close();
                        break SessionEnd::PeerClosed;
                    }
                };
                last_activity = Instant::now();

                match decode(msg) {
                    Inbound::Frame(raw) => {
                        let outcome = handler.on_frame(&raw).await;
                        metrics.frames.inc(&[("outcome", outcome.as_str())]);
                    }
                    Inbound::Heartbeat => {}
                    Inbound::Close { code } => {
                        tracing::debug!(?code, "close frame received");
                        handler.on_close();
                        break SessionEnd::PeerClosed;
                    }
                }
            }

            // ping
            _ = ping_tick.tick() => {
                let _ = out_tx.send(Message::Ping(Vec::new())).await;
            }

            // idle timeout
            _ = tokio::time::sleep_until(last_activity + idle_timeout) => {
                tracing::info!(idle_ms = gw.idle_timeout_ms, "idle timeout, closing");
                metrics.idle_timeouts.inc(&[]);
                handler.close().await;
                break SessionEnd::IdleTimeout;
            }

            // server shutdown
            _ = async { let _ = shutdown.wait_for(|stop| *stop).await; } => {
                handler.close().await;
                break SessionEnd::Shutdown;
            }
        }
    };

    tracing::debug!(conn_id = %handler.id(), ?end, "session ended");
    end
}
