use std::fmt;

use serde_json::Value;

use crate::error::{Result, WsAckError};
use crate::protocol::envelope::{validate, ValidationError};
use crate::protocol::outbound::{ErrorReason, Outbound};
use crate::session::log::{
    event_ctx, EventLogger, EV_CONNECTION, EV_CONNECTION_ERROR, EV_DISCONNECTION,
    EV_FRAME_IGNORED, EV_MESSAGE, EV_MESSAGE_ERROR, EV_MESSAGE_INVALID, EV_SEND_FAILED,
};
use crate::session::transport::Transport;

/// Opaque per-socket identity assigned by the accepting server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Lifecycle state of one connection. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    Connecting,
    Open,
    Closed,
}

impl fmt::Display for ConnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnState::Connecting => "connecting",
            ConnState::Open => "open",
            ConnState::Closed => "closed",
        })
    }
}

/// What happened to one inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Valid envelope, acknowledgement sent.
    Acknowledged,
    /// JSON with the wrong shape.
    Invalid,
    /// Not JSON.
    Unprocessable,
    /// Arrived while the connection was not open.
    Ignored,
}

impl FrameOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            FrameOutcome::Acknowledged => "acknowledged",
            FrameOutcome::Invalid => "invalid",
            FrameOutcome::Unprocessable => "unprocessable",
            FrameOutcome::Ignored => "ignored",
        }
    }
}

/// Drives the envelope protocol for exactly one socket.
///
/// The handler exclusively owns its transport until the connection reaches
/// `Closed`, at which point the transport is dropped. Every inbound frame
/// yields at most one outbound frame and exactly one log event, in arrival
/// order.
pub struct ConnectionHandler<T, L> {
    id: ConnectionId,
    state: ConnState,
    transport: Option<T>,
    log: L,
}

impl<T: Transport, L: EventLogger> ConnectionHandler<T, L> {
    pub fn new(id: ConnectionId, transport: T, log: L) -> Self {
        Self {
            id,
            state: ConnState::Connecting,
            transport: Some(transport),
            log,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> ConnState {
        self.state
    }

    /// Transport confirmed the connection: `Connecting -> Open`, then greet.
    pub async fn on_open(&mut self) {
        if self.state != ConnState::Connecting {
            return;
        }
        self.state = ConnState::Open;
        self.log
            .info(&event_ctx(EV_CONNECTION), "WebSocket connection established");
        let _ = self.send(&Outbound::welcome()).await;
    }

    /// Validate one raw payload and answer it.
    pub async fn on_frame(&mut self, raw: &[u8]) -> FrameOutcome {
        if self.state != ConnState::Open {
            let mut ctx = event_ctx(EV_FRAME_IGNORED);
            ctx.insert("state".into(), Value::from(self.state.to_string()));
            self.log.debug(&ctx, "Frame received outside open state");
            return FrameOutcome::Ignored;
        }

        match validate(raw) {
            Ok(env) => {
                let mut ctx = event_ctx(EV_MESSAGE);
                ctx.insert(
                    "message".into(),
                    serde_json::to_value(&env).unwrap_or_default(),
                );
                self.log.info(&ctx, "Message received from client");
                let _ = self.send(&Outbound::Acknowledgement(env)).await;
                FrameOutcome::Acknowledged
            }
            Err(err) => {
                let outcome = match &err {
                    ValidationError::Unparseable(reason) => {
                        let mut ctx = event_ctx(EV_MESSAGE_ERROR);
                        ctx.insert("error".into(), Value::from(reason.as_str()));
                        self.log.error(&ctx, "Error processing client message");
                        FrameOutcome::Unprocessable
                    }
                    ValidationError::SchemaMismatch(issues) => {
                        let mut ctx = event_ctx(EV_MESSAGE_INVALID);
                        ctx.insert(
                            "errors".into(),
                            serde_json::to_value(issues).unwrap_or_default(),
                        );
                        self.log.warn(&ctx, "Invalid message format received");
                        FrameOutcome::Invalid
                    }
                };
                let _ = self.send(&Outbound::Error(ErrorReason::from(&err))).await;
                outcome
            }
        }
    }

    /// Peer closed (or the stream ended). Idempotent.
    pub fn on_close(&mut self) {
        if self.release() {
            self.log
                .info(&event_ctx(EV_DISCONNECTION), "WebSocket connection closed");
        }
    }

    /// Transport fault. Ends the connection as if closed. Idempotent.
    pub fn on_error(&mut self, error: &WsAckError) {
        if self.release() {
            let mut ctx = event_ctx(EV_CONNECTION_ERROR);
            ctx.insert("error".into(), Value::from(error.to_string()));
            ctx.insert("code".into(), Value::from(error.code()));
            self.log.error(&ctx, "WebSocket connection error");
        }
    }

    /// Server-initiated close (idle timeout, shutdown).
    pub async fn close(&mut self) {
        if let Some(transport) = self.transport.as_mut() {
            if let Err(e) = transport.close().await {
                let mut ctx = event_ctx(EV_SEND_FAILED);
                ctx.insert("error".into(), Value::from(e.to_string()));
                self.log.debug(&ctx, "Close frame could not be delivered");
            }
        }
        self.on_close();
    }

    /// Send one frame. After close this is a local error only; the remote is
    /// never contacted.
    pub async fn send(&mut self, out: &Outbound) -> Result<()> {
        let res = match (self.state, self.transport.as_mut()) {
            (ConnState::Open, Some(transport)) => transport.send(out.to_json()).await,
            (state, _) => Err(WsAckError::SendFailure(format!("connection is {state}"))),
        };

        if let Err(e) = &res {
            let mut ctx = event_ctx(EV_SEND_FAILED);
            ctx.insert("frame".into(), Value::from(out.kind()));
            ctx.insert("error".into(), Value::from(e.to_string()));
            self.log.error(&ctx, "Failed to send frame");
        }
        res
    }

    /// Move to `Closed` and drop the transport. Returns whether this call
    /// performed the transition out of `Open`.
    fn release(&mut self) -> bool {
        let was = self.state;
        self.state = ConnState::Closed;
        self.transport = None;
        was == ConnState::Open
    }
}
