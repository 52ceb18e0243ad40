//! Lifecycle logging seam.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

/// Structured log context: field name to JSON value.
pub type LogContext = Map<String, Value>;

pub const EV_CONNECTION: &str = "connection";
pub const EV_MESSAGE: &str = "message";
pub const EV_MESSAGE_INVALID: &str = "message_invalid";
pub const EV_MESSAGE_ERROR: &str = "message_error";
pub const EV_DISCONNECTION: &str = "disconnection";
pub const EV_CONNECTION_ERROR: &str = "connection_error";
pub const EV_SEND_FAILED: &str = "send_failed";
pub const EV_FRAME_IGNORED: &str = "frame_ignored";

/// Logger collaborator. Calls are fire-and-forget and never fail.
pub trait EventLogger: Send + Sync {
    fn info(&self, ctx: &LogContext, message: &str);
    fn warn(&self, ctx: &LogContext, message: &str);
    fn error(&self, ctx: &LogContext, message: &str);
    fn debug(&self, ctx: &LogContext, message: &str);
}

impl<L: EventLogger + ?Sized> EventLogger for Arc<L> {
    fn info(&self, ctx: &LogContext, message: &str) {
        (**self).info(ctx, message)
    }
    fn warn(&self, ctx: &LogContext, message: &str) {
        (**self).warn(ctx, message)
    }
    fn error(&self, ctx: &LogContext, message: &str) {
        (**self).error(ctx, message)
    }
    fn debug(&self, ctx: &LogContext, message: &str) {
        (**self).debug(ctx, message)
    }
}

/// Build a context holding only the `event` field.
pub fn event_ctx(event: &str) -> LogContext {
    let mut ctx = LogContext::new();
    ctx.insert("event".into(), Value::from(event));
    ctx
}

/// Default logger: forwards to `tracing`, so span fields (e.g. `conn_id`)
/// set by the adapter are attached automatically.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl EventLogger for TracingLogger {
    fn info(&self, ctx: &LogContext, message: &str) {
        tracing::info!(event = event_of(ctx), ctx = %Fields(ctx), "{message}");
    }
    fn warn(&self, ctx: &LogContext, message: &str) {
        tracing::warn!(event = event_of(ctx), ctx = %Fields(ctx), "{message}");
    }
    fn error(&self, ctx: &LogContext, message: &str) {
        tracing::error!(event = event_of(ctx), ctx = %Fields(ctx), "{message}");
    }
    fn debug(&self, ctx: &LogContext, message: &str) {
        tracing::debug!(event = event_of(ctx), ctx = %Fields(ctx), "{message}");
    }
}

fn event_of(ctx: &LogContext) -> &str {
    ctx.get("event").and_then(Value::as_str).unwrap_or("")
}

/// Renders the context as compact JSON only when the event is enabled.
struct Fields<'a>(&'a LogContext);

impl fmt::Display for Fields<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = serde_json::to_string(self.0).map_err(|_| fmt::Error)?;
        f.write_str(&s)
    }
}
