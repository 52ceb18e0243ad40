//! Per-connection session: lifecycle state machine and its collaborator seams.
//!
//! `ConnectionHandler` owns one socket for its whole life. Transports drive
//! it by forwarding their open/message/close/error signals; the handler
//! answers through the `Transport` it owns and reports lifecycle events to an
//! `EventLogger`.

pub mod handler;
pub mod log;
pub mod transport;

pub use handler::{ConnState, ConnectionHandler, ConnectionId, FrameOutcome};
pub use log::{EventLogger, LogContext, TracingLogger};
pub use transport::Transport;
