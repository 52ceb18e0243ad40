//! Server-to-client frames.
//!
//! The outbound surface is closed: an acknowledgement echoing the validated
//! envelope, one of two fixed error reasons, or the welcome notice sent on
//! open. Builders go through `serde_json::json!` so the output is always valid
//! JSON regardless of what the client put in `data`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;

use crate::protocol::envelope::{Envelope, ValidationError};

pub const TYPE_ACKNOWLEDGEMENT: &str = "acknowledgement";
pub const TYPE_ERROR: &str = "error";
pub const TYPE_CONNECTION: &str = "connection";

pub const WELCOME_TEXT: &str = "Connected to WebSocket server";

/// Fixed human-readable error reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorReason {
    /// Valid JSON, wrong shape.
    InvalidFormat,
    /// Not JSON at all.
    CouldNotProcess,
}

impl ErrorReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorReason::InvalidFormat => "Invalid message format",
            ErrorReason::CouldNotProcess => "Could not process message",
        }
    }
}

impl From<&ValidationError> for ErrorReason {
    fn from(err: &ValidationError) -> Self {
        match err {
            ValidationError::Unparseable(_) => ErrorReason::CouldNotProcess,
            ValidationError::SchemaMismatch(_) => ErrorReason::InvalidFormat,
        }
    }
}

/// One outbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Acknowledgement(Envelope),
    Error(ErrorReason),
    Connection { timestamp: DateTime<Utc> },
}

impl Outbound {
    /// Welcome notice stamped with the current server time.
    pub fn welcome() -> Self {
        Outbound::Connection { timestamp: Utc::now() }
    }

    /// Frame `type` discriminator.
    pub fn kind(&self) -> &'static str {
        match self {
            Outbound::Acknowledgement(_) => TYPE_ACKNOWLEDGEMENT,
            Outbound::Error(_) => TYPE_ERROR,
            Outbound::Connection { .. } => TYPE_CONNECTION,
        }
    }

    /// Serialize to the text frame sent on the wire.
    pub fn to_json(&self) -> String {
        match self {
            Outbound::Acknowledgement(env) => json!({
                "type": TYPE_ACKNOWLEDGEMENT,
                "data": env,
            }),
            Outbound::Error(reason) => json!({
                "type": TYPE_ERROR,
                "data": reason.as_str(),
            }),
            Outbound::Connection { timestamp } => json!({
                "type": TYPE_CONNECTION,
                "data": WELCOME_TEXT,
                "timestamp": timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            }),
        }
        .to_string()
    }
}
