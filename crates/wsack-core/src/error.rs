//! Shared error type across wsack crates.

use thiserror::Error;

/// Shared result type.
pub type Result<T> = std::result::Result<T, WsAckError>;

/// Unified error type used by core and gateway.
///
/// Envelope validation failures are not part of this enum; they are a normal
/// outcome of [`crate::protocol::envelope::validate`] and are answered on the
/// wire instead of surfacing as errors.
#[derive(Debug, Error)]
pub enum WsAckError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    /// Transport-level fault on a live connection (broken pipe, protocol error).
    #[error("connection fault: {0}")]
    ConnectionFault(String),
    /// Write attempted on a socket that is already gone.
    #[error("send failure: {0}")]
    SendFailure(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl WsAckError {
    /// Stable machine-readable code, used in log fields and HTTP bodies.
    pub fn code(&self) -> &'static str {
        match self {
            WsAckError::BadRequest(_) => "BAD_REQUEST",
            WsAckError::UnsupportedVersion => "UNSUPPORTED_VERSION",
            WsAckError::ConnectionFault(_) => "CONNECTION_FAULT",
            WsAckError::SendFailure(_) => "SEND_FAILURE",
            WsAckError::Internal(_) => "INTERNAL",
        }
    }
}
