//! wsack core: transport-agnostic envelope protocol and connection lifecycle.
//!
//! This crate defines the wire-level contract (envelope validation and the
//! fixed outbound responses) and the per-connection state machine that drives
//! it. Transports and loggers plug in through the [`session::Transport`] and
//! [`session::EventLogger`] traits, so the protocol is written once and reused
//! by every adapter.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Malformed input is answered on the wire; transport faults surface as
//! `WsAckError` so one bad connection never takes the process down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;
pub mod session;

/// Shared result type.
pub use error::{Result, WsAckError};
