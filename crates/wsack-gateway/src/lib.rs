//! wsack gateway library entry.
//!
//! This crate wires the axum WebSocket transport to the protocol handler in
//! `wsack-core`, and adds config loading, ops endpoints, and metrics. It is
//! consumed by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod obs;
pub mod ops;
pub mod router;
pub mod transport;
