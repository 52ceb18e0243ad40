//! Transport layer (WebSocket).
//!
//! Exposes the WS upgrade handler, the codec that maps socket messages onto
//! handler signals, and the channel-backed `Transport` adapter.

pub mod codec;
pub mod ws;
