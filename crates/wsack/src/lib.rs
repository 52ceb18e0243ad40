//! Top-level facade crate for wsack.
//!
//! Re-exports core types and the gateway library so users can depend on a single crate.

pub mod core {
    pub use wsack_core::*;
}

pub mod gateway {
    pub use wsack_gateway::*;
}
