//! Wire protocol modules.
//!
//! - `envelope`: inbound JSON envelope and its validator.
//! - `outbound`: the fixed set of server-to-client frames.
//!
//! The validator is panic-free and pure: malformed input is reported as a
//! tagged `ValidationError` rather than an error propagated up the stack, so
//! the connection handler can answer it and keep the socket open.

pub mod envelope;
pub mod outbound;

pub use envelope::{validate, Envelope, FieldIssue, IssueCode, ValidationError};
pub use outbound::{ErrorReason, Outbound};
