//! In-memory transport and recording logger shared by handler tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use wsack_core::error::{Result, WsAckError};
use wsack_core::session::{EventLogger, LogContext, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
    Debug,
}

#[derive(Debug, Clone)]
pub struct Entry {
    pub level: Level,
    pub ctx: LogContext,
    pub message: String,
}

impl Entry {
    pub fn event(&self) -> &str {
        self.ctx.get("event").and_then(Value::as_str).unwrap_or("")
    }
}

#[derive(Default)]
pub struct RecordingLogger {
    entries: Mutex<Vec<Entry>>,
}

impl RecordingLogger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.entries.lock().unwrap().clone()
    }

    /// Event names, excluding debug-level noise.
    pub fn events(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|e| e.level != Level::Debug)
            .map(|e| e.event().to_string())
            .collect()
    }

    fn push(&self, level: Level, ctx: &LogContext, message: &str) {
        self.entries.lock().unwrap().push(Entry {
            level,
            ctx: ctx.clone(),
            message: message.to_string(),
        });
    }
}

impl EventLogger for RecordingLogger {
    fn info(&self, ctx: &LogContext, message: &str) {
        self.push(Level::Info, ctx, message)
    }
    fn warn(&self, ctx: &LogContext, message: &str) {
        self.push(Level::Warn, ctx, message)
    }
    fn error(&self, ctx: &LogContext, message: &str) {
        self.push(Level::Error, ctx, message)
    }
    fn debug(&self, ctx: &LogContext, message: &str) {
        self.push(Level::Debug, ctx, message)
    }
}

/// Shared view of what a `MemoryTransport` received.
#[derive(Default)]
pub struct Wire {
    pub frames: Mutex<Vec<String>>,
    pub closed: Mutex<bool>,
}

impl Wire {
    pub fn frames(&self) -> Vec<String> {
        self.frames.lock().unwrap().clone()
    }

    /// Frames parsed as JSON, welcome notice skipped.
    pub fn replies(&self) -> Vec<Value> {
        self.frames()
            .iter()
            .map(|f| serde_json::from_str::<Value>(f).unwrap())
            .filter(|v| v["type"] != "connection")
            .collect()
    }
}

pub struct MemoryTransport {
    wire: Arc<Wire>,
    broken: bool,
}

impl MemoryTransport {
    pub fn new() -> (Self, Arc<Wire>) {
        let wire = Arc::new(Wire::default());
        (Self { wire: Arc::clone(&wire), broken: false }, wire)
    }

    /// A transport whose peer has already vanished.
    pub fn broken() -> (Self, Arc<Wire>) {
        let (mut t, wire) = Self::new();
        t.broken = true;
        (t, wire)
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&mut self, frame: String) -> Result<()> {
        if self.broken {
            return Err(WsAckError::SendFailure("broken pipe".into()));
        }
        self.wire.frames.lock().unwrap().push(frame);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        *self.wire.closed.lock().unwrap() = true;
        Ok(())
    }
}
