//! Maps axum WebSocket messages onto connection handler signals.
//!
//! - Text and Binary frames both carry an envelope payload
//! - Ping/Pong only refresh liveness
//! - Close ends the session

use axum::extract::ws::Message;

#[derive(Debug, PartialEq, Eq)]
pub enum Inbound {
    /// Application payload (UTF-8 text or raw binary).
    Frame(Vec<u8>),
    Heartbeat,
    Close { code: Option<u16> },
}

pub fn decode(msg: Message) -> Inbound {
    match msg {
        Message::Text(s) => Inbound::Frame(s.into_bytes()),
        Message::Binary(b) => Inbound::Frame(b),
        Message::Ping(_) | Message::Pong(_) => Inbound::Heartbeat,
        Message::Close(frame) => Inbound::Close {
            code: frame.map(|f| f.code),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::ws::CloseFrame;

    #[test]
    fn text_and_binary_are_frames() {
        assert_eq!(
            decode(Message::Text("{}".into())),
            Inbound::Frame(b"{}".to_vec())
        );
        assert_eq!(
            decode(Message::Binary(vec![1, 2])),
            Inbound::Frame(vec![1, 2])
        );
    }

    #[test]
    fn control_frames() {
        assert_eq!(decode(Message::Ping(vec![9])), Inbound::Heartbeat);
        assert_eq!(decode(Message::Close(None)), Inbound::Close { code: None });
        assert_eq!(
            decode(Message::Close(Some(CloseFrame { code: 1000, reason: "bye".into() }))),
            Inbound::Close { code: Some(1000) }
        );
    }
}
