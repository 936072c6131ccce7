//! Payloads delivered to observers.
//!
//! Frames on the wire are UTF-8 text carrying JSON. Inbound traffic is
//! decoded into an explicit tagged union so consumers pattern-match instead
//! of duck-typing; text that fails to parse is still delivered, verbatim.

use serde_json::Value;

/// One decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Frame parsed as structured JSON.
    Structured(Value),
    /// Frame that was not valid JSON, delivered as received.
    Raw(String),
}

impl InboundMessage {
    /// Decode one frame. Each frame is decoded independently and exactly
    /// once; parse failure falls back to the raw text rather than dropping
    /// the frame.
    pub fn decode(text: &str) -> Self {
        match serde_json::from_str(text) {
            Ok(value) => Self::Structured(value),
            Err(_) => Self::Raw(text.to_string()),
        }
    }
}

/// What a registered observer receives.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Ordinary inbound traffic.
    Message(InboundMessage),
    /// Synthesized by the session itself when the transport closes from the
    /// far side; carries a snapshot of the last payload seen before the
    /// close so observers can tell a room teardown from ordinary traffic.
    SocketClosed {
        last_message: Option<InboundMessage>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_structured_frames() {
        let message = InboundMessage::decode(r#"{"type":"ping"}"#);
        assert_eq!(message, InboundMessage::Structured(json!({"type": "ping"})));
    }

    #[test]
    fn falls_back_to_raw_text() {
        let message = InboundMessage::decode("not-json");
        assert_eq!(message, InboundMessage::Raw("not-json".to_string()));
    }
}
