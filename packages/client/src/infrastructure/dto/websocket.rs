//! WebSocket envelope DTOs for the chat channel.
//!
//! Canonical outgoing shapes:
//!
//! ```text
//! {"type":"auth","token":"..."}
//! {"type":"message","to_user_id":2,"content":"hi","message_type":"text"}
//! ```

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::domain::{
    ChatMessage, Credential, DecodeError, Delivery, IncomingEnvelope, MessageKind,
    OutgoingMessage,
};

/// Outgoing frame, tagged by `type`
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutgoingFrame<'a> {
    Auth {
        token: &'a str,
    },
    Message {
        to_user_id: i64,
        content: &'a str,
        message_type: MessageKind,
    },
}

/// `message` payload pushed by the server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageFrame {
    pub id: Option<i64>,
    pub from_user_id: i64,
    pub from_username: Option<String>,
    pub from_display_name: Option<String>,
    pub content: String,
    pub timestamp: String,
}

/// `message_sent` acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageSentFrame {
    pub id: Option<i64>,
    pub timestamp: Option<String>,
}

/// `error` notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorFrame {
    #[serde(default)]
    pub message: String,
}

impl From<MessageFrame> for ChatMessage {
    fn from(frame: MessageFrame) -> Self {
        Self {
            id: frame.id,
            from_user_id: frame.from_user_id,
            from_username: frame.from_username,
            from_display_name: frame.from_display_name,
            content: frame.content,
            timestamp: frame.timestamp,
        }
    }
}

/// Encode the handshake frame.
pub fn encode_auth(credential: &Credential) -> Result<String, serde_json::Error> {
    serde_json::to_string(&OutgoingFrame::Auth {
        token: credential.as_str(),
    })
}

/// Encode a chat message frame.
pub fn encode_message(message: &OutgoingMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(&OutgoingFrame::Message {
        to_user_id: message.target.value(),
        content: message.content.as_str(),
        message_type: message.kind,
    })
}

/// Decode one incoming text frame.
///
/// Invalid JSON and known types with mismatched fields are decode errors;
/// anything else with an unrecognised `type` is passed through as `Unknown`.
pub fn decode_incoming(text: &str) -> Delivery {
    let value: Value = serde_json::from_str(text).map_err(|e| DecodeError::Malformed {
        reason: e.to_string(),
    })?;

    let kind = value.get("type").and_then(Value::as_str).map(str::to_owned);
    match kind.as_deref() {
        Some("auth_success") => Ok(IncomingEnvelope::AuthSuccess),
        Some("chat_deleted") => Ok(IncomingEnvelope::ChatDeleted),
        Some("message") => {
            let frame: MessageFrame = parse_payload("message", value)?;
            Ok(IncomingEnvelope::Message(frame.into()))
        }
        Some("message_sent") => {
            let frame: MessageSentFrame = parse_payload("message_sent", value)?;
            Ok(IncomingEnvelope::MessageSent {
                id: frame.id,
                timestamp: frame.timestamp,
            })
        }
        Some("error") => {
            let frame: ErrorFrame = parse_payload("error", value)?;
            Ok(IncomingEnvelope::Error {
                message: frame.message,
            })
        }
        _ => Ok(IncomingEnvelope::Unknown { kind, raw: value }),
    }
}

fn parse_payload<T: DeserializeOwned>(kind: &str, value: Value) -> Result<T, DecodeError> {
    serde_json::from_value(value).map_err(|e| DecodeError::InvalidEnvelope {
        kind: kind.to_string(),
        reason: e.to_string(),
    })
}
