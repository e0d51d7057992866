//! Envelopes exchanged over the realtime channel.

use serde_json::Value;

use super::{
    error::DecodeError,
    value_object::{MessageContent, MessageKind, UserId},
};

/// A chat message the caller wants to deliver to another user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub target: UserId,
    pub content: MessageContent,
    pub kind: MessageKind,
}

impl OutgoingMessage {
    /// Create a plain text message.
    pub fn text(target: UserId, content: MessageContent) -> Self {
        Self {
            target,
            content,
            kind: MessageKind::Text,
        }
    }
}

/// A chat message as pushed by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Server-assigned message id, when the backend sends one
    pub id: Option<i64>,
    pub from_user_id: i64,
    pub from_username: Option<String>,
    pub from_display_name: Option<String>,
    pub content: String,
    /// ISO-8601 timestamp exactly as received
    pub timestamp: String,
}

impl ChatMessage {
    /// Whether this message was sent by `user`.
    pub fn is_from(&self, user: UserId) -> bool {
        self.from_user_id == user.value()
    }

    /// Best available name for the sender.
    pub fn sender_name(&self) -> String {
        self.from_display_name
            .clone()
            .or_else(|| self.from_username.clone())
            .unwrap_or_else(|| format!("user #{}", self.from_user_id))
    }
}

/// A decoded incoming envelope, discriminated by the wire `type` field.
#[derive(Debug, Clone, PartialEq)]
pub enum IncomingEnvelope {
    AuthSuccess,
    Message(ChatMessage),
    MessageSent {
        id: Option<i64>,
        timestamp: Option<String>,
    },
    Error {
        message: String,
    },
    ChatDeleted,
    /// Valid JSON with an unrecognised (or missing) `type`
    Unknown {
        kind: Option<String>,
        raw: Value,
    },
}

impl IncomingEnvelope {
    /// The wire discriminant of this envelope.
    pub fn kind(&self) -> &str {
        match self {
            IncomingEnvelope::AuthSuccess => "auth_success",
            IncomingEnvelope::Message(_) => "message",
            IncomingEnvelope::MessageSent { .. } => "message_sent",
            IncomingEnvelope::Error { .. } => "error",
            IncomingEnvelope::ChatDeleted => "chat_deleted",
            IncomingEnvelope::Unknown { kind, .. } => kind.as_deref().unwrap_or("unknown"),
        }
    }
}

/// What the envelope handler receives for every incoming frame.
pub type Delivery = Result<IncomingEnvelope, DecodeError>;
