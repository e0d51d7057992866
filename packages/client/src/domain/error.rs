//! Domain layer error definitions.

use std::time::Duration;

use thiserror::Error;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// UserId must be a positive integer
    #[error("UserId must be positive (got {0})")]
    UserIdNotPositive(i64),

    /// MessageContent validation error
    #[error("MessageContent cannot be empty")]
    MessageContentEmpty,

    /// MessageContent too long error
    #[error("MessageContent cannot exceed {max} characters (got {actual})")]
    MessageContentTooLong { max: usize, actual: usize },

    /// Credential validation error
    #[error("Credential cannot be empty")]
    CredentialEmpty,
}

/// Errors raised by a transport while opening or carrying a channel.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("failed to connect: {0}")]
    Connect(String),

    #[error("connection attempt timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection closed by peer")]
    ClosedByPeer,

    #[error("transport I/O error: {0}")]
    Io(String),
}

/// Errors produced while decoding an incoming frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The frame is not valid JSON
    #[error("frame is not valid JSON: {reason}")]
    Malformed { reason: String },

    /// The frame names a known envelope type but its fields do not match
    #[error("invalid `{kind}` envelope: {reason}")]
    InvalidEnvelope { kind: String, reason: String },
}

/// Errors returned by the HTTP directory collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("server responded with {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("unexpected response body: {0}")]
    InvalidResponse(String),
}
