//! Channel error taxonomy and side-channel notifications.

use std::time::Duration;

use thiserror::Error;

use crate::domain::{DecodeError, TransportError};

/// Errors surfaced by the realtime channel.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// No `access_token` credential at connect time
    #[error("no access_token credential available")]
    AuthUnavailable,

    /// `send` while the channel is not open
    #[error("channel is not open")]
    NotReady,

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Completes the taxonomy for callers that turn a `Delivery` into a
    /// `Result`; the channel itself hands decode errors to the handler.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// `error` envelope from the backend
    #[error("backend reported an error: {message}")]
    Protocol { message: String },

    #[error("failed to encode frame: {0}")]
    Encode(String),
}

/// Side-channel notifications about the channel lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A new transport is being opened
    Connecting { generation: u64 },
    /// The channel reached `Open`
    Ready,
    Failed(ChannelError),
    ReconnectScheduled { delay: Duration },
    /// `close()` completed
    Closed,
}
