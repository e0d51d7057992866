//! Transport seam for the realtime channel.
//!
//! The channel manager only sees text frames; the infrastructure layer
//! provides the WebSocket implementation and tests provide a fake.

use async_trait::async_trait;

use super::{error::TransportError, value_object::Credential};

/// Parameters of a single connection attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    pub url: String,
    /// Sent as `Cookie: access_token=...` on the upgrade request
    pub cookie: Option<Credential>,
}

/// Write half of an open transport.
#[async_trait]
pub trait FrameSink: Send {
    async fn send_text(&mut self, frame: String) -> Result<(), TransportError>;

    /// Start a graceful close of the transport.
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Read half of an open transport.
#[async_trait]
pub trait FrameStream: Send {
    /// Next text frame. `None` means the peer closed the transport cleanly.
    async fn next_text(&mut self) -> Option<Result<String, TransportError>>;
}

/// Both halves of an open transport.
pub type Duplex = (Box<dyn FrameSink>, Box<dyn FrameStream>);

/// Opens transports.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(&self, request: ConnectRequest) -> Result<Duplex, TransportError>;
}
