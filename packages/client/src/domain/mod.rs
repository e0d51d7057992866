//! Domain layer for the chat client.
//!
//! Value objects, envelopes and the seams (transport, credentials, directory)
//! that the infrastructure layer implements.

pub mod channel_state;
pub mod credential;
pub mod directory;
pub mod envelope;
pub mod error;
pub mod transport;
pub mod value_object;

pub use channel_state::ChannelState;
pub use credential::CredentialSource;
pub use directory::{ChatDirectory, HistoryEntry, User};
pub use envelope::{ChatMessage, Delivery, IncomingEnvelope, OutgoingMessage};
pub use error::{DecodeError, DirectoryError, TransportError, ValueObjectError};
pub use transport::{ConnectRequest, Connector, Duplex, FrameSink, FrameStream};
pub use value_object::{Credential, MessageContent, MessageKind, UserId};
