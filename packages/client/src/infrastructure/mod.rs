//! Infrastructure layer.
//!
//! Concrete implementations of the domain seams: wire DTOs, the WebSocket
//! transport, cookie-backed credential sources and the HTTP directory client.

pub mod api;
pub mod credential;
pub mod dto;
pub mod transport;
