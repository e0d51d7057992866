//! Data transfer objects for the WebSocket and HTTP wire formats.

pub mod http;
pub mod websocket;
