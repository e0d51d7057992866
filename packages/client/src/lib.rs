//! DevNet chat client library.
//!
//! A reconnecting realtime channel to the DevNet backend, the HTTP directory
//! client around it, and the terminal UI that drives both.

pub mod channel;
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// Re-export entry point
pub use ui::run_client;
