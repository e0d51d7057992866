//! Shared utilities for the DevNet chat client.
//!
//! Logger setup and time helpers used by every binary in the workspace.

pub mod logger;
pub mod time;
