//! Terminal UI: argument parsing, line commands, rendering and the run loop.

pub mod cli;
mod command;
mod error;
mod render;
mod runner;

pub use cli::{Args, AuthArg};
pub use error::RunError;
pub use runner::run_client;
