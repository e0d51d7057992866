//! Errors that end the client run.

use thiserror::Error;

use crate::{
    channel::{ChannelError, ConfigError},
    domain::DirectoryError,
};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("--auth path needs --user-id or a working /api/me: {0}")]
    UserIdUnknown(DirectoryError),

    #[error("failed to connect: {0}")]
    Channel(#[from] ChannelError),

    #[error("terminal input failed: {0}")]
    Input(#[from] rustyline::error::ReadlineError),
}
