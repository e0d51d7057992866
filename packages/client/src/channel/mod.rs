//! Reconnecting realtime channel.
//!
//! [`ChannelMachine`] is the I/O-free transition function; [`ChannelManager`]
//! drives it from transport tasks, timers and caller operations, one input at
//! a time.

pub mod config;
pub mod error;
pub mod machine;
pub mod manager;

#[cfg(test)]
pub(crate) mod fake;

pub use config::{
    AuthFailurePolicy, AuthMode, ChannelConfig, ConfigError, DEFAULT_CONNECT_TIMEOUT,
    DEFAULT_RECONNECT_DELAY,
};
pub use error::{ChannelError, Notification};
pub use machine::{Action, ChannelMachine};
pub use manager::{ChannelManager, EnvelopeHandler};
