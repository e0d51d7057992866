//! Channel configuration and endpoint derivation.

use std::time::Duration;

use thiserror::Error;

use crate::domain::UserId;

/// Fixed delay between an unexpected drop and the next connection attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// Upper bound for opening a transport.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// How the client proves its identity to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Connect to `/ws` and send `{"type":"auth","token":...}` once open.
    Handshake,
    /// Connect to `/ws/{user_id}` with the token in the upgrade request cookie.
    UserPath(UserId),
}

/// What to do when the backend answers the handshake with an `error` envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthFailurePolicy {
    /// Stay disconnected until `connect()` is called again.
    #[default]
    Halt,
    /// Treat the rejection like a dropped transport and retry after the delay.
    Retry,
}

/// Errors related to channel configuration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("origin must start with http:// or https:// (got '{0}')")]
    UnsupportedScheme(String),

    #[error("origin has no host: '{0}'")]
    MissingHost(String),

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

/// Channel configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    /// HTTP origin of the backend (e.g. `https://chat.example.com`)
    pub origin: String,
    pub auth: AuthMode,
    pub reconnect_delay: Duration,
    pub connect_timeout: Duration,
    pub auth_failure: AuthFailurePolicy,
}

impl ChannelConfig {
    /// Handshake authentication with the default timings.
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            auth: AuthMode::Handshake,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            auth_failure: AuthFailurePolicy::default(),
        }
    }

    pub fn with_auth(mut self, auth: AuthMode) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_auth_failure(mut self, policy: AuthFailurePolicy) -> Self {
        self.auth_failure = policy;
        self
    }

    /// WebSocket endpoint for this configuration.
    pub fn endpoint(&self) -> Result<String, ConfigError> {
        derive_endpoint(&self.origin, self.auth)
    }

    /// Check the timings and derive the endpoint.
    ///
    /// A zero connect timeout fails every attempt that is not ready on its
    /// first poll, and a zero reconnect delay retries in a tight loop.
    pub fn validate(&self) -> Result<String, ConfigError> {
        if self.reconnect_delay.is_zero() {
            return Err(ConfigError::ZeroDuration("reconnect delay"));
        }
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration("connect timeout"));
        }
        self.endpoint()
    }
}

/// Derive the WebSocket URL from an HTTP origin.
///
/// `https` origins map to `wss`, `http` to `ws`. Any path on the origin is
/// discarded.
pub fn derive_endpoint(origin: &str, auth: AuthMode) -> Result<String, ConfigError> {
    let trimmed = origin.trim();
    let (scheme, rest) = if let Some(rest) = trimmed.strip_prefix("https://") {
        ("wss", rest)
    } else if let Some(rest) = trimmed.strip_prefix("http://") {
        ("ws", rest)
    } else {
        return Err(ConfigError::UnsupportedScheme(origin.to_string()));
    };

    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() {
        return Err(ConfigError::MissingHost(origin.to_string()));
    }

    Ok(match auth {
        AuthMode::Handshake => format!("{scheme}://{host}/ws"),
        AuthMode::UserPath(user_id) => format!("{scheme}://{host}/ws/{user_id}"),
    })
}
