//! Command line arguments.

use std::{path::PathBuf, time::Duration};

use clap::{Parser, ValueEnum};

use crate::{
    channel::{AuthFailurePolicy, ChannelConfig},
    domain::UserId,
};

/// How the channel authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AuthArg {
    /// Connect to /ws and send an auth frame with the token
    Handshake,
    /// Connect to /ws/{user_id} with the access_token cookie
    Path,
}

/// Terminal chat client for DevNet.
#[derive(Debug, Parser)]
#[command(name = "devnet-client", version, about)]
pub struct Args {
    /// Backend HTTP origin
    #[arg(long, env = "DEVNET_ORIGIN", default_value = "http://localhost:8000")]
    pub origin: String,

    /// Cookie header string containing access_token (e.g. "access_token=...")
    #[arg(long, env = "DEVNET_COOKIE", hide_env_values = true)]
    pub cookie: Option<String>,

    /// Cookie file (header string or curl cookie jar), re-read on every connect
    #[arg(long, env = "DEVNET_COOKIE_FILE", conflicts_with = "cookie")]
    pub cookie_file: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = AuthArg::Handshake)]
    pub auth: AuthArg,

    /// User id for --auth path; defaults to the id reported by /api/me
    #[arg(long, value_parser = parse_user_id)]
    pub user_id: Option<UserId>,

    /// Initial chat partner
    #[arg(long, value_parser = parse_user_id)]
    pub to: Option<UserId>,

    /// Fixed delay before each reconnect attempt
    #[arg(long, default_value_t = 3000, value_parser = clap::value_parser!(u64).range(1..))]
    pub reconnect_delay_ms: u64,

    /// Give up opening a connection after this many seconds
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub connect_timeout_secs: u64,

    /// Keep reconnecting after the backend rejects the credential
    #[arg(long)]
    pub retry_on_auth_failure: bool,
}

impl Args {
    /// Channel settings derived from the arguments (auth mode excluded).
    pub fn channel_config(&self) -> ChannelConfig {
        let policy = if self.retry_on_auth_failure {
            AuthFailurePolicy::Retry
        } else {
            AuthFailurePolicy::Halt
        };
        ChannelConfig::new(self.origin.clone())
            .with_reconnect_delay(Duration::from_millis(self.reconnect_delay_ms))
            .with_connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .with_auth_failure(policy)
    }
}

pub(crate) fn parse_user_id(value: &str) -> Result<UserId, String> {
    let id: i64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{value}' is not a user id"))?;
    UserId::new(id).map_err(|e| e.to_string())
}
