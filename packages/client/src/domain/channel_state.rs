//! Lifecycle state of the realtime channel.

use std::fmt;

/// State of the realtime channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelState {
    /// No transport; a reconnect may be pending.
    #[default]
    Disconnected,
    /// A transport is being opened.
    Connecting,
    /// The transport is open and the `auth` frame has been sent.
    AwaitingAuth,
    /// Ready for `send`.
    Open,
    /// `close()` is tearing the transport down.
    Closing,
}

impl ChannelState {
    /// Whether a transport is owned in this state (Connecting, AwaitingAuth or Open).
    pub fn is_live(self) -> bool {
        matches!(
            self,
            ChannelState::Connecting | ChannelState::AwaitingAuth | ChannelState::Open
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChannelState::Disconnected => "disconnected",
            ChannelState::Connecting => "connecting",
            ChannelState::AwaitingAuth => "awaiting-auth",
            ChannelState::Open => "open",
            ChannelState::Closing => "closing",
        }
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
