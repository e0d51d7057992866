//! Channel state machine.
//!
//! Pure transition function: every input returns the list of effects the
//! runtime has to carry out. Transport inputs carry the generation of the
//! transport that produced them and are ignored once that generation is no
//! longer current. Leaving a live transport always advances the generation.

use std::time::Duration;

use crate::{
    domain::{
        ChannelState, Credential, Delivery, IncomingEnvelope, OutgoingMessage, TransportError,
    },
    infrastructure::dto::websocket::{decode_incoming, encode_auth, encode_message},
};

use super::{
    config::{AuthFailurePolicy, AuthMode, ChannelConfig},
    error::{ChannelError, Notification},
};

/// Effect requested by the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// The state changed
    Transition(ChannelState),
    /// Open a new transport for `generation`, replacing any previous one
    Open {
        generation: u64,
        cookie: Option<Credential>,
    },
    /// Write a text frame on the transport of `generation`
    Write { generation: u64, frame: String },
    /// Release the transport of `generation`
    CloseTransport { generation: u64 },
    /// Fire `take_reconnect(token)` after `delay`
    ScheduleReconnect { token: u64, delay: Duration },
    CancelReconnect,
    /// Hand a decoded frame (or decode error) to the envelope handler
    Deliver(Delivery),
    Notify(Notification),
}

/// State machine behind [`super::ChannelManager`].
#[derive(Debug)]
pub struct ChannelMachine {
    state: ChannelState,
    generation: u64,
    handshake: bool,
    auth_failure: AuthFailurePolicy,
    reconnect_delay: Duration,
    /// Held between `connect` and the handshake frame only
    credential: Option<Credential>,
    pending_reconnect: Option<u64>,
}

impl ChannelMachine {
    pub fn new(config: &ChannelConfig) -> Self {
        Self {
            state: ChannelState::Disconnected,
            generation: 0,
            handshake: matches!(config.auth, AuthMode::Handshake),
            auth_failure: config.auth_failure,
            reconnect_delay: config.reconnect_delay,
            credential: None,
            pending_reconnect: None,
        }
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[cfg(test)]
    pub(crate) fn reconnect_pending(&self) -> bool {
        self.pending_reconnect.is_some()
    }

    /// Start a connection attempt.
    ///
    /// A no-op while a transport is live. Fails with `AuthUnavailable`
    /// without touching the state when there is no credential.
    pub fn connect(&mut self, credential: Option<Credential>) -> Result<Vec<Action>, ChannelError> {
        if self.state.is_live() {
            tracing::debug!(state = %self.state, "connect ignored, channel already live");
            return Ok(Vec::new());
        }
        let credential = credential.ok_or(ChannelError::AuthUnavailable)?;

        let mut actions = Vec::new();
        if self.pending_reconnect.take().is_some() {
            actions.push(Action::CancelReconnect);
        }

        self.generation += 1;
        self.state = ChannelState::Connecting;
        let cookie = if self.handshake {
            self.credential = Some(credential);
            None
        } else {
            Some(credential)
        };

        let generation = self.generation;
        actions.extend([
            Action::Transition(ChannelState::Connecting),
            Action::Notify(Notification::Connecting { generation }),
            Action::Open { generation, cookie },
        ]);
        Ok(actions)
    }

    /// The transport of `generation` finished opening.
    pub fn on_open(&mut self, generation: u64) -> Vec<Action> {
        if generation != self.generation || self.state != ChannelState::Connecting {
            tracing::debug!(generation, current = self.generation, "Ignoring stale open");
            return Vec::new();
        }

        if !self.handshake {
            self.state = ChannelState::Open;
            return vec![
                Action::Transition(ChannelState::Open),
                Action::Notify(Notification::Ready),
            ];
        }

        let Some(credential) = self.credential.take() else {
            return self.halt(ChannelError::AuthUnavailable);
        };
        match encode_auth(&credential) {
            Ok(frame) => {
                self.state = ChannelState::AwaitingAuth;
                vec![
                    Action::Transition(ChannelState::AwaitingAuth),
                    Action::Write { generation, frame },
                ]
            }
            Err(e) => self.halt(ChannelError::Encode(e.to_string())),
        }
    }

    /// A text frame arrived on the transport of `generation`.
    pub fn on_frame(&mut self, generation: u64, frame: &str) -> Vec<Action> {
        if generation != self.generation {
            tracing::debug!(generation, current = self.generation, "Ignoring stale frame");
            return Vec::new();
        }

        match self.state {
            ChannelState::AwaitingAuth => match decode_incoming(frame) {
                Ok(IncomingEnvelope::AuthSuccess) => {
                    self.state = ChannelState::Open;
                    vec![
                        Action::Transition(ChannelState::Open),
                        Action::Notify(Notification::Ready),
                    ]
                }
                Ok(IncomingEnvelope::Error { message }) => self.reject_auth(message),
                other => vec![Action::Deliver(other)],
            },
            ChannelState::Open => vec![Action::Deliver(decode_incoming(frame))],
            _ => Vec::new(),
        }
    }

    /// The transport of `generation` ended without `close()`.
    ///
    /// `cause` is `None` when the peer closed cleanly.
    pub fn on_closed(&mut self, generation: u64, cause: Option<TransportError>) -> Vec<Action> {
        if generation != self.generation || !self.state.is_live() {
            tracing::debug!(generation, current = self.generation, "Ignoring stale close");
            return Vec::new();
        }

        let error = ChannelError::Transport(cause.unwrap_or(TransportError::ClosedByPeer));
        let mut actions = self.halt(error);
        actions.extend(self.schedule_reconnect());
        actions
    }

    /// Consume the pending reconnect identified by `token`.
    ///
    /// Returns `false` when it was cancelled or superseded in the meantime.
    pub fn take_reconnect(&mut self, token: u64) -> bool {
        if self.pending_reconnect == Some(token) && self.state == ChannelState::Disconnected {
            self.pending_reconnect = None;
            true
        } else {
            false
        }
    }

    /// Encode `message` for the open transport.
    pub fn send(&mut self, message: &OutgoingMessage) -> Result<Vec<Action>, ChannelError> {
        if self.state != ChannelState::Open {
            return Err(ChannelError::NotReady);
        }
        let frame = encode_message(message).map_err(|e| ChannelError::Encode(e.to_string()))?;
        Ok(vec![Action::Write {
            generation: self.generation,
            frame,
        }])
    }

    /// Tear down the transport and cancel any pending reconnect.
    pub fn close(&mut self) -> Vec<Action> {
        let live = self.state.is_live();
        let pending = self.pending_reconnect.take().is_some();
        if !live && !pending {
            return Vec::new();
        }

        let mut actions = Vec::new();
        if pending {
            actions.push(Action::CancelReconnect);
        }
        if live {
            let generation = self.generation;
            self.state = ChannelState::Closing;
            actions.push(Action::Transition(ChannelState::Closing));
            actions.push(Action::CloseTransport { generation });
            self.state = ChannelState::Disconnected;
            actions.push(Action::Transition(ChannelState::Disconnected));
        }
        self.generation += 1;
        self.credential = None;
        actions.push(Action::Notify(Notification::Closed));
        actions
    }

    fn reject_auth(&mut self, message: String) -> Vec<Action> {
        let mut actions = self.halt(ChannelError::Protocol { message });
        if self.auth_failure == AuthFailurePolicy::Retry {
            actions.extend(self.schedule_reconnect());
        }
        actions
    }

    /// Drop the current transport and go to `Disconnected`.
    fn halt(&mut self, error: ChannelError) -> Vec<Action> {
        let generation = self.generation;
        self.generation += 1;
        self.credential = None;
        self.state = ChannelState::Disconnected;
        vec![
            Action::CloseTransport { generation },
            Action::Transition(ChannelState::Disconnected),
            Action::Notify(Notification::Failed(error)),
        ]
    }

    fn schedule_reconnect(&mut self) -> Vec<Action> {
        let token = self.generation;
        self.pending_reconnect = Some(token);
        vec![
            Action::Notify(Notification::ReconnectScheduled {
                delay: self.reconnect_delay,
            }),
            Action::ScheduleReconnect {
                token,
                delay: self.reconnect_delay,
            },
        ]
    }
}
