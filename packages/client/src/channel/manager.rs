//! Realtime channel manager.
//!
//! Owns the state machine, the single live transport and the reconnect timer.
//! Transport tasks, the timer and caller operations all feed inputs into the
//! machine under one lock and carry out the returned actions before releasing
//! it, so inputs are applied strictly one after another. Decoded envelopes are
//! handed to a dispatcher task that calls the registered handler in arrival
//! order; the handler may call back into the manager.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};

use tokio::{
    sync::{broadcast, mpsc, watch},
    task::JoinHandle,
};

use crate::domain::{
    ChannelState, ConnectRequest, Connector, CredentialSource, Delivery, OutgoingMessage,
    TransportError,
};

use super::{
    config::{ChannelConfig, ConfigError},
    error::{ChannelError, Notification},
    machine::{Action, ChannelMachine},
};

const NOTIFICATION_CAPACITY: usize = 64;

/// Consumer of decoded envelopes.
pub trait EnvelopeHandler: Send + 'static {
    fn handle(&mut self, delivery: Delivery);
}

impl<F> EnvelopeHandler for F
where
    F: FnMut(Delivery) + Send + 'static,
{
    fn handle(&mut self, delivery: Delivery) {
        self(delivery)
    }
}

enum Dispatch {
    Register(Box<dyn EnvelopeHandler>),
    Deliver(Delivery),
}

struct TransportHandle {
    generation: u64,
    /// Dropping the sender makes the transport task close the connection
    outbound: mpsc::UnboundedSender<String>,
}

struct Shared {
    machine: ChannelMachine,
    transport: Option<TransportHandle>,
    reconnect: Option<JoinHandle<()>>,
}

struct Inner {
    endpoint: String,
    connect_timeout: Duration,
    connector: Arc<dyn Connector>,
    credentials: Arc<dyn CredentialSource>,
    shared: Mutex<Shared>,
    dispatch: mpsc::UnboundedSender<Dispatch>,
    notifications: broadcast::Sender<Notification>,
    state_tx: watch::Sender<ChannelState>,
}

/// Handle to the reconnecting realtime channel. Cheap to clone.
#[derive(Clone)]
pub struct ChannelManager {
    inner: Arc<Inner>,
}

impl ChannelManager {
    /// Create a disconnected channel.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if no endpoint can be derived from the origin or
    /// a timing is zero.
    pub fn new(
        config: ChannelConfig,
        connector: Arc<dyn Connector>,
        credentials: Arc<dyn CredentialSource>,
    ) -> Result<Self, ConfigError> {
        let endpoint = config.validate()?;
        let (dispatch, dispatch_rx) = mpsc::unbounded_channel();
        tokio::spawn(dispatch_loop(dispatch_rx));
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        let (state_tx, _) = watch::channel(ChannelState::Disconnected);

        tracing::debug!(%endpoint, auth = ?config.auth, "Channel created");
        Ok(Self {
            inner: Arc::new(Inner {
                endpoint,
                connect_timeout: config.connect_timeout,
                connector,
                credentials,
                shared: Mutex::new(Shared {
                    machine: ChannelMachine::new(&config),
                    transport: None,
                    reconnect: None,
                }),
                dispatch,
                notifications,
                state_tx,
            }),
        })
    }

    /// WebSocket URL this channel connects to.
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    pub fn state(&self) -> ChannelState {
        self.inner.lock().machine.state()
    }

    /// Receiver that observes every state transition.
    pub fn watch_state(&self) -> watch::Receiver<ChannelState> {
        self.inner.state_tx.subscribe()
    }

    /// Receiver for side-channel notifications emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.inner.notifications.subscribe()
    }

    /// Register the envelope handler, replacing the previous one.
    pub fn on_envelope<H: EnvelopeHandler>(&self, handler: H) {
        if self
            .inner
            .dispatch
            .send(Dispatch::Register(Box::new(handler)))
            .is_err()
        {
            tracing::warn!("Envelope dispatcher is gone, handler not registered");
        }
    }

    /// Open the channel.
    ///
    /// Does nothing while a connection is already Connecting, AwaitingAuth or
    /// Open.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::AuthUnavailable` without touching the network
    /// when the credential source has no token.
    pub fn connect(&self) -> Result<(), ChannelError> {
        let mut shared = self.inner.lock();
        if shared.machine.state().is_live() {
            tracing::debug!(state = %shared.machine.state(), "Already connected");
            return Ok(());
        }
        let credential = self.inner.credentials.read();
        let actions = shared.machine.connect(credential)?;
        self.inner.apply(&mut shared, actions);
        Ok(())
    }

    /// Write a chat message. Fire-and-forget.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::NotReady` unless the channel is Open.
    pub fn send(&self, message: &OutgoingMessage) -> Result<(), ChannelError> {
        let mut shared = self.inner.lock();
        let actions = shared.machine.send(message)?;
        self.inner.apply(&mut shared, actions);
        Ok(())
    }

    /// Close the transport and cancel any pending reconnect.
    pub fn close(&self) {
        let mut shared = self.inner.lock();
        let actions = shared.machine.close();
        self.inner.apply(&mut shared, actions);
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(self: &Arc<Self>, shared: &mut Shared, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::Transition(state) => {
                    tracing::info!(%state, generation = shared.machine.generation(), "Channel state changed");
                    self.state_tx.send_replace(state);
                }
                Action::Open { generation, cookie } => {
                    let (outbound, outbound_rx) = mpsc::unbounded_channel();
                    if let Some(previous) = shared.transport.replace(TransportHandle {
                        generation,
                        outbound,
                    }) {
                        tracing::debug!(previous = previous.generation, generation, "Superseding transport");
                    }
                    let request = ConnectRequest {
                        url: self.endpoint.clone(),
                        cookie,
                    };
                    tokio::spawn(run_transport(
                        Arc::downgrade(self),
                        self.connector.clone(),
                        request,
                        generation,
                        self.connect_timeout,
                        outbound_rx,
                    ));
                }
                Action::Write { generation, frame } => match &shared.transport {
                    Some(transport) if transport.generation == generation => {
                        if transport.outbound.send(frame).is_err() {
                            tracing::warn!(generation, "Transport task is gone, frame dropped");
                        }
                    }
                    _ => tracing::debug!(generation, "No transport for generation, frame dropped"),
                },
                Action::CloseTransport { generation } => {
                    if shared
                        .transport
                        .as_ref()
                        .is_some_and(|transport| transport.generation == generation)
                    {
                        shared.transport = None;
                    }
                }
                Action::ScheduleReconnect { token, delay } => {
                    if let Some(previous) = shared.reconnect.take() {
                        previous.abort();
                    }
                    let inner = Arc::downgrade(self);
                    shared.reconnect = Some(tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        if let Some(inner) = inner.upgrade() {
                            inner.fire_reconnect(token);
                        }
                    }));
                }
                Action::CancelReconnect => {
                    if let Some(timer) = shared.reconnect.take() {
                        timer.abort();
                    }
                }
                Action::Deliver(delivery) => {
                    if self.dispatch.send(Dispatch::Deliver(delivery)).is_err() {
                        tracing::warn!("Envelope dispatcher is gone, delivery dropped");
                    }
                }
                Action::Notify(notification) => {
                    match &notification {
                        Notification::Failed(error) => tracing::warn!("Channel failure: {}", error),
                        Notification::ReconnectScheduled { delay } => {
                            tracing::info!(
                                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                                "Reconnect scheduled"
                            )
                        }
                        other => tracing::debug!(?other, "Channel notification"),
                    }
                    // No subscribers is fine.
                    let _ = self.notifications.send(notification);
                }
            }
        }
    }

    fn fire_reconnect(self: &Arc<Self>, token: u64) {
        let mut shared = self.lock();
        if !shared.machine.take_reconnect(token) {
            tracing::debug!(token, "Reconnect cancelled");
            return;
        }
        shared.reconnect = None;

        tracing::info!(token, "Reconnecting");
        let credential = self.credentials.read();
        match shared.machine.connect(credential) {
            Ok(actions) => self.apply(&mut shared, actions),
            Err(error) => {
                tracing::warn!("Reconnect aborted: {}", error);
                let _ = self.notifications.send(Notification::Failed(error));
            }
        }
    }

    fn on_transport_open(self: &Arc<Self>, generation: u64) {
        let mut shared = self.lock();
        let actions = shared.machine.on_open(generation);
        self.apply(&mut shared, actions);
    }

    fn on_transport_frame(self: &Arc<Self>, generation: u64, frame: &str) {
        let mut shared = self.lock();
        let actions = shared.machine.on_frame(generation, frame);
        self.apply(&mut shared, actions);
    }

    fn on_transport_closed(self: &Arc<Self>, generation: u64, cause: Option<TransportError>) {
        let mut shared = self.lock();
        let actions = shared.machine.on_closed(generation, cause);
        self.apply(&mut shared, actions);
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let shared = self.shared.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(timer) = shared.reconnect.take() {
            timer.abort();
        }
    }
}

/// Calls the registered handler for each delivery, in order.
async fn dispatch_loop(mut rx: mpsc::UnboundedReceiver<Dispatch>) {
    let mut handler: Option<Box<dyn EnvelopeHandler>> = None;
    while let Some(item) = rx.recv().await {
        match item {
            Dispatch::Register(next) => {
                if handler.replace(next).is_some() {
                    tracing::debug!("Envelope handler replaced");
                }
            }
            Dispatch::Deliver(delivery) => match handler.as_mut() {
                Some(handler) => handler.handle(delivery),
                None => match delivery {
                    Ok(envelope) => {
                        tracing::debug!(kind = envelope.kind(), "No envelope handler, dropping")
                    }
                    Err(e) => tracing::warn!("No envelope handler for decode error: {}", e),
                },
            },
        }
    }
}

/// Drives one transport: open, pump frames both ways, report the end.
async fn run_transport(
    inner: Weak<Inner>,
    connector: Arc<dyn Connector>,
    request: ConnectRequest,
    generation: u64,
    connect_timeout: Duration,
    mut outbound: mpsc::UnboundedReceiver<String>,
) {
    tracing::debug!(generation, url = %request.url, "Opening transport");
    let opened = tokio::time::timeout(connect_timeout, connector.open(request))
        .await
        .unwrap_or(Err(TransportError::Timeout(connect_timeout)));

    let (mut sink, mut stream) = match opened {
        Ok(duplex) => duplex,
        Err(error) => {
            if let Some(inner) = inner.upgrade() {
                inner.on_transport_closed(generation, Some(error));
            }
            return;
        }
    };

    match inner.upgrade() {
        Some(inner) => inner.on_transport_open(generation),
        None => {
            let _ = sink.close().await;
            return;
        }
    }

    let cause = loop {
        tokio::select! {
            outgoing = outbound.recv() => match outgoing {
                Some(frame) => {
                    if let Err(e) = sink.send_text(frame).await {
                        break Some(e);
                    }
                }
                None => {
                    // Released by close() or superseded; nothing to report.
                    tracing::debug!(generation, "Transport released, closing");
                    if let Err(e) = sink.close().await {
                        tracing::debug!(generation, "Close failed: {}", e);
                    }
                    return;
                }
            },
            incoming = stream.next_text() => match incoming {
                Some(Ok(frame)) => match inner.upgrade() {
                    Some(inner) => inner.on_transport_frame(generation, &frame),
                    None => return,
                },
                Some(Err(e)) => break Some(e),
                None => break None,
            },
        }
    };

    tracing::debug!(generation, cause = ?cause, "Transport ended");
    if let Some(inner) = inner.upgrade() {
        inner.on_transport_closed(generation, cause);
    }
}
