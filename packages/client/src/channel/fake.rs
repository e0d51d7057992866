//! In-memory transport for channel tests.
//!
//! Every `open` hands the test a [`FakePeer`] playing the server side.
//! Dropping the peer closes the transport from the server side.

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::{ConnectRequest, Connector, Duplex, FrameSink, FrameStream, TransportError};

pub(crate) struct FakeConnector {
    opened: AtomicUsize,
    refuse: AtomicBool,
    peers: mpsc::UnboundedSender<FakePeer>,
}

impl FakeConnector {
    pub(crate) fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<FakePeer>) {
        let (peers, rx) = mpsc::unbounded_channel();
        let connector = Arc::new(Self {
            opened: AtomicUsize::new(0),
            refuse: AtomicBool::new(false),
            peers,
        });
        (connector, rx)
    }

    /// Number of `open` calls so far.
    pub(crate) fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub(crate) fn refuse_connections(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn open(&self, request: ConnectRequest) -> Result<Duplex, TransportError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        if self.refuse.load(Ordering::SeqCst) {
            return Err(TransportError::Connect("connection refused".to_string()));
        }

        let (client_tx, from_client) = mpsc::unbounded_channel();
        let (to_client, client_rx) = mpsc::unbounded_channel();
        // The test may have stopped listening for peers; the transport still opens.
        let _ = self.peers.send(FakePeer {
            request,
            from_client,
            to_client,
        });

        Ok((
            Box::new(FakeSink {
                tx: Some(client_tx),
            }),
            Box::new(FakeStream { rx: client_rx }),
        ))
    }
}

/// Server side of a fake transport.
pub(crate) struct FakePeer {
    pub(crate) request: ConnectRequest,
    from_client: mpsc::UnboundedReceiver<String>,
    to_client: mpsc::UnboundedSender<Result<String, TransportError>>,
}

impl FakePeer {
    /// Push a text frame to the client.
    pub(crate) fn push(&self, frame: &str) {
        let _ = self.to_client.send(Ok(frame.to_string()));
    }

    /// Fail the transport with an I/O error.
    pub(crate) fn fail(&self, reason: &str) {
        let _ = self.to_client.send(Err(TransportError::Io(reason.to_string())));
    }

    /// Next frame written by the client; `None` once the client closed.
    pub(crate) async fn next_frame(&mut self) -> Option<String> {
        self.from_client.recv().await
    }

    /// Frame already written by the client, without waiting.
    pub(crate) fn try_next_frame(&mut self) -> Option<String> {
        self.from_client.try_recv().ok()
    }
}

struct FakeSink {
    tx: Option<mpsc::UnboundedSender<String>>,
}

#[async_trait]
impl FrameSink for FakeSink {
    async fn send_text(&mut self, frame: String) -> Result<(), TransportError> {
        match &self.tx {
            Some(tx) => tx.send(frame).map_err(|_| TransportError::ClosedByPeer),
            None => Err(TransportError::ClosedByPeer),
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.tx = None;
        Ok(())
    }
}

struct FakeStream {
    rx: mpsc::UnboundedReceiver<Result<String, TransportError>>,
}

#[async_trait]
impl FrameStream for FakeStream {
    async fn next_text(&mut self) -> Option<Result<String, TransportError>> {
        self.rx.recv().await
    }
}
