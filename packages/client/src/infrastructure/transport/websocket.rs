//! WebSocket transport over `tokio-tungstenite`.

use async_trait::async_trait;
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{
        self, Message,
        client::IntoClientRequest,
        http::{HeaderValue, header::COOKIE},
    },
};

use crate::{
    domain::{ConnectRequest, Connector, Duplex, FrameSink, FrameStream, TransportError},
    infrastructure::credential::ACCESS_TOKEN_COOKIE,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

impl From<tungstenite::Error> for TransportError {
    fn from(e: tungstenite::Error) -> Self {
        match e {
            tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
                TransportError::ClosedByPeer
            }
            other => TransportError::Io(other.to_string()),
        }
    }
}

/// Opens WebSocket connections.
#[derive(Debug, Clone, Default)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn open(&self, request: ConnectRequest) -> Result<Duplex, TransportError> {
        let mut upgrade = request
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        if let Some(credential) = &request.cookie {
            let cookie = format!("{ACCESS_TOKEN_COOKIE}={}", credential.as_str());
            let value = HeaderValue::from_str(&cookie)
                .map_err(|e| TransportError::Connect(format!("invalid cookie header: {e}")))?;
            upgrade.headers_mut().insert(COOKIE, value);
        }

        let (stream, response) = connect_async(upgrade)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        tracing::debug!(
            url = %request.url,
            status = %response.status(),
            "WebSocket handshake completed"
        );

        let (sink, stream) = stream.split();
        Ok((
            Box::new(WebSocketSink { inner: sink }),
            Box::new(WebSocketFrames { inner: stream }),
        ))
    }
}

struct WebSocketSink {
    inner: SplitSink<WsStream, Message>,
}

#[async_trait]
impl FrameSink for WebSocketSink {
    async fn send_text(&mut self, frame: String) -> Result<(), TransportError> {
        self.inner.send(Message::Text(frame.into())).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.inner.close().await?;
        Ok(())
    }
}

struct WebSocketFrames {
    inner: SplitStream<WsStream>,
}

#[async_trait]
impl FrameStream for WebSocketFrames {
    async fn next_text(&mut self) -> Option<Result<String, TransportError>> {
        while let Some(message) = self.inner.next().await {
            match message {
                Ok(Message::Text(text)) => return Some(Ok(text.as_str().to_owned())),
                Ok(Message::Close(frame)) => {
                    tracing::debug!(?frame, "Server requested close");
                    return None;
                }
                Ok(Message::Binary(bytes)) => {
                    tracing::debug!(len = bytes.len(), "Ignoring binary frame");
                }
                // Ping/pong is handled by tungstenite
                Ok(_) => {}
                Err(e) => return Some(Err(e.into())),
            }
        }
        None
    }
}
