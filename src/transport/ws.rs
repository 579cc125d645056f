use crate::classify::classify_transport;
use crate::error_code::codes;
use crate::{Error, Result};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// One open, message-oriented, full-duplex connection.
///
/// Each streaming invocation owns its own connection; connections are never
/// shared or pooled.
#[async_trait]
pub trait FrameConnection: Send {
    async fn send_text(&mut self, text: String) -> Result<()>;

    /// Waits for the next text message. `Ok(None)` means the peer closed.
    async fn recv_text(&mut self) -> Result<Option<String>>;

    async fn close(&mut self) -> Result<()>;
}

/// Opens streaming connections.
#[async_trait]
pub trait StreamConnector: Send + Sync {
    async fn connect(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<Box<dyn FrameConnection>>;
}

/// WebSocket connector backed by `tokio-tungstenite`.
pub struct WsConnector {
    handshake_timeout: Duration,
}

impl WsConnector {
    pub fn new(handshake_timeout: Duration) -> Self {
        Self { handshake_timeout }
    }
}

#[async_trait]
impl StreamConnector for WsConnector {
    async fn connect(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<Box<dyn FrameConnection>> {
        let mut request = url.into_client_request().map_err(|e| {
            Error::validation(format!("invalid stream URL: {}", url))
                .with_code(codes::INVALID_BASE_URL)
                .with_source(e)
        })?;

        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                Error::validation(format!("invalid header name: {}", name)).with_source(e)
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                Error::validation(format!("invalid value for header {}", name)).with_source(e)
            })?;
            request.headers_mut().insert(name, value);
        }

        let (stream, _response) = tokio::time::timeout(self.handshake_timeout, connect_async(request))
            .await
            .map_err(|elapsed| {
                classify_transport("WebSocket handshake timed out", Box::new(elapsed), true)
            })?
            .map_err(|e| {
                classify_transport("failed to open WebSocket connection", Box::new(e), false)
            })?;

        Ok(Box::new(WsConnection { inner: stream }))
    }
}

struct WsConnection {
    inner: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl FrameConnection for WsConnection {
    async fn send_text(&mut self, text: String) -> Result<()> {
        self.inner.send(Message::Text(text)).await.map_err(|e| {
            classify_transport("failed to send stream message", Box::new(e), false)
        })
    }

    async fn recv_text(&mut self) -> Result<Option<String>> {
        loop {
            match self.inner.next().await {
                None | Some(Ok(Message::Close(_))) => return Ok(None),
                Some(Ok(Message::Text(text))) => return Ok(Some(text)),
                Some(Ok(Message::Binary(bytes))) => {
                    return Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
                }
                // ping/pong are answered by tungstenite itself
                Some(Ok(_)) => continue,
                Some(Err(tungstenite::Error::ConnectionClosed)) => return Ok(None),
                Some(Err(e)) => {
                    return Err(classify_transport(
                        "failed to read stream message",
                        Box::new(e),
                        false,
                    ))
                }
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self.inner.close(None).await {
            Ok(()) => Ok(()),
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => Ok(()),
            Err(e) => Err(classify_transport(
                "failed to close stream connection",
                Box::new(e),
                false,
            )),
        }
    }
}
