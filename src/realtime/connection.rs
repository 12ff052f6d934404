//! Realtime connection factory.
//!
//! The engine never talks to a socket library directly: it asks a
//! [`Connector`] for a [`RealtimeConnection`] and reads [`Inbound`] items from
//! it. [`TungsteniteConnector`] is the production implementation; tests inject
//! their own.

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::error::Error as WsError;
use tokio_tungstenite::tungstenite::http::header::{HeaderValue, SEC_WEBSOCKET_PROTOCOL};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::{CloseFrame, Message};
use tokio_tungstenite::tungstenite::Utf8Bytes;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::{FastSchemaError, Result};

/// Close code reported when the peer vanished without a close frame.
pub const CLOSE_ABNORMAL: u16 = 1006;

/// Close code reported for a close frame without a status.
pub const CLOSE_NO_STATUS: u16 = 1005;

/// What the engine needs to open one subscription's connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    /// Full `ws(s)://.../realtime/content?...` URL
    pub url: String,
    /// Bearer token to offer as a handshake sub-protocol
    pub token: Option<String>,
}

/// One item read from a realtime connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A text (or UTF-8 decoded binary) frame
    Text(String),
    /// Transport-level error. The connection reports a `Close` next.
    Error(String),
    /// The connection ended. Terminal.
    Close { code: u16, reason: String },
}

/// Opens realtime connections.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, request: ConnectRequest) -> Result<Box<dyn RealtimeConnection>>;
}

/// An open realtime connection, owned by one subscription's reader task.
#[async_trait]
pub trait RealtimeConnection: Send {
    /// Next inbound item. `None` once the connection has reported `Close`.
    async fn next_inbound(&mut self) -> Option<Inbound>;

    /// Best-effort close with `code`. Never fails.
    async fn close(&mut self, code: u16);
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Default connector built on `tokio-tungstenite`.
///
/// The token travels as the sub-protocol list `Authorization, <token>`; the
/// server selects `Authorization`.
#[derive(Debug, Clone, Default)]
pub struct TungsteniteConnector;

impl TungsteniteConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(&self, request: ConnectRequest) -> Result<Box<dyn RealtimeConnection>> {
        let mut ws_request = request.url.as_str().into_client_request().map_err(|e| {
            FastSchemaError::ConnectionError(format!("Failed to build WebSocket request: {}", e))
        })?;

        if let Some(token) = request.token.as_deref().filter(|t| !t.is_empty()) {
            let protocols = HeaderValue::from_str(&format!("Authorization, {}", token))
                .map_err(|e| {
                    FastSchemaError::ConnectionError(format!("Invalid token for handshake: {}", e))
                })?;
            ws_request.headers_mut().insert(SEC_WEBSOCKET_PROTOCOL, protocols);
        }

        match connect_async(ws_request).await {
            Ok((stream, _response)) => Ok(Box::new(TungsteniteConnection::new(stream))),
            Err(WsError::Http(response)) => {
                let status = response.status();
                let body_text = response
                    .into_body()
                    .filter(|b| !b.is_empty())
                    .map(|b| String::from_utf8_lossy(&b).into_owned())
                    .unwrap_or_default();

                let message = match status.as_u16() {
                    401 => "Unauthorized: realtime connection requires a valid token".to_string(),
                    403 => "Forbidden: realtime connection denied".to_string(),
                    code if body_text.is_empty() => format!("WebSocket HTTP error: {}", code),
                    code => format!("WebSocket HTTP error {}: {}", code, body_text),
                };
                Err(FastSchemaError::ConnectionError(message))
            },
            Err(e) => Err(FastSchemaError::ConnectionError(format!("Connection failed: {}", e))),
        }
    }
}

struct TungsteniteConnection {
    stream: WsStream,
    pending_close: Option<Inbound>,
    finished: bool,
}

impl TungsteniteConnection {
    fn new(stream: WsStream) -> Self {
        Self {
            stream,
            pending_close: None,
            finished: false,
        }
    }

    fn abnormal_close() -> Inbound {
        Inbound::Close {
            code: CLOSE_ABNORMAL,
            reason: String::new(),
        }
    }
}

#[async_trait]
impl RealtimeConnection for TungsteniteConnection {
    async fn next_inbound(&mut self) -> Option<Inbound> {
        if let Some(close) = self.pending_close.take() {
            return Some(close);
        }
        if self.finished {
            return None;
        }

        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Some(Inbound::Text(text.as_str().to_string())),
                Some(Ok(Message::Binary(bytes))) => {
                    return Some(Inbound::Text(String::from_utf8_lossy(&bytes).into_owned()))
                },
                Some(Ok(Message::Close(frame))) => {
                    self.finished = true;
                    let (code, reason) = frame
                        .map(|f| (u16::from(f.code), f.reason.as_str().to_string()))
                        .unwrap_or((CLOSE_NO_STATUS, String::new()));
                    return Some(Inbound::Close { code, reason });
                },
                // ping/pong are answered by tungstenite itself
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    self.finished = true;
                    self.pending_close = Some(Self::abnormal_close());
                    return Some(Inbound::Error(e.to_string()));
                },
                None => {
                    self.finished = true;
                    return Some(Self::abnormal_close());
                },
            }
        }
    }

    async fn close(&mut self, code: u16) {
        if self.finished {
            // Flush the close reply tungstenite queued for the peer.
            let _ = self.stream.close(None).await;
            return;
        }
        self.finished = true;
        let frame = CloseFrame {
            code: CloseCode::from(code),
            reason: Utf8Bytes::from_static(""),
        };
        let _ = self.stream.close(Some(frame)).await;
    }
}
