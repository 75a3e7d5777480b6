//! WebSocket transport for the event stream.
//!
//! Text frames carry JSON messages. Ping/pong is answered by tungstenite;
//! binary frames are ignored.

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use seatmap_core::transport::{BoxFuture, Connection, Transport, TransportError};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens WebSocket connections to a fixed URL.
#[derive(Clone, Debug)]
pub struct WebSocketTransport {
    url: String,
}

impl WebSocketTransport {
    /// Transport for `url` (`ws://` or `wss://`)
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Transport for WebSocketTransport {
    fn open(&self) -> BoxFuture<'_, Result<Box<dyn Connection>, TransportError>> {
        Box::pin(async move {
            let (stream, response) = connect_async(self.url.as_str())
                .await
                .map_err(|e| TransportError::Connect(e.to_string()))?;
            tracing::debug!(url = %self.url, status = %response.status(), "WebSocket handshake complete");

            let (sink, stream) = stream.split();
            Ok(Box::new(WebSocketConnection { sink, stream }) as Box<dyn Connection>)
        })
    }

    fn endpoint(&self) -> String {
        self.url.clone()
    }
}

struct WebSocketConnection {
    sink: SplitSink<WsStream, Message>,
    stream: SplitStream<WsStream>,
}

impl Connection for WebSocketConnection {
    fn send(&mut self, frame: String) -> BoxFuture<'_, Result<(), TransportError>> {
        Box::pin(async move {
            self.sink
                .send(Message::Text(frame))
                .await
                .map_err(|e| TransportError::Io(e.to_string()))
        })
    }

    fn recv(&mut self) -> BoxFuture<'_, Option<Result<String, TransportError>>> {
        Box::pin(async move {
            loop {
                match self.stream.next().await? {
                    Ok(Message::Text(text)) => return Some(Ok(text)),
                    Ok(Message::Close(_)) => return None,
                    Ok(_) => {
                        // Ping/pong and binary frames
                    },
                    Err(e) => return Some(Err(TransportError::Io(e.to_string()))),
                }
            }
        })
    }

    fn close(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            if let Err(e) = self.sink.close().await {
                tracing::debug!(error = %e, "WebSocket close failed");
            }
        })
    }
}
