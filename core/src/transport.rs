//! Transport seam for the event stream.
//!
//! The real-time channel owns reconnection, backoff and the connection state
//! machine; a [`Transport`] only knows how to open one bidirectional text
//! connection. This keeps the channel contract identical for the WebSocket
//! client and the scripted mock used in tests.
//!
//! # Dyn Compatibility
//!
//! Methods return `Pin<Box<dyn Future>>` instead of using `async fn`, so the
//! channel can hold an `Arc<dyn Transport>`.

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Boxed, sendable future returned by transport methods
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors raised by a transport.
///
/// These never reach the channel's owner as errors; the channel turns them
/// into state transitions and reconnect attempts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The connection could not be established
    #[error("Connection failed: {0}")]
    Connect(String),

    /// Reading or writing an open connection failed
    #[error("Transport I/O error: {0}")]
    Io(String),

    /// The peer closed the connection
    #[error("Connection closed by peer")]
    Closed,
}

/// Opens connections to the event stream.
pub trait Transport: Send + Sync {
    /// Open a new connection.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Connect`] if the endpoint cannot be reached.
    fn open(&self) -> BoxFuture<'_, Result<Box<dyn Connection>, TransportError>>;

    /// Human-readable endpoint, for logs
    fn endpoint(&self) -> String;
}

/// One open, bidirectional text connection.
///
/// Frames sent on a connection are delivered in order.
pub trait Connection: Send {
    /// Send one text frame.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the frame could not be written.
    fn send(&mut self, frame: String) -> BoxFuture<'_, Result<(), TransportError>>;

    /// Receive the next text frame.
    ///
    /// Resolves to `None` once the connection has ended cleanly. Must be
    /// cancel-safe: dropping the future loses no frame.
    fn recv(&mut self) -> BoxFuture<'_, Option<Result<String, TransportError>>>;

    /// Close the connection. Errors while closing are ignored.
    fn close(&mut self) -> BoxFuture<'_, ()>;
}
