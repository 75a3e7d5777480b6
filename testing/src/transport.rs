//! Scripted in-memory transport.
//!
//! Each [`MockTransport::open`] consumes the next scripted
//! [`ConnectOutcome`] (falling back to a default once the script runs out).
//! Accepted connections are exposed through [`MockConnectionHandle`]s, which
//! let a test inject inbound frames, drop the connection, and inspect what
//! the channel sent.

use seatmap_core::message::StreamMessage;
use seatmap_core::transport::{BoxFuture, Connection, Transport, TransportError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

/// What the next connection attempt does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// The connection opens
    Accept,
    /// The attempt fails with [`TransportError::Connect`]
    Fail(String),
}

#[derive(Debug)]
enum Inbound {
    Frame(String),
    Error(TransportError),
    Close,
}

#[derive(Debug)]
struct MockState {
    script: VecDeque<ConnectOutcome>,
    default: ConnectOutcome,
    attempts: u32,
    connections: Vec<MockConnectionHandle>,
}

/// A [`Transport`] driven by a script.
#[derive(Clone, Debug)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// A transport that accepts every attempt
    #[must_use]
    pub fn new() -> Self {
        Self::with_default(ConnectOutcome::Accept)
    }

    /// A transport that fails every attempt
    #[must_use]
    pub fn failing() -> Self {
        Self::with_default(ConnectOutcome::Fail("connection refused".to_string()))
    }

    fn with_default(default: ConnectOutcome) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                script: VecDeque::new(),
                default,
                attempts: 0,
                connections: Vec::new(),
            })),
        }
    }

    /// Queue outcomes for the next attempts
    #[must_use]
    pub fn script(self, outcomes: impl IntoIterator<Item = ConnectOutcome>) -> Self {
        self.lock().script.extend(outcomes);
        self
    }

    /// Change the outcome used once the script is exhausted
    pub fn set_default(&self, outcome: ConnectOutcome) {
        self.lock().default = outcome;
    }

    /// Connection attempts made so far
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.lock().attempts
    }

    /// Number of accepted connections
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.lock().connections.len()
    }

    /// Handle to the `index`-th accepted connection
    #[must_use]
    pub fn connection(&self, index: usize) -> Option<MockConnectionHandle> {
        self.lock().connections.get(index).cloned()
    }

    /// Handle to the most recently accepted connection
    #[must_use]
    pub fn latest_connection(&self) -> Option<MockConnectionHandle> {
        self.lock().connections.last().cloned()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Transport for MockTransport {
    fn open(&self) -> BoxFuture<'_, Result<Box<dyn Connection>, TransportError>> {
        Box::pin(async move {
            let mut state = self.lock();
            state.attempts += 1;
            let outcome = match state.script.pop_front() {
                Some(outcome) => outcome,
                None => state.default.clone(),
            };

            match outcome {
                ConnectOutcome::Fail(reason) => Err(TransportError::Connect(reason)),
                ConnectOutcome::Accept => {
                    let (tx, rx) = mpsc::unbounded_channel();
                    let handle = MockConnectionHandle {
                        inbound: tx,
                        sent: Arc::new(Mutex::new(Vec::new())),
                        closed: Arc::new(AtomicBool::new(false)),
                    };
                    state.connections.push(handle.clone());
                    Ok(Box::new(MockConnection {
                        inbound: rx,
                        sent: Arc::clone(&handle.sent),
                        closed: Arc::clone(&handle.closed),
                    }) as Box<dyn Connection>)
                },
            }
        })
    }

    fn endpoint(&self) -> String {
        "mock://seats".to_string()
    }
}

/// Test-side control of one accepted connection.
#[derive(Clone, Debug)]
pub struct MockConnectionHandle {
    inbound: mpsc::UnboundedSender<Inbound>,
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl MockConnectionHandle {
    /// Deliver a raw text frame to the channel
    pub fn push_frame(&self, frame: impl Into<String>) {
        let _ = self.inbound.send(Inbound::Frame(frame.into()));
    }

    /// Deliver a typed message to the channel
    ///
    /// # Panics
    ///
    /// Panics if the message cannot be serialized.
    #[allow(clippy::expect_used)]
    pub fn push_message(&self, message: &StreamMessage) {
        self.push_frame(serde_json::to_string(message).expect("stream messages serialize"));
    }

    /// End the connection cleanly, as a server close would
    pub fn drop_connection(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let _ = self.inbound.send(Inbound::Close);
    }

    /// Fail the connection with an I/O error
    pub fn fail(&self, reason: impl Into<String>) {
        self.closed.store(true, Ordering::SeqCst);
        let _ = self.inbound.send(Inbound::Error(TransportError::Io(reason.into())));
    }

    /// Frames the channel sent on this connection, in order
    #[must_use]
    pub fn sent(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether either side has closed the connection
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

struct MockConnection {
    inbound: mpsc::UnboundedReceiver<Inbound>,
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl Connection for MockConnection {
    fn send(&mut self, frame: String) -> BoxFuture<'_, Result<(), TransportError>> {
        Box::pin(async move {
            if self.closed.load(Ordering::SeqCst) {
                return Err(TransportError::Closed);
            }
            self.sent
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(frame);
            Ok(())
        })
    }

    fn recv(&mut self) -> BoxFuture<'_, Option<Result<String, TransportError>>> {
        Box::pin(async move {
            match self.inbound.recv().await? {
                Inbound::Frame(frame) => Some(Ok(frame)),
                Inbound::Error(err) => Some(Err(err)),
                Inbound::Close => None,
            }
        })
    }

    fn close(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.closed.store(true, Ordering::SeqCst);
            self.inbound.close();
        })
    }
}
