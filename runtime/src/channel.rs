//! Real-time channel with automatic reconnection.
//!
//! The channel owns one background worker task per connection lifecycle. The
//! worker opens the [`Transport`], pumps frames in both directions while
//! connected, and on failure schedules a retry with exponential backoff.
//!
//! # State Machine
//!
//! ```text
//!                connect()
//! Disconnected ───────────► Connecting ──handshake ok──► Connected
//!      ▲                        │                            │
//!      │                  handshake error              transport drop
//!      │                        ▼                            │
//!      └──── backoff delay ── Disconnected ◄─────────────────┘
//!                               │
//!                     attempts > max_attempts
//!                               ▼
//!                  ChannelEvent::Unreachable (worker stops)
//! ```
//!
//! All transitions, inbound messages and the terminal signal are delivered to
//! the owner through [`RealtimeChannel::next_event`]. Transport errors never
//! surface as `Err` values. A request that was accepted by `send` but lost
//! with its connection comes back as [`ChannelEvent::SendDiscarded`].

use crate::backoff::{Backoff, ReconnectPolicy};
use crate::log::{ChannelLog, ChannelLogKind};
use seatmap_core::message::{SeatStatusMessage, StreamMessage};
use seatmap_core::transport::{Connection, Transport};
use seatmap_core::types::ConnectionState;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

// ============================================================================
// Public types
// ============================================================================

/// Notifications from the channel to its owner.
#[derive(Clone, Debug, PartialEq)]
pub enum ChannelEvent {
    /// Connection state changed
    StateChanged(ConnectionState),
    /// A structured message arrived
    Message(StreamMessage),
    /// Automatic reconnection gave up; only [`RealtimeChannel::reconnect`]
    /// or [`RealtimeChannel::connect`] restarts it
    Unreachable {
        /// Consecutive failed attempts
        attempts: u32,
    },
    /// A request accepted by [`RealtimeChannel::send`] never reached the
    /// server; the connection failed before or while writing it
    SendDiscarded {
        /// The request that was dropped
        message: SeatStatusMessage,
        /// Why it was dropped
        reason: String,
    },
}

/// Errors returned by [`RealtimeChannel::send`].
#[derive(Error, Debug)]
pub enum SendError {
    /// The channel is not connected; nothing was queued
    #[error("Channel not connected (state: {state})")]
    NotConnected {
        /// State at the time of the call
        state: ConnectionState,
    },

    /// The message could not be encoded
    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

// ============================================================================
// Shared state
// ============================================================================

#[derive(Debug)]
struct Shared {
    state: watch::Sender<ConnectionState>,
    events: mpsc::UnboundedSender<ChannelEvent>,
    log: ChannelLog,
}

impl Shared {
    fn publish_state(&self, to: ConnectionState) {
        let mut from = to;
        let changed = self.state.send_if_modified(|current| {
            if *current == to {
                return false;
            }
            from = *current;
            *current = to;
            true
        });

        if changed {
            tracing::debug!(%from, %to, "Channel state changed");
            self.log.record(ChannelLogKind::StateChanged { from, to });
            let _ = self.events.send(ChannelEvent::StateChanged(to));
        }
    }
}

/// Set once the owner detaches a worker; the worker must publish nothing after.
type CancelFlag = Arc<Mutex<bool>>;

fn lock_flag(flag: &CancelFlag) -> MutexGuard<'_, bool> {
    flag.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A queued request and its encoded frame.
#[derive(Debug)]
struct Outbound {
    message: SeatStatusMessage,
    frame: String,
}

#[derive(Debug)]
struct Worker {
    shutdown: oneshot::Sender<()>,
    outbound: mpsc::UnboundedSender<Outbound>,
    cancelled: CancelFlag,
    handle: JoinHandle<()>,
}

// ============================================================================
// RealtimeChannel
// ============================================================================

/// Event-stream client with reconnect.
///
/// `connect`, `reconnect` and the worker they start require a Tokio runtime.
pub struct RealtimeChannel {
    transport: Arc<dyn Transport>,
    policy: ReconnectPolicy,
    shared: Arc<Shared>,
    events: mpsc::UnboundedReceiver<ChannelEvent>,
    worker: Option<Worker>,
}

impl RealtimeChannel {
    /// Creates a disconnected channel
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, policy: ReconnectPolicy) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        let (events_tx, events) = mpsc::unbounded_channel();
        Self {
            transport,
            policy,
            shared: Arc::new(Shared {
                state,
                events: events_tx,
                log: ChannelLog::new(),
            }),
            events,
            worker: None,
        }
    }

    /// Current connection state
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    /// Subscribe to state changes
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    /// The channel's event log
    #[must_use]
    pub fn log(&self) -> &ChannelLog {
        &self.shared.log
    }

    /// Endpoint of the underlying transport
    #[must_use]
    pub fn endpoint(&self) -> String {
        self.transport.endpoint()
    }

    /// Start connecting.
    ///
    /// Does nothing while a worker is already connecting, connected or
    /// waiting to retry.
    pub fn connect(&mut self) {
        if self
            .worker
            .as_ref()
            .is_some_and(|worker| !worker.handle.is_finished())
        {
            return;
        }
        self.stop_worker();
        tracing::info!(endpoint = %self.transport.endpoint(), "Connecting to event stream");
        self.spawn_worker();
    }

    /// Drop any connection or pending retry and connect again immediately,
    /// with the attempt counter reset to zero.
    pub fn reconnect(&mut self) {
        tracing::info!(endpoint = %self.transport.endpoint(), "Manual reconnect");
        self.stop_worker();
        self.spawn_worker();
    }

    /// Cancel any pending retry and close the active connection.
    ///
    /// Idempotent; safe in any state.
    pub fn disconnect(&mut self) {
        if self.stop_worker() {
            tracing::info!("Disconnected from event stream");
        }
        self.shared.publish_state(ConnectionState::Disconnected);
    }

    /// Send a hold/release request.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::NotConnected`] outside `Connected`; the message is
    /// not queued. Returns [`SendError::Encode`] if serialization fails.
    pub fn send(&self, message: &SeatStatusMessage) -> Result<(), SendError> {
        let state = self.state();
        let outbound = match &self.worker {
            Some(worker) if state == ConnectionState::Connected => &worker.outbound,
            _ => return Err(self.reject_send(state)),
        };

        let frame = message.to_frame()?;
        let request = Outbound {
            message: message.clone(),
            frame,
        };
        if outbound.send(request).is_err() {
            return Err(self.reject_send(ConnectionState::Disconnected));
        }
        Ok(())
    }

    /// Wait for the next event.
    ///
    /// Cancel-safe.
    pub async fn next_event(&mut self) -> Option<ChannelEvent> {
        self.events.recv().await
    }

    /// Next event if one is ready
    pub fn try_next_event(&mut self) -> Option<ChannelEvent> {
        self.events.try_recv().ok()
    }

    fn reject_send(&self, state: ConnectionState) -> SendError {
        tracing::debug!(%state, "Send rejected; channel not connected");
        self.shared.log.record(ChannelLogKind::SendRejected { state });
        SendError::NotConnected { state }
    }

    fn spawn_worker(&mut self) {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let cancelled = CancelFlag::default();

        let task = WorkerTask {
            transport: Arc::clone(&self.transport),
            backoff: Backoff::new(self.policy),
            shared: Arc::clone(&self.shared),
            cancelled: Arc::clone(&cancelled),
            shutdown: shutdown_rx,
            outbound: outbound_rx,
        };
        // Published before spawning so the caller observes `Connecting` at once.
        task.transition(ConnectionState::Connecting);

        let handle = tokio::spawn(task.run());
        self.worker = Some(Worker {
            shutdown: shutdown_tx,
            outbound: outbound_tx,
            cancelled,
            handle,
        });
    }

    /// Detach the current worker. Returns whether there was one.
    fn stop_worker(&mut self) -> bool {
        let Some(worker) = self.worker.take() else {
            return false;
        };
        *lock_flag(&worker.cancelled) = true;
        let _ = worker.shutdown.send(());
        true
    }
}

impl Drop for RealtimeChannel {
    fn drop(&mut self) {
        self.stop_worker();
    }
}

impl std::fmt::Debug for RealtimeChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeChannel")
            .field("endpoint", &self.transport.endpoint())
            .field("state", &self.state())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Worker
// ============================================================================

enum PumpEnd {
    Shutdown,
    Lost(String),
}

struct WorkerTask {
    transport: Arc<dyn Transport>,
    backoff: Backoff,
    shared: Arc<Shared>,
    cancelled: CancelFlag,
    shutdown: oneshot::Receiver<()>,
    outbound: mpsc::UnboundedReceiver<Outbound>,
}

impl WorkerTask {
    /// Publish a state change unless detached. Returns `false` once detached.
    fn transition(&self, to: ConnectionState) -> bool {
        let cancelled = lock_flag(&self.cancelled);
        if *cancelled {
            return false;
        }
        self.shared.publish_state(to);
        true
    }

    fn emit(&self, event: ChannelEvent) -> bool {
        let cancelled = lock_flag(&self.cancelled);
        if *cancelled {
            return false;
        }
        let _ = self.shared.events.send(event);
        true
    }

    async fn run(mut self) {
        let endpoint = self.transport.endpoint();

        loop {
            if !self.transition(ConnectionState::Connecting) {
                return;
            }

            let opened = tokio::select! {
                biased;
                _ = &mut self.shutdown => return,
                result = self.transport.open() => result,
            };

            match opened {
                Ok(mut connection) => {
                    self.backoff.reset();
                    if !self.transition(ConnectionState::Connected) {
                        connection.close().await;
                        return;
                    }
                    tracing::info!(endpoint = %endpoint, "Event stream connected");

                    let end = self.pump(connection.as_mut()).await;
                    connection.close().await;
                    self.discard_pending("connection lost before send");

                    match end {
                        PumpEnd::Shutdown => return,
                        PumpEnd::Lost(reason) => {
                            tracing::warn!(endpoint = %endpoint, reason = %reason, "Event stream lost");
                        },
                    }
                },
                Err(err) => {
                    tracing::warn!(endpoint = %endpoint, error = %err, "Event stream connect failed");
                },
            }

            if !self.transition(ConnectionState::Disconnected) {
                return;
            }

            let Some(delay) = self.backoff.next_delay() else {
                let attempts = self.backoff.attempt();
                tracing::error!(endpoint = %endpoint, attempts, "Event stream unreachable; giving up");
                self.shared.log.record(ChannelLogKind::Unreachable { attempts });
                self.emit(ChannelEvent::Unreachable { attempts });
                return;
            };

            let attempt = self.backoff.attempt();
            metrics::counter!("seatmap_channel_reconnects_total").increment(1);
            self.shared
                .log
                .record(ChannelLogKind::ReconnectScheduled { attempt, delay });
            #[allow(clippy::cast_possible_truncation)] // Delays are capped well below u64::MAX ms
            let delay_ms = delay.as_millis() as u64;
            tracing::info!(attempt, delay_ms, "Reconnect scheduled");

            tokio::select! {
                biased;
                _ = &mut self.shutdown => return,
                () = tokio::time::sleep(delay) => {},
            }
        }
    }

    async fn pump(&mut self, connection: &mut dyn Connection) -> PumpEnd {
        loop {
            tokio::select! {
                biased;
                _ = &mut self.shutdown => return PumpEnd::Shutdown,
                Some(request) = self.outbound.recv() => {
                    match connection.send(request.frame.clone()).await {
                        Ok(()) => self.shared.log.record(ChannelLogKind::Sent { frame: request.frame }),
                        Err(err) => {
                            let reason = err.to_string();
                            self.drop_request(request, &reason);
                            return PumpEnd::Lost(reason);
                        },
                    }
                },
                inbound = connection.recv() => match inbound {
                    Some(Ok(frame)) => self.deliver(frame),
                    Some(Err(err)) => return PumpEnd::Lost(err.to_string()),
                    None => return PumpEnd::Lost("closed by peer".to_string()),
                },
            }
        }
    }

    fn deliver(&self, frame: String) {
        match StreamMessage::parse(&frame) {
            Ok(message) => {
                self.shared.log.record(ChannelLogKind::Received {
                    kind: message.kind(),
                });
                self.emit(ChannelEvent::Message(message));
            },
            Err(err) => {
                metrics::counter!("seatmap_channel_messages_discarded_total").increment(1);
                tracing::warn!(error = %err, payload = %frame, "Discarding malformed stream message");
                self.shared.log.record(ChannelLogKind::Discarded {
                    reason: err.to_string(),
                    payload: frame,
                });
            },
        }
    }

    fn discard_pending(&mut self, reason: &str) {
        while let Ok(request) = self.outbound.try_recv() {
            self.drop_request(request, reason);
        }
    }

    /// Log a lost request and hand it back to the owner.
    ///
    /// Not gated by the cancel flag; the owner still holds the local change.
    fn drop_request(&self, request: Outbound, reason: &str) {
        tracing::warn!(seat_id = %request.message.seat_id, frame = %request.frame, reason, "Dropping unsent request");
        self.shared.log.record(ChannelLogKind::Discarded {
            reason: reason.to_string(),
            payload: request.frame,
        });
        let _ = self.shared.events.send(ChannelEvent::SendDiscarded {
            message: request.message,
            reason: reason.to_string(),
        });
    }
}
