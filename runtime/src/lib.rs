//! # Seatmap Runtime
//!
//! Asynchronous shell around `seatmap-core`.
//!
//! ## Core Components
//!
//! - **RealtimeChannel**: event-stream client with a connection state machine
//!   and exponential-backoff reconnect
//! - **Viewer**: the cooperative event loop that reduces user input and
//!   channel events, executes effects, and redraws
//! - **WebSocketTransport**: production [`Transport`](seatmap_core::Transport)
//! - **ViewerConfig**: environment-driven configuration
//!
//! ## Example
//!
//! ```ignore
//! use seatmap_runtime::{ViewerConfig, Viewer, WebSocketTransport};
//!
//! let config = ViewerConfig::from_env()?;
//! let transport = Arc::new(WebSocketTransport::new(&config.stream_url));
//! let mut viewer = Viewer::new(geometry, &config, transport, surface, Arc::new(SystemClock));
//!
//! viewer.start();
//! viewer.run(inputs).await;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Reconnect policy with exponential backoff
pub mod backoff;

/// Real-time channel state machine
pub mod channel;

/// Environment configuration
pub mod config;

/// Bounded channel event log
pub mod log;

/// Tracing initialisation
pub mod telemetry;

/// Viewer event loop
pub mod viewer;

/// WebSocket transport
pub mod websocket;

pub use backoff::{Backoff, ReconnectPolicy};
pub use channel::{ChannelEvent, RealtimeChannel, SendError};
pub use config::{ConfigError, ViewerConfig};
pub use log::{ChannelLog, ChannelLogEntry, ChannelLogKind};
pub use telemetry::init_tracing;
pub use viewer::{Viewer, ViewerInput};
pub use websocket::WebSocketTransport;
