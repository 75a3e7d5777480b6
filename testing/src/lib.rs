//! # Seatmap Testing
//!
//! Testing utilities and fakes for the seat-map viewer.
//!
//! This crate provides:
//! - [`FixedClock`] for deterministic timestamps
//! - [`RecordingSurface`], a drawing surface that records every call
//! - [`MockTransport`], a scripted event-stream transport
//! - [`ReducerTest`], a Given-When-Then harness for reducers
//! - Venue fixtures in [`fixtures`]
//!
//! ## Example
//!
//! ```ignore
//! use seatmap_testing::{fixtures, test_clock, RecordingSurface};
//!
//! let geometry = fixtures::sample_venue();
//! let mut surface = RecordingSurface::new(800.0, 600.0);
//! RenderEngine::default().render(&geometry, &occupancy, &selection, &viewport, &mut surface);
//! assert!(surface.texts().contains(&"Stage"));
//! ```

pub mod fixtures;
pub mod surface;
pub mod transport;

use chrono::{DateTime, Utc};
use seatmap_core::environment::Clock;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use seatmap_testing::mocks::FixedClock;
    /// use seatmap_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Install a test-friendly tracing subscriber.
///
/// Safe to call from every test; only the first call installs anything.
/// Output goes through the test harness's captured writer.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seatmap_core=debug,seatmap_runtime=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};
pub use reducer_test::{ReducerTest, assertions};
pub use surface::{DrawCall, RecordingSurface};
pub use transport::{ConnectOutcome, MockConnectionHandle, MockTransport};
