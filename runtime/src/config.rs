//! Configuration management for the seat-map viewer.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Unset variables take their default; set but unparsable ones are an error.

use crate::backoff::ReconnectPolicy;
use seatmap_core::render::RenderOptions;
use seatmap_core::session::DEFAULT_MAX_SELECTION;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed
    #[error("Invalid value for {name}: {value:?}")]
    Invalid {
        /// Variable name
        name: &'static str,
        /// Raw value
        value: String,
    },
}

/// Viewer configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Event-stream endpoint
    pub stream_url: String,
    /// Backoff base delay in milliseconds
    pub reconnect_base_ms: u64,
    /// Backoff cap in milliseconds
    pub reconnect_max_ms: u64,
    /// Automatic retry cap
    pub reconnect_max_attempts: u32,
    /// Minimum scale for seat labels and checkmarks
    pub label_min_scale: f64,
    /// Maximum seats in one selection
    pub max_selection: usize,
    /// Fallback tracing filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            stream_url: "ws://localhost:8080/api/ws/seats".to_string(),
            reconnect_base_ms: 1000,
            reconnect_max_ms: 30_000,
            reconnect_max_attempts: 5,
            label_min_scale: 0.7,
            max_selection: DEFAULT_MAX_SELECTION,
            log_level: "info".to_string(),
        }
    }
}

impl ViewerConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first variable whose value
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first variable whose value
    /// cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let label_min_scale: f64 =
            parse_var(&lookup, "SEATMAP_LABEL_MIN_SCALE", defaults.label_min_scale)?;
        if !label_min_scale.is_finite() || label_min_scale <= 0.0 {
            return Err(ConfigError::Invalid {
                name: "SEATMAP_LABEL_MIN_SCALE",
                value: label_min_scale.to_string(),
            });
        }

        Ok(Self {
            stream_url: lookup("SEATMAP_STREAM_URL").unwrap_or(defaults.stream_url),
            reconnect_base_ms: parse_var(
                &lookup,
                "SEATMAP_RECONNECT_BASE_MS",
                defaults.reconnect_base_ms,
            )?,
            reconnect_max_ms: parse_var(
                &lookup,
                "SEATMAP_RECONNECT_MAX_MS",
                defaults.reconnect_max_ms,
            )?,
            reconnect_max_attempts: parse_var(
                &lookup,
                "SEATMAP_RECONNECT_MAX_ATTEMPTS",
                defaults.reconnect_max_attempts,
            )?,
            label_min_scale,
            max_selection: parse_var(&lookup, "SEATMAP_MAX_SELECTION", defaults.max_selection)?,
            log_level: lookup("SEATMAP_LOG_LEVEL").unwrap_or(defaults.log_level),
        })
    }

    /// Reconnect policy for the real-time channel
    #[must_use]
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy::builder()
            .max_attempts(self.reconnect_max_attempts)
            .initial_delay(Duration::from_millis(self.reconnect_base_ms))
            .max_delay(Duration::from_millis(self.reconnect_max_ms))
            .build()
    }

    /// Render options with the configured label threshold
    #[must_use]
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            label_min_scale: self.label_min_scale,
            ..RenderOptions::default()
        }
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code

    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ViewerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ViewerConfig::default());

        let policy = config.reconnect_policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(2));
        assert!((config.render_options().label_min_scale - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_overrides() {
        let config = ViewerConfig::from_lookup(lookup(&[
            ("SEATMAP_STREAM_URL", "wss://seats.example/ws"),
            ("SEATMAP_RECONNECT_MAX_ATTEMPTS", "3"),
            ("SEATMAP_MAX_SELECTION", " 4 "),
            ("SEATMAP_LABEL_MIN_SCALE", "0.5"),
        ]))
        .unwrap();

        assert_eq!(config.stream_url, "wss://seats.example/ws");
        assert_eq!(config.reconnect_max_attempts, 3);
        assert_eq!(config.max_selection, 4);
        assert!((config.label_min_scale - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_value_names_variable() {
        let err = ViewerConfig::from_lookup(lookup(&[("SEATMAP_RECONNECT_BASE_MS", "soon")]))
            .unwrap_err();

        assert_eq!(
            err,
            ConfigError::Invalid {
                name: "SEATMAP_RECONNECT_BASE_MS",
                value: "soon".to_string(),
            }
        );
        assert!(err.to_string().contains("SEATMAP_RECONNECT_BASE_MS"));
    }

    #[test]
    fn test_non_positive_label_scale_rejected() {
        let err =
            ViewerConfig::from_lookup(lookup(&[("SEATMAP_LABEL_MIN_SCALE", "0")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "SEATMAP_LABEL_MIN_SCALE",
                ..
            }
        ));
    }
}
