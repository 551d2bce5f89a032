//! # Logging & Tracing Infrastructure
//!
//! Configures the `tracing-subscriber` stack used by every crate in the
//! workspace, supporting:
//! - Pretty, compact, and JSON output formats
//! - Module-level filtering via `EnvFilter` directives
//! - A `RUST_LOG`-style override for development builds
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
//!
//! let config = LoggingConfig::default()
//!     .with_format(LogFormat::Compact)
//!     .with_directives("info,core_sync=debug");
//!
//! init_logging(config)?;
//! tracing::info!("core initialized");
//! ```

use crate::error::{Error, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// Output format for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Multi-line human-readable output with spans expanded
    Pretty,
    /// Single-line human-readable output
    #[default]
    Compact,
    /// Newline-delimited JSON for log shippers
    Json,
}

/// Configuration for the logging stack.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Output format
    pub format: LogFormat,

    /// `EnvFilter` directives, e.g. `"info,core_sync=debug"`
    pub directives: String,

    /// Whether `RUST_LOG` overrides `directives` when set
    pub respect_env: bool,

    /// Include the event's module target in output
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            directives: "info".to_string(),
            respect_env: true,
            with_target: true,
        }
    }
}

impl LoggingConfig {
    /// Sets the output format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets the filter directives.
    pub fn with_directives(mut self, directives: impl Into<String>) -> Self {
        self.directives = directives.into();
        self
    }

    /// Disables the `RUST_LOG` override.
    pub fn ignore_env(mut self) -> Self {
        self.respect_env = false;
        self
    }

    fn build_filter(&self) -> Result<EnvFilter> {
        if self.respect_env {
            if let Ok(env) = std::env::var(EnvFilter::DEFAULT_ENV) {
                if !env.is_empty() {
                    return EnvFilter::try_new(&env)
                        .map_err(|e| Error::Logging(format!("Invalid RUST_LOG: {}", e)));
                }
            }
        }

        EnvFilter::try_new(&self.directives)
            .map_err(|e| Error::Logging(format!("Invalid filter directives: {}", e)))
    }
}

/// Initializes the global tracing subscriber.
///
/// Must be called at most once per process; a second call returns
/// `Error::Logging` rather than panicking so hosts with their own subscriber
/// can ignore it.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = config.build_filter()?;

    let result = match config.format {
        LogFormat::Pretty => fmt()
            .with_env_filter(filter)
            .with_target(config.with_target)
            .pretty()
            .try_init(),
        LogFormat::Compact => fmt()
            .with_env_filter(filter)
            .with_target(config.with_target)
            .compact()
            .try_init(),
        LogFormat::Json => fmt()
            .with_env_filter(filter)
            .with_target(config.with_target)
            .json()
            .try_init(),
    };

    result.map_err(|e| Error::Logging(format!("Subscriber already set: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.format, LogFormat::Compact);
        assert_eq!(config.directives, "info");
        assert!(config.respect_env);
    }

    #[test]
    fn test_invalid_directives_rejected() {
        let config = LoggingConfig::default()
            .with_directives("not==valid==")
            .ignore_env();
        assert!(matches!(config.build_filter(), Err(Error::Logging(_))));
    }

    #[test]
    fn test_builder_methods() {
        let config = LoggingConfig::default()
            .with_format(LogFormat::Json)
            .with_directives("debug,core_sync=trace");
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.directives, "debug,core_sync=trace");
    }
}
