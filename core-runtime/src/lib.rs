//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the Photo Backup Core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the core runtime utilities that other modules depend
//! on. It establishes the logging conventions, configuration validation, and
//! event broadcasting mechanisms used throughout the system.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder, ServerMode, ServerSettings, TransferSettings};
pub use error::{Error, Result};
pub use events::{CoreEvent, DedupEvent, EventBus, EventStream, IdentityEvent, SyncEvent};
pub use logging::{init_logging, LogFormat, LoggingConfig};
