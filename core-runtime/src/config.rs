//! # Core Configuration Module
//!
//! Provides configuration management for the Photo Backup Core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds all necessary dependencies and settings for the core
//! library. It enforces fail-fast validation so a half-configured core never
//! reaches the point of sending requests.
//!
//! ## Required Dependencies
//!
//! - `SecureStore` - session token persistence
//! - `SettingsStore` - server settings, remembered email, identity records
//!
//! ## Optional Dependencies (with platform defaults)
//!
//! - `HttpClient` - HTTP operations (desktop default: reqwest)
//! - `FileSystemAccess` - staging-file I/O (desktop default: tokio fs)
//!
//! When the `desktop-shims` feature is enabled, desktop-ready defaults for
//! `HttpClient` and `FileSystemAccess` are injected automatically if not
//! provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, ServerMode};
//!
//! let config = CoreConfig::builder()
//!     .server_host("https://backup.local:4000")
//!     .server_mode(ServerMode::Local)
//!     .staging_dir("/tmp/photoback-staging")
//!     .secure_store(secure_store)
//!     .settings_store(settings_store)
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::storage::SettingsStore;
use bridge_traits::{FileSystemAccess, HttpClient, SecureStore};
use std::path::PathBuf;
use std::sync::Arc;

/// Settings key for the persisted server connection mode.
pub const SETTING_SERVER_MODE: &str = "server.mode";

/// Settings key for the persisted server host.
pub const SETTING_SERVER_HOST: &str = "server.host";

/// How the client reaches the file service host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerMode {
    /// Self-hosted server on the local network
    #[default]
    Local,
    /// Server reachable over the public internet
    Remote,
}

impl ServerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerMode::Local => "local",
            ServerMode::Remote => "remote",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "local" => Some(ServerMode::Local),
            "remote" => Some(ServerMode::Remote),
            _ => None,
        }
    }
}

impl std::fmt::Display for ServerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User-entered server connection settings.
///
/// Persisted through the `SettingsStore`; the core never hardcodes a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub mode: ServerMode,
    /// Base URL of the file service, e.g. `https://backup.local:4000`
    pub host: String,
}

impl ServerSettings {
    pub fn new(mode: ServerMode, host: impl Into<String>) -> Self {
        Self {
            mode,
            host: host.into(),
        }
    }

    /// Validates the host string.
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(Error::Config("Server host cannot be empty".to_string()));
        }
        if !self.host.starts_with("http://") && !self.host.starts_with("https://") {
            return Err(Error::Config(format!(
                "Server host must include an http(s) scheme: {}",
                self.host
            )));
        }
        Ok(())
    }

    /// Loads persisted settings, if any.
    pub async fn load(store: &dyn SettingsStore) -> Result<Option<Self>> {
        let host = store
            .get_string(SETTING_SERVER_HOST)
            .await
            .map_err(|e| Error::Config(e.to_string()))?;

        let Some(host) = host else {
            return Ok(None);
        };

        let mode = store
            .get_string(SETTING_SERVER_MODE)
            .await
            .map_err(|e| Error::Config(e.to_string()))?
            .and_then(|s| ServerMode::parse(&s))
            .unwrap_or_default();

        Ok(Some(Self { mode, host }))
    }

    /// Persists the settings for the next cold start.
    pub async fn persist(&self, store: &dyn SettingsStore) -> Result<()> {
        self.validate()?;
        store
            .set_string(SETTING_SERVER_MODE, self.mode.as_str())
            .await
            .map_err(|e| Error::Config(e.to_string()))?;
        store
            .set_string(SETTING_SERVER_HOST, &self.host)
            .await
            .map_err(|e| Error::Config(e.to_string()))?;
        Ok(())
    }
}

/// Tuning knobs for transfer execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSettings {
    /// Timeout for an individual HTTP request (seconds)
    pub request_timeout_secs: u64,

    /// Retry attempts for transient remote errors (429/5xx)
    pub retry_attempts: u32,

    /// Event bus buffer size
    pub event_buffer: usize,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: 60,
            retry_attempts: 3,
            event_buffer: 100,
        }
    }
}

/// Core configuration for the Photo Backup Core.
///
/// Holds all dependencies and settings required to initialize the core.
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Server connection settings
    pub server: ServerSettings,

    /// Directory downloads are staged into before being committed
    pub staging_dir: PathBuf,

    /// Name of the device album marking already-synced (restored) content
    pub synced_album_name: String,

    /// Transfer tuning
    pub transfer: TransferSettings,

    /// HTTP client for the file service (optional with desktop default)
    pub http_client: Option<Arc<dyn HttpClient>>,

    /// Staging-file access (optional with desktop default)
    pub file_system: Option<Arc<dyn FileSystemAccess>>,

    /// Secure credential storage (required)
    pub secure_store: Arc<dyn SecureStore>,

    /// User preferences storage (required)
    pub settings_store: Arc<dyn SettingsStore>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("server", &self.server)
            .field("staging_dir", &self.staging_dir)
            .field("synced_album_name", &self.synced_album_name)
            .field("transfer", &self.transfer)
            .field(
                "http_client",
                &self.http_client.as_ref().map(|_| "HttpClient { ... }"),
            )
            .field(
                "file_system",
                &self.file_system.as_ref().map(|_| "FileSystemAccess { ... }"),
            )
            .field("secure_store", &"SecureStore { ... }")
            .field("settings_store", &"SettingsStore { ... }")
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;

        if self.staging_dir.as_os_str().is_empty() {
            return Err(Error::Config("Staging directory cannot be empty".to_string()));
        }

        if self.synced_album_name.is_empty() {
            return Err(Error::Config(
                "Synced album name cannot be empty".to_string(),
            ));
        }

        if self.transfer.request_timeout_secs == 0 {
            return Err(Error::Config(
                "Request timeout must be greater than 0 seconds".to_string(),
            ));
        }

        Ok(())
    }

    /// Returns the HTTP client, failing fast when no implementation is wired.
    pub fn require_http_client(&self) -> Result<Arc<dyn HttpClient>> {
        self.http_client
            .clone()
            .ok_or_else(|| Error::CapabilityMissing {
                capability: "HttpClient".to_string(),
                message: "No HTTP client implementation provided. \
                          Desktop: enable the desktop-shims feature. \
                          Mobile: inject a platform-native adapter."
                    .to_string(),
            })
    }

    /// Returns the staging-file access, failing fast when none is wired.
    pub fn require_file_system(&self) -> Result<Arc<dyn FileSystemAccess>> {
        self.file_system
            .clone()
            .ok_or_else(|| Error::CapabilityMissing {
                capability: "FileSystemAccess".to_string(),
                message: "No file system implementation provided. \
                          Desktop: enable the desktop-shims feature. \
                          Mobile: inject a platform-native adapter."
                    .to_string(),
            })
    }
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    server_mode: ServerMode,
    server_host: Option<String>,
    staging_dir: Option<PathBuf>,
    synced_album_name: Option<String>,
    transfer: Option<TransferSettings>,
    http_client: Option<Arc<dyn HttpClient>>,
    file_system: Option<Arc<dyn FileSystemAccess>>,
    secure_store: Option<Arc<dyn SecureStore>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
}

impl CoreConfigBuilder {
    /// Sets the server connection mode.
    pub fn server_mode(mut self, mode: ServerMode) -> Self {
        self.server_mode = mode;
        self
    }

    /// Sets the file service base URL.
    pub fn server_host(mut self, host: impl Into<String>) -> Self {
        self.server_host = Some(host.into());
        self
    }

    /// Sets the staging directory for downloads.
    pub fn staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    /// Sets the name of the already-synced album.
    pub fn synced_album_name(mut self, name: impl Into<String>) -> Self {
        self.synced_album_name = Some(name.into());
        self
    }

    /// Sets the transfer tuning knobs.
    pub fn transfer(mut self, transfer: TransferSettings) -> Self {
        self.transfer = Some(transfer);
        self
    }

    /// Injects an HTTP client implementation.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Injects a staging-file access implementation.
    pub fn file_system(mut self, fs: Arc<dyn FileSystemAccess>) -> Self {
        self.file_system = Some(fs);
        self
    }

    /// Injects the secure credential store (required).
    pub fn secure_store(mut self, store: Arc<dyn SecureStore>) -> Self {
        self.secure_store = Some(store);
        self
    }

    /// Injects the settings store (required).
    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::CapabilityMissing` for absent required bridges and
    /// `Error::Config` for invalid settings.
    pub fn build(self) -> Result<CoreConfig> {
        let secure_store = self
            .secure_store
            .ok_or_else(|| Error::CapabilityMissing {
                capability: "SecureStore".to_string(),
                message: "A secure store is required for session token persistence".to_string(),
            })?;

        let settings_store = self
            .settings_store
            .ok_or_else(|| Error::CapabilityMissing {
                capability: "SettingsStore".to_string(),
                message: "A settings store is required for server and identity persistence"
                    .to_string(),
            })?;

        let server_host = self
            .server_host
            .ok_or_else(|| Error::Config("Server host is required".to_string()))?;

        #[allow(unused_mut)]
        let mut http_client = self.http_client;
        #[allow(unused_mut)]
        let mut file_system = self.file_system;

        #[cfg(feature = "desktop-shims")]
        {
            if http_client.is_none() {
                http_client = Some(Arc::new(bridge_desktop::ReqwestHttpClient::new()));
            }
            if file_system.is_none() {
                file_system = Some(Arc::new(bridge_desktop::TokioFileSystem::new()));
            }
        }

        let config = CoreConfig {
            server: ServerSettings::new(self.server_mode, server_host),
            staging_dir: self
                .staging_dir
                .unwrap_or_else(|| std::env::temp_dir().join("photoback-staging")),
            synced_album_name: self
                .synced_album_name
                .unwrap_or_else(|| "Synced".to_string()),
            transfer: self.transfer.unwrap_or_default(),
            http_client,
            file_system,
            secure_store,
            settings_store,
        };

        config.validate()?;
        Ok(config)
    }
}
