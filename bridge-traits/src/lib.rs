//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the backup core and
//! platform-specific implementations. Each trait represents a capability that
//! the core requires but that must be implemented differently per platform
//! (desktop shell, iOS, Android).
//!
//! ## Traits
//!
//! ### Networking & I/O
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations with bearer auth and TLS
//! - [`FileSystemAccess`](storage::FileSystemAccess) - Staging-file I/O for downloads
//!
//! ### Security & Storage
//! - [`SecureStore`](storage::SecureStore) - Session token persistence (Keychain/Keystore)
//! - [`SettingsStore`](storage::SettingsStore) - Server settings, remembered email, identity records
//!
//! ### Inventories
//! - [`MediaStore`](media::MediaStore) - Device asset library: enumerate, inspect, albums, batch delete
//! - [`RemoteStore`](media::RemoteStore) - Remote file service: list, upload, download
//! - [`ContentHasher`](media::ContentHasher) - Content hashing for duplicate detection
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with descriptive errors when a required capability is
//! missing, rather than sending half-configured requests:
//!
//! ```ignore
//! let http_client = config.http_client
//!     .ok_or_else(|| Error::CapabilityMissing {
//!         capability: "HttpClient".to_string(),
//!         message: "No HTTP client implementation provided. \
//!                  Desktop: ensure default feature is enabled. \
//!                  Mobile: inject platform-native adapter.".to_string()
//!     })?;
//! ```
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type.
//! Platform implementations should convert platform-specific errors to
//! `BridgeError` with actionable messages and context.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds to support safe concurrent
//! usage across async tasks.

pub mod error;
pub mod http;
pub mod media;
pub mod storage;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use media::{
    AlbumId, AssetFilter, AssetId, ContentHasher, LocalAsset, MediaKind, MediaStore, RemoteFile,
    RemoteStore, UploadOutcome,
};
pub use storage::{FileSystemAccess, SecureStore, SettingsStore};
