//! Media Store and Remote Store Abstractions
//!
//! Shared asset models plus the traits through which the core talks to the
//! device media library and the remote file service.
//!
//! ## Overview
//!
//! The core never touches a platform photo library or an HTTP endpoint
//! directly. It consumes:
//! - `MediaStore`: the device-side asset inventory (enumerate, inspect,
//!   album bookkeeping, batch delete, import of staged downloads)
//! - `RemoteStore`: the server-side file inventory (list, upload, download)
//! - `ContentHasher`: content hashing for duplicate detection
//!
//! All asset models here are transient snapshots; nothing is cached across
//! operations.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::Result;

/// Opaque identifier for an asset in the device media store.
///
/// Platform libraries use their own id schemes (e.g. `ph://...` style
/// locators), so this wraps a string rather than a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetId(pub String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier for an album in the device media store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlbumId(pub String);

impl AlbumId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlbumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of media held by an asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single asset in the device media store.
///
/// `readable_uri` may be absent when the content is only reachable through an
/// opaque non-file locator; such assets are excluded from hashing and never
/// count as synchronized or as duplicate candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalAsset {
    /// Store-assigned identifier
    pub id: AssetId,

    /// Actual filename, compared case-insensitively everywhere
    pub filename: String,

    /// Content hash, filled in by the duplicate detector when computed
    pub content_hash: Option<String>,

    /// Creation timestamp (Unix seconds)
    pub creation_time: i64,

    /// Photo or video
    pub media_kind: MediaKind,

    /// Locator the content can be read from, if any
    pub readable_uri: Option<String>,
}

impl LocalAsset {
    /// Case-folded filename used as reconciliation identity
    pub fn filename_key(&self) -> String {
        self.filename.to_lowercase()
    }
}

/// A single file in the remote inventory.
///
/// The reconciliation engine needs only name identity for the remote side, so
/// this stays minimal on purpose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    pub filename: String,
}

impl RemoteFile {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
        }
    }

    /// Case-folded filename used as reconciliation identity
    pub fn filename_key(&self) -> String {
        self.filename.to_lowercase()
    }
}

/// Filter for asset enumeration
#[derive(Debug, Clone, Default)]
pub struct AssetFilter {
    /// Restrict to members of a specific album
    pub album: Option<AlbumId>,

    /// Restrict to specific media kinds; empty means all
    pub kinds: Vec<MediaKind>,
}

impl AssetFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn in_album(album: AlbumId) -> Self {
        Self {
            album: Some(album),
            kinds: Vec::new(),
        }
    }
}

/// Outcome of uploading one file to the remote store.
///
/// The server performs its own content-level duplicate check; `duplicate`
/// reports that the content was already present. Callers must count this as
/// "skipped as duplicate", not as a failure or a plain success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadOutcome {
    pub duplicate: bool,
}

/// Device media store trait
///
/// Abstracts the platform asset library (photo roll). Enumeration is cheap
/// and returns ids only; per-asset detail is fetched individually and may
/// fail without poisoning the enumeration.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Enumerate asset ids matching the filter, in stable store order
    async fn enumerate_assets(&self, filter: &AssetFilter) -> Result<Vec<AssetId>>;

    /// Fetch full detail for a single asset
    async fn asset_detail(&self, id: &AssetId) -> Result<LocalAsset>;

    /// Read the asset's content
    ///
    /// Fails when the asset has no readable locator.
    async fn read_asset(&self, asset: &LocalAsset) -> Result<Bytes>;

    /// Find an album by name, creating it if missing
    async fn ensure_album(&self, name: &str) -> Result<AlbumId>;

    /// Ids of all assets currently in the album
    async fn album_members(&self, album: &AlbumId) -> Result<Vec<AssetId>>;

    /// Add assets to an album
    async fn add_to_album(&self, album: &AlbumId, assets: &[AssetId]) -> Result<()>;

    /// Delete assets from the store in a single batch
    ///
    /// All-or-nothing from the caller's perspective; no partial-success
    /// accounting is assumed.
    async fn delete_assets(&self, assets: &[AssetId]) -> Result<()>;

    /// Commit a staged file into the store as a new asset
    async fn import_file(&self, staged: &Path, filename: &str) -> Result<AssetId>;
}

/// Remote file service trait
///
/// The authoritative server-side inventory. Implementations attach the
/// session token and device identity headers to every call.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch the full remote file listing
    async fn list_files(&self) -> Result<Vec<RemoteFile>>;

    /// Upload one file under its actual filename
    async fn upload(&self, filename: &str, content: Bytes) -> Result<UploadOutcome>;

    /// Download one file's binary content
    async fn download(&self, filename: &str) -> Result<Bytes>;
}

/// Content hashing trait
///
/// Hashing is CPU-bound; implementations may run the digest on a blocking
/// worker, but must return a stable hex digest for identical content.
#[async_trait]
pub trait ContentHasher: Send + Sync {
    /// Hash the content behind a readable locator
    ///
    /// # Errors
    ///
    /// - `BridgeError::NotAvailable` when the locator scheme cannot be opened
    /// - any other error when the content cannot be read or digested
    async fn hash(&self, readable_uri: &str) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_key_case_folds() {
        let asset = LocalAsset {
            id: AssetId::new("a1"),
            filename: "IMG_0001.JPG".to_string(),
            content_hash: None,
            creation_time: 1_700_000_000,
            media_kind: MediaKind::Photo,
            readable_uri: Some("file:///photos/IMG_0001.JPG".to_string()),
        };
        assert_eq!(asset.filename_key(), "img_0001.jpg");

        let remote = RemoteFile::new("Img_0001.jpg");
        assert_eq!(remote.filename_key(), asset.filename_key());
    }

    #[test]
    fn test_asset_filter_constructors() {
        assert!(AssetFilter::all().album.is_none());

        let filter = AssetFilter::in_album(AlbumId::new("album-1"));
        assert_eq!(filter.album.as_ref().unwrap().as_str(), "album-1");
        assert!(filter.kinds.is_empty());
    }
}
