//! Content Hashing using SHA-256

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    media::ContentHasher,
};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tracing::debug;

/// SHA-256 content hasher for file-backed assets
///
/// Accepts `file://` URIs and plain paths. Reading happens on the async
/// runtime; the digest itself runs on a blocking worker so a large video
/// never stalls the caller's task.
pub struct Sha256ContentHasher;

impl Sha256ContentHasher {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a readable URI to a filesystem path
    ///
    /// Opaque locators (e.g. `ph://`) cannot be opened here; those assets
    /// must be skipped by the caller.
    fn resolve_path(readable_uri: &str) -> Result<PathBuf> {
        if let Some(path) = readable_uri.strip_prefix("file://") {
            return Ok(PathBuf::from(path));
        }
        if readable_uri.starts_with('/') {
            return Ok(PathBuf::from(readable_uri));
        }
        Err(BridgeError::NotAvailable(format!(
            "Unsupported locator scheme: {}",
            readable_uri
        )))
    }
}

impl Default for Sha256ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentHasher for Sha256ContentHasher {
    async fn hash(&self, readable_uri: &str) -> Result<String> {
        let path = Self::resolve_path(readable_uri)?;

        let data = tokio::fs::read(&path).await.map_err(BridgeError::Io)?;

        let digest = tokio::task::spawn_blocking(move || {
            let mut hasher = Sha256::new();
            hasher.update(&data);
            hex::encode(hasher.finalize())
        })
        .await
        .map_err(|e| BridgeError::OperationFailed(format!("Hash task failed: {}", e)))?;

        debug!(uri = readable_uri, "Hashed asset content");
        Ok(digest)
    }
}
