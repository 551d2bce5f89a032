//! Staging-File Access using Tokio FS

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::FileSystemAccess,
};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Tokio-based file system implementation
///
/// Stages downloads under a dedicated directory that the host may reclaim.
pub struct TokioFileSystem {
    staging_dir: PathBuf,
}

impl TokioFileSystem {
    /// Create a file system rooted at the system temp directory
    pub fn new() -> Self {
        Self {
            staging_dir: std::env::temp_dir().join("photoback-staging"),
        }
    }

    /// Create a file system with a custom staging directory
    pub fn with_staging_dir(staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            staging_dir: staging_dir.into(),
        }
    }
}

impl Default for TokioFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileSystemAccess for TokioFileSystem {
    async fn staging_directory(&self) -> Result<PathBuf> {
        Ok(self.staging_dir.clone())
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        Ok(tokio::fs::try_exists(path).await.unwrap_or(false))
    }

    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(BridgeError::Io)
    }

    async fn read_file(&self, path: &Path) -> Result<Bytes> {
        let data = tokio::fs::read(path).await.map_err(BridgeError::Io)?;
        Ok(Bytes::from(data))
    }

    async fn write_file(&self, path: &Path, data: Bytes) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(BridgeError::Io)?;
        }
        tokio::fs::write(path, &data).await.map_err(BridgeError::Io)?;
        debug!(path = ?path, bytes = data.len(), "Wrote staged file");
        Ok(())
    }

    async fn delete_file(&self, path: &Path) -> Result<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            // Already gone counts as deleted
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BridgeError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_read_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let fs = TokioFileSystem::with_staging_dir(dir.path());
        let path = dir.path().join("nested").join("IMG_0001.jpg");

        fs.write_file(&path, Bytes::from_static(b"jpeg-bytes"))
            .await
            .unwrap();
        assert!(fs.exists(&path).await.unwrap());

        let data = fs.read_file(&path).await.unwrap();
        assert_eq!(&data[..], b"jpeg-bytes");

        fs.delete_file(&path).await.unwrap();
        assert!(!fs.exists(&path).await.unwrap());

        // Deleting a missing file is not an error
        fs.delete_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_staging_directory() {
        let fs = TokioFileSystem::with_staging_dir("/tmp/photoback-test");
        assert_eq!(
            fs.staging_directory().await.unwrap(),
            PathBuf::from("/tmp/photoback-test")
        );
    }
}
