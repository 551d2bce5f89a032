//! Local Inventory Scanner
//!
//! Builds the local snapshot consumed by planning and duplicate detection.
//!
//! ## Overview
//!
//! A scan enumerates the device media store in stable order, fetches per-asset
//! detail, and records which assets are members of the already-synced album.
//! Per-asset inspection failures are counted and skipped; one corrupt asset
//! never aborts the scan. Enumeration or album failures abort the scan, since
//! no meaningful plan can be computed from a partial listing.

use crate::error::{InventoryError, Result};
use crate::snapshot::LocalSnapshot;
use bridge_traits::media::{AssetFilter, MediaStore};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Accounting for one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Ids returned by enumeration
    pub enumerated: u64,
    /// Assets that produced full detail and entered the snapshot
    pub included: u64,
    /// Assets confirmed present in the already-synced album
    pub synced_members: u64,
    /// Assets whose detail fetch failed and were skipped
    pub inspect_failures: u64,
}

/// Result of one local scan: the snapshot plus its accounting.
#[derive(Debug, Clone)]
pub struct LocalScan {
    pub snapshot: LocalSnapshot,
    pub stats: ScanStats,
}

/// Scans the device media store into an immutable snapshot.
pub struct InventoryScanner {
    media_store: Arc<dyn MediaStore>,
    synced_album_name: String,
}

impl InventoryScanner {
    /// Creates a scanner over the given media store.
    ///
    /// # Arguments
    ///
    /// * `media_store` - Device asset library bridge
    /// * `synced_album_name` - Name of the album marking already-synced content
    pub fn new(media_store: Arc<dyn MediaStore>, synced_album_name: impl Into<String>) -> Self {
        Self {
            media_store,
            synced_album_name: synced_album_name.into(),
        }
    }

    /// Takes a fresh snapshot of the local inventory.
    ///
    /// # Errors
    ///
    /// Fails only when enumeration or the synced album itself is unavailable;
    /// individual asset inspection failures are absorbed into the stats.
    #[instrument(skip(self))]
    pub async fn scan(&self) -> Result<LocalScan> {
        let album = self
            .media_store
            .ensure_album(&self.synced_album_name)
            .await
            .map_err(|e| InventoryError::Album {
                name: self.synced_album_name.clone(),
                message: e.to_string(),
            })?;

        let synced_ids: HashSet<_> = self
            .media_store
            .album_members(&album)
            .await
            .map_err(|e| InventoryError::Album {
                name: self.synced_album_name.clone(),
                message: e.to_string(),
            })?
            .into_iter()
            .collect();

        let ids = self
            .media_store
            .enumerate_assets(&AssetFilter::all())
            .await
            .map_err(|e| InventoryError::Enumeration(e.to_string()))?;

        let mut stats = ScanStats {
            enumerated: ids.len() as u64,
            ..ScanStats::default()
        };

        let mut assets = Vec::with_capacity(ids.len());
        for id in &ids {
            match self.media_store.asset_detail(id).await {
                Ok(asset) => {
                    if synced_ids.contains(&asset.id) {
                        stats.synced_members += 1;
                    }
                    stats.included += 1;
                    assets.push(asset);
                }
                Err(e) => {
                    warn!(asset_id = %id, error = %e, "Skipping uninspectable asset");
                    stats.inspect_failures += 1;
                }
            }
        }

        debug!(
            enumerated = stats.enumerated,
            included = stats.included,
            synced = stats.synced_members,
            failed = stats.inspect_failures,
            "Local scan complete"
        );
        info!("Scanned {} local assets", stats.included);

        Ok(LocalScan {
            snapshot: LocalSnapshot::new(assets, synced_ids),
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::media::{AlbumId, AssetId, LocalAsset, MediaKind};
    use bytes::Bytes;
    use std::path::Path;

    struct FakeMediaStore {
        assets: Vec<LocalAsset>,
        synced: Vec<AssetId>,
        broken: Vec<AssetId>,
    }

    #[async_trait]
    impl MediaStore for FakeMediaStore {
        async fn enumerate_assets(&self, _filter: &AssetFilter) -> BridgeResult<Vec<AssetId>> {
            Ok(self.assets.iter().map(|a| a.id.clone()).collect())
        }

        async fn asset_detail(&self, id: &AssetId) -> BridgeResult<LocalAsset> {
            if self.broken.contains(id) {
                return Err(BridgeError::OperationFailed("metadata fetch failed".into()));
            }
            self.assets
                .iter()
                .find(|a| &a.id == id)
                .cloned()
                .ok_or_else(|| BridgeError::OperationFailed("unknown asset".into()))
        }

        async fn read_asset(&self, _asset: &LocalAsset) -> BridgeResult<Bytes> {
            Ok(Bytes::new())
        }

        async fn ensure_album(&self, _name: &str) -> BridgeResult<AlbumId> {
            Ok(AlbumId::new("synced-album"))
        }

        async fn album_members(&self, _album: &AlbumId) -> BridgeResult<Vec<AssetId>> {
            Ok(self.synced.clone())
        }

        async fn add_to_album(&self, _album: &AlbumId, _assets: &[AssetId]) -> BridgeResult<()> {
            Ok(())
        }

        async fn delete_assets(&self, _assets: &[AssetId]) -> BridgeResult<()> {
            Ok(())
        }

        async fn import_file(&self, _staged: &Path, _filename: &str) -> BridgeResult<AssetId> {
            Ok(AssetId::new("imported"))
        }
    }

    fn asset(id: &str, filename: &str) -> LocalAsset {
        LocalAsset {
            id: AssetId::new(id),
            filename: filename.to_string(),
            content_hash: None,
            creation_time: 100,
            media_kind: MediaKind::Photo,
            readable_uri: Some(format!("file:///photos/{}", filename)),
        }
    }

    #[tokio::test]
    async fn test_scan_counts_synced_members() {
        let store = FakeMediaStore {
            assets: vec![asset("a1", "IMG_1.JPG"), asset("a2", "img_2.jpg")],
            synced: vec![AssetId::new("a2")],
            broken: vec![],
        };
        let scanner = InventoryScanner::new(Arc::new(store), "Synced");

        let scan = scanner.scan().await.unwrap();
        assert_eq!(scan.stats.enumerated, 2);
        assert_eq!(scan.stats.included, 2);
        assert_eq!(scan.stats.synced_members, 1);
        assert_eq!(scan.snapshot.upload_candidates().count(), 1);
    }

    #[tokio::test]
    async fn test_inspect_failure_skips_without_aborting() {
        let store = FakeMediaStore {
            assets: vec![asset("a1", "IMG_1.JPG"), asset("a2", "img_2.jpg")],
            synced: vec![],
            broken: vec![AssetId::new("a1")],
        };
        let scanner = InventoryScanner::new(Arc::new(store), "Synced");

        let scan = scanner.scan().await.unwrap();
        assert_eq!(scan.stats.inspect_failures, 1);
        assert_eq!(scan.stats.included, 1);
        assert_eq!(scan.snapshot.assets()[0].id.as_str(), "a2");
    }
}
