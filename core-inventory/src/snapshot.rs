//! Inventory Snapshots
//!
//! Immutable, point-in-time listings of one side of the reconciliation.
//! Every pass takes two fresh snapshots; nothing is diffed across passes.

use bridge_traits::media::{AssetId, LocalAsset, RemoteFile};
use std::collections::HashSet;

/// Point-in-time listing of the device media store.
///
/// Holds every inspectable asset in stable enumeration order, plus the set of
/// asset ids confirmed present in the already-synced album. The synced set
/// only narrows *upload* candidates; downloads and duplicate detection see
/// the full inventory.
#[derive(Debug, Clone, Default)]
pub struct LocalSnapshot {
    assets: Vec<LocalAsset>,
    synced_asset_ids: HashSet<AssetId>,
}

impl LocalSnapshot {
    pub fn new(assets: Vec<LocalAsset>, synced_asset_ids: HashSet<AssetId>) -> Self {
        Self {
            assets,
            synced_asset_ids,
        }
    }

    /// All assets, in stable enumeration order.
    pub fn assets(&self) -> &[LocalAsset] {
        &self.assets
    }

    /// Assets eligible for upload planning: everything not already confirmed
    /// synced via the album.
    pub fn upload_candidates(&self) -> impl Iterator<Item = &LocalAsset> {
        self.assets
            .iter()
            .filter(|asset| !self.synced_asset_ids.contains(&asset.id))
    }

    /// Case-folded filename set over the full inventory.
    pub fn filename_keys(&self) -> HashSet<String> {
        self.assets.iter().map(|a| a.filename_key()).collect()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

/// Point-in-time listing of the remote file service.
#[derive(Debug, Clone, Default)]
pub struct RemoteSnapshot {
    files: Vec<RemoteFile>,
}

impl RemoteSnapshot {
    pub fn new(files: Vec<RemoteFile>) -> Self {
        Self { files }
    }

    pub fn files(&self) -> &[RemoteFile] {
        &self.files
    }

    /// Case-folded filename set.
    pub fn filename_keys(&self) -> HashSet<String> {
        self.files.iter().map(|f| f.filename_key()).collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
