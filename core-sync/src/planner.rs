//! # Reconciliation Planner
//!
//! Computes upload and download work lists from a pair of inventory
//! snapshots.
//!
//! ## Overview
//!
//! Reconciliation is pure filename set-difference under case folding. Two
//! different binary contents sharing a filename are treated as the same asset
//! on purpose: an empty plan means "no filenames are missing", not "all
//! content matches". Content ever only matters to the duplicate detector,
//! and only within the local inventory.
//!
//! Planning is deterministic: the same snapshot pair always yields the same
//! work list, in snapshot order. Re-running a pass after partial failure
//! replans from fresh snapshots, so previously transferred items drop out
//! naturally. No retry queue is kept anywhere.

use bridge_traits::media::{LocalAsset, RemoteFile};
use core_inventory::{LocalSnapshot, RemoteSnapshot};
use tracing::debug;

/// A single planned action, carrying enough identity to be executed
/// independently and idempotently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncWorkItem {
    /// Send a local asset to the server
    Upload(LocalAsset),
    /// Fetch a remote file and commit it to the device store
    Download(RemoteFile),
    /// Remove a redundant local asset (batched, post-confirmation)
    DeleteDuplicate(LocalAsset),
}

impl SyncWorkItem {
    /// Filename the item acts on, for reporting
    pub fn filename(&self) -> &str {
        match self {
            SyncWorkItem::Upload(asset) => &asset.filename,
            SyncWorkItem::Download(file) => &file.filename,
            SyncWorkItem::DeleteDuplicate(asset) => &asset.filename,
        }
    }
}

/// Local assets whose case-folded filename is absent from the remote
/// snapshot.
///
/// Assets confirmed present in the already-synced album are removed from the
/// candidate set before the comparison; they represent previously restored
/// content and must not be re-uploaded.
pub fn plan_upload(local: &LocalSnapshot, remote: &RemoteSnapshot) -> Vec<LocalAsset> {
    let remote_keys = remote.filename_keys();

    let plan: Vec<LocalAsset> = local
        .upload_candidates()
        .filter(|asset| !remote_keys.contains(&asset.filename_key()))
        .cloned()
        .collect();

    debug!(
        candidates = local.upload_candidates().count(),
        remote = remote.len(),
        planned = plan.len(),
        "Planned uploads"
    );
    plan
}

/// Remote files whose case-folded filename is absent from the local
/// snapshot.
///
/// The comparison runs against the full local inventory, synced-album
/// members included: restored content is present locally and must not be
/// fetched again.
pub fn plan_download(local: &LocalSnapshot, remote: &RemoteSnapshot) -> Vec<RemoteFile> {
    let local_keys = local.filename_keys();

    let plan: Vec<RemoteFile> = remote
        .files()
        .iter()
        .filter(|file| !local_keys.contains(&file.filename_key()))
        .cloned()
        .collect();

    debug!(
        local = local.len(),
        remote = remote.len(),
        planned = plan.len(),
        "Planned downloads"
    );
    plan
}
