//! # Backup Coordinator
//!
//! Sequences a full reconciliation-and-transfer pass: snapshot both sides,
//! plan, execute, report.
//!
//! ## Overview
//!
//! The `BackupCoordinator` is the entry point the host drives. It owns the
//! scanner, the duplicate detector, and the transfer orchestrator, and
//! enforces the single-pass discipline: one pass runs to completion before
//! another may start.
//!
//! ## Workflow
//!
//! ### Backup (upload)
//! 1. Scan the device media store (synced-album exclusion, inspection
//!    accounting)
//! 2. Fetch the full remote listing; a failure here aborts the pass, since
//!    no partial plan can be computed safely
//! 3. Plan uploads by case-folded filename difference
//! 4. Execute sequentially with per-item isolation
//!
//! ### Restore (download)
//! Same shape, reversed difference; committed downloads join the
//! already-synced album so the next backup pass never re-uploads them.
//!
//! ### Duplicate cleanup
//! 1. Scan and hash the local inventory (no remote involvement)
//! 2. Surface the deletion plan to the caller for confirmation
//! 3. On confirmation, delete the redundant copies in one batch
//!
//! Identity is resolved before any of this: the host builds the
//! `RemoteStore` client from an active session, and a session without a
//! resolvable device identity fails fast in `core-identity`, so no request is
//! ever sent without the identity headers.
//!
//! ## Usage
//!
//! ```ignore
//! use core_sync::BackupCoordinator;
//! use std::sync::Arc;
//!
//! # async fn example(coordinator: BackupCoordinator) -> core_sync::Result<()> {
//! let summary = coordinator.run_backup().await?;
//! println!(
//!     "uploaded {} ({} duplicates, {} failed)",
//!     summary.report.succeeded, summary.report.duplicates, summary.report.failed
//! );
//! # Ok(())
//! # }
//! ```

use crate::dedup::{DedupOutcome, DuplicateDetector, DuplicateGroup};
use crate::error::{Result, SyncError};
use crate::orchestrator::TransferOrchestrator;
use crate::planner::{plan_download, plan_upload, SyncWorkItem};
use crate::report::{PassId, TransferReport};
use bridge_traits::media::{ContentHasher, MediaStore, RemoteStore};
use bridge_traits::storage::FileSystemAccess;
use core_inventory::{InventoryScanner, RemoteSnapshot, ScanStats};
use core_runtime::events::{CoreEvent, DedupEvent, EventBus, SyncEvent};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

/// Outcome of one backup or restore pass.
#[derive(Debug, Clone)]
pub struct PassSummary {
    /// The pass identifier carried by every event emitted during the run
    pub pass_id: PassId,
    /// Local scan accounting
    pub scan: ScanStats,
    /// Number of planned work items
    pub planned: u64,
    /// Execution report
    pub report: TransferReport,
}

/// Outcome of one duplicate-cleanup pass.
#[derive(Debug, Clone)]
pub struct DedupSummary {
    /// The pass identifier
    pub pass_id: PassId,
    /// Local scan accounting
    pub scan: ScanStats,
    /// Detection outcome: groups plus hash/skip accounting
    pub outcome: DedupOutcome,
    /// Whether the caller declined the deletion plan
    pub cancelled: bool,
    /// Execution report (deletion fields populated)
    pub report: TransferReport,
}

/// Coordinates reconciliation passes over the injected boundaries.
pub struct BackupCoordinator {
    scanner: InventoryScanner,
    detector: DuplicateDetector,
    orchestrator: TransferOrchestrator,
    remote: Arc<dyn RemoteStore>,
    event_bus: EventBus,
    /// One pass at a time; overlapping passes against the same inventory are
    /// not supported.
    pass_lock: Mutex<()>,
}

impl BackupCoordinator {
    /// Creates a new coordinator.
    ///
    /// # Arguments
    ///
    /// * `remote` - Remote file service client (already bound to a session)
    /// * `media` - Device media store bridge
    /// * `file_system` - Staging-file access for downloads
    /// * `hasher` - Content hasher for duplicate detection
    /// * `event_bus` - Event bus for progress and lifecycle events
    /// * `synced_album_name` - Album marking already-synced content
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        media: Arc<dyn MediaStore>,
        file_system: Arc<dyn FileSystemAccess>,
        hasher: Arc<dyn ContentHasher>,
        event_bus: EventBus,
        synced_album_name: impl Into<String>,
    ) -> Self {
        let synced_album_name = synced_album_name.into();

        Self {
            scanner: InventoryScanner::new(media.clone(), synced_album_name.clone()),
            detector: DuplicateDetector::new(hasher),
            orchestrator: TransferOrchestrator::new(
                remote.clone(),
                media,
                file_system,
                event_bus.clone(),
                synced_album_name,
            ),
            remote,
            event_bus,
            pass_lock: Mutex::new(()),
        }
    }

    /// Run a backup pass: upload everything missing on the server.
    #[instrument(skip(self))]
    pub async fn run_backup(&self) -> Result<PassSummary> {
        let _guard = self
            .pass_lock
            .try_lock()
            .map_err(|_| SyncError::PassInProgress)?;

        let pass_id = PassId::new();
        info!(pass_id = %pass_id, "Starting backup pass");

        let scan = self
            .scanner
            .scan()
            .await
            .map_err(|e| SyncError::Inventory(e.to_string()))?;

        let remote_snapshot = self.remote_snapshot(pass_id).await?;

        let plan = plan_upload(&scan.snapshot, &remote_snapshot);
        let planned = plan.len() as u64;
        info!(pass_id = %pass_id, planned = planned, "Upload plan computed");

        let items: Vec<SyncWorkItem> = plan.into_iter().map(SyncWorkItem::Upload).collect();
        let report = self.orchestrator.execute(pass_id, "upload", items).await;

        Ok(PassSummary {
            pass_id,
            scan: scan.stats,
            planned,
            report,
        })
    }

    /// Run a restore pass: download everything missing on the device.
    #[instrument(skip(self))]
    pub async fn run_restore(&self) -> Result<PassSummary> {
        let _guard = self
            .pass_lock
            .try_lock()
            .map_err(|_| SyncError::PassInProgress)?;

        let pass_id = PassId::new();
        info!(pass_id = %pass_id, "Starting restore pass");

        let scan = self
            .scanner
            .scan()
            .await
            .map_err(|e| SyncError::Inventory(e.to_string()))?;

        let remote_snapshot = self.remote_snapshot(pass_id).await?;

        let plan = plan_download(&scan.snapshot, &remote_snapshot);
        let planned = plan.len() as u64;
        info!(pass_id = %pass_id, planned = planned, "Download plan computed");

        let items: Vec<SyncWorkItem> = plan.into_iter().map(SyncWorkItem::Download).collect();
        let report = self.orchestrator.execute(pass_id, "download", items).await;

        Ok(PassSummary {
            pass_id,
            scan: scan.stats,
            planned,
            report,
        })
    }

    /// Run a duplicate-cleanup pass.
    ///
    /// Detection always runs; deletion only happens when `confirm` approves
    /// the proposed groups. Declining is the cooperative cancel path: it
    /// stops the pass before any deletion begins, and nothing is retried or
    /// remembered.
    #[instrument(skip(self, confirm))]
    pub async fn clean_duplicates<F>(&self, confirm: F) -> Result<DedupSummary>
    where
        F: FnOnce(&[DuplicateGroup]) -> bool + Send,
    {
        let _guard = self
            .pass_lock
            .try_lock()
            .map_err(|_| SyncError::PassInProgress)?;

        let pass_id = PassId::new();
        info!(pass_id = %pass_id, "Starting duplicate cleanup pass");

        let scan = self
            .scanner
            .scan()
            .await
            .map_err(|e| SyncError::Inventory(e.to_string()))?;

        let outcome = self.detector.detect(&scan.snapshot).await;

        self.event_bus
            .emit(CoreEvent::Dedup(DedupEvent::PlanReady {
                groups: outcome.groups.len() as u64,
                deletion_candidates: outcome.deletion_candidates(),
            }))
            .ok();

        if outcome.groups.is_empty() {
            info!(pass_id = %pass_id, "No duplicates found");
            return Ok(DedupSummary {
                pass_id,
                scan: scan.stats,
                outcome,
                cancelled: false,
                report: TransferReport::default(),
            });
        }

        if !confirm(&outcome.groups) {
            info!(pass_id = %pass_id, "Deletion plan declined");
            self.event_bus
                .emit(CoreEvent::Dedup(DedupEvent::Cancelled {
                    groups: outcome.groups.len() as u64,
                }))
                .ok();

            return Ok(DedupSummary {
                pass_id,
                scan: scan.stats,
                outcome,
                cancelled: true,
                report: TransferReport::default(),
            });
        }

        let items: Vec<SyncWorkItem> = outcome
            .groups
            .iter()
            .flat_map(|g| g.deletion_candidates.iter().cloned())
            .map(SyncWorkItem::DeleteDuplicate)
            .collect();

        let report = self.orchestrator.execute(pass_id, "dedup", items).await;

        match &report.delete_batch_error {
            Some(message) => {
                warn!(pass_id = %pass_id, error = %message, "Deletion batch failed");
                self.event_bus
                    .emit(CoreEvent::Dedup(DedupEvent::Failed {
                        message: message.clone(),
                    }))
                    .ok();
            }
            None => {
                self.event_bus
                    .emit(CoreEvent::Dedup(DedupEvent::Completed {
                        groups: outcome.groups.len() as u64,
                        deleted: report.deleted,
                    }))
                    .ok();
            }
        }

        Ok(DedupSummary {
            pass_id,
            scan: scan.stats,
            outcome,
            cancelled: false,
            report,
        })
    }

    /// Fetch the remote listing; failure aborts the pass.
    async fn remote_snapshot(&self, pass_id: PassId) -> Result<RemoteSnapshot> {
        match self.remote.list_files().await {
            Ok(files) => Ok(RemoteSnapshot::new(files)),
            Err(e) => {
                warn!(pass_id = %pass_id, error = %e, "Remote listing failed; aborting pass");
                self.event_bus
                    .emit(CoreEvent::Sync(SyncEvent::Failed {
                        pass_id: pass_id.to_string(),
                        message: e.to_string(),
                    }))
                    .ok();
                Err(SyncError::RemoteListing(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::media::{
        AlbumId, AssetFilter, AssetId, LocalAsset, MediaKind, RemoteFile, UploadOutcome,
    };
    use bytes::Bytes;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex as StdMutex;

    // ========================================================================
    // Mock Implementations
    // ========================================================================

    #[derive(Default)]
    struct MockMedia {
        assets: Vec<LocalAsset>,
        synced: Vec<AssetId>,
        deleted: StdMutex<Vec<AssetId>>,
        imported: StdMutex<Vec<String>>,
    }

    #[async_trait]
    impl MediaStore for MockMedia {
        async fn enumerate_assets(&self, _filter: &AssetFilter) -> BridgeResult<Vec<AssetId>> {
            Ok(self.assets.iter().map(|a| a.id.clone()).collect())
        }

        async fn asset_detail(&self, id: &AssetId) -> BridgeResult<LocalAsset> {
            self.assets
                .iter()
                .find(|a| &a.id == id)
                .cloned()
                .ok_or_else(|| BridgeError::OperationFailed("unknown asset".into()))
        }

        async fn read_asset(&self, asset: &LocalAsset) -> BridgeResult<Bytes> {
            Ok(Bytes::from(asset.filename.clone()))
        }

        async fn ensure_album(&self, _name: &str) -> BridgeResult<AlbumId> {
            Ok(AlbumId::new("synced"))
        }

        async fn album_members(&self, _album: &AlbumId) -> BridgeResult<Vec<AssetId>> {
            Ok(self.synced.clone())
        }

        async fn add_to_album(&self, _album: &AlbumId, _assets: &[AssetId]) -> BridgeResult<()> {
            Ok(())
        }

        async fn delete_assets(&self, assets: &[AssetId]) -> BridgeResult<()> {
            self.deleted.lock().unwrap().extend_from_slice(assets);
            Ok(())
        }

        async fn import_file(&self, _staged: &Path, filename: &str) -> BridgeResult<AssetId> {
            self.imported.lock().unwrap().push(filename.to_string());
            Ok(AssetId::new(format!("imported-{}", filename)))
        }
    }

    #[derive(Default)]
    struct MockRemote {
        files: Vec<RemoteFile>,
        fail_listing: bool,
        uploads: StdMutex<Vec<String>>,
    }

    #[async_trait]
    impl RemoteStore for MockRemote {
        async fn list_files(&self) -> BridgeResult<Vec<RemoteFile>> {
            if self.fail_listing {
                return Err(BridgeError::OperationFailed("listing unavailable".into()));
            }
            Ok(self.files.clone())
        }

        async fn upload(&self, filename: &str, _content: Bytes) -> BridgeResult<UploadOutcome> {
            self.uploads.lock().unwrap().push(filename.to_string());
            Ok(UploadOutcome { duplicate: false })
        }

        async fn download(&self, filename: &str) -> BridgeResult<Bytes> {
            Ok(Bytes::from(format!("content-of-{}", filename)))
        }
    }

    #[derive(Default)]
    struct MockFs {
        files: StdMutex<HashMap<PathBuf, Bytes>>,
    }

    #[async_trait]
    impl FileSystemAccess for MockFs {
        async fn staging_directory(&self) -> BridgeResult<PathBuf> {
            Ok(PathBuf::from("/staging"))
        }

        async fn exists(&self, path: &Path) -> BridgeResult<bool> {
            Ok(self.files.lock().unwrap().contains_key(path))
        }

        async fn create_dir_all(&self, _path: &Path) -> BridgeResult<()> {
            Ok(())
        }

        async fn read_file(&self, path: &Path) -> BridgeResult<Bytes> {
            self.files
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .ok_or_else(|| BridgeError::OperationFailed("missing".into()))
        }

        async fn write_file(&self, path: &Path, data: Bytes) -> BridgeResult<()> {
            self.files.lock().unwrap().insert(path.to_path_buf(), data);
            Ok(())
        }

        async fn delete_file(&self, path: &Path) -> BridgeResult<()> {
            self.files.lock().unwrap().remove(path);
            Ok(())
        }
    }

    /// Hasher keyed on locator path
    struct PathHasher;

    #[async_trait]
    impl ContentHasher for PathHasher {
        async fn hash(&self, readable_uri: &str) -> BridgeResult<String> {
            Ok(format!("digest-of-{}", readable_uri))
        }
    }

    fn asset(id: &str, filename: &str, uri: &str, creation_time: i64) -> LocalAsset {
        LocalAsset {
            id: AssetId::new(id),
            filename: filename.to_string(),
            content_hash: None,
            creation_time,
            media_kind: MediaKind::Photo,
            readable_uri: Some(uri.to_string()),
        }
    }

    fn coordinator(media: MockMedia, remote: MockRemote) -> (BackupCoordinator, Arc<MockRemote>) {
        let remote = Arc::new(remote);
        let coordinator = BackupCoordinator::new(
            remote.clone(),
            Arc::new(media),
            Arc::new(MockFs::default()),
            Arc::new(PathHasher),
            EventBus::new(64),
            "Synced",
        );
        (coordinator, remote)
    }

    #[tokio::test]
    async fn test_backup_uploads_missing_files_only() {
        let media = MockMedia {
            assets: vec![
                asset("a1", "IMG_1.JPG", "/p/1", 100),
                asset("a2", "img_2.jpg", "/p/2", 100),
            ],
            ..MockMedia::default()
        };
        let remote = MockRemote {
            files: vec![RemoteFile::new("img_1.jpg")],
            ..MockRemote::default()
        };

        let (coordinator, remote) = coordinator(media, remote);
        let summary = coordinator.run_backup().await.unwrap();

        assert_eq!(summary.planned, 1);
        assert_eq!(summary.report.succeeded, 1);
        assert_eq!(*remote.uploads.lock().unwrap(), vec!["img_2.jpg"]);
    }

    #[tokio::test]
    async fn test_backup_aborts_on_listing_failure() {
        let media = MockMedia {
            assets: vec![asset("a1", "IMG_1.JPG", "/p/1", 100)],
            ..MockMedia::default()
        };
        let remote = MockRemote {
            fail_listing: true,
            ..MockRemote::default()
        };

        let (coordinator, remote) = coordinator(media, remote);
        let result = coordinator.run_backup().await;

        assert!(matches!(result, Err(SyncError::RemoteListing(_))));
        assert!(remote.uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_restore_downloads_and_commits() {
        let media = MockMedia {
            assets: vec![asset("a1", "have.jpg", "/p/1", 100)],
            ..MockMedia::default()
        };
        let remote = MockRemote {
            files: vec![RemoteFile::new("HAVE.jpg"), RemoteFile::new("missing.jpg")],
            ..MockRemote::default()
        };

        let (coordinator, _) = coordinator(media, remote);
        let summary = coordinator.run_restore().await.unwrap();

        assert_eq!(summary.planned, 1);
        assert_eq!(summary.report.succeeded, 1);
    }

    #[tokio::test]
    async fn test_clean_duplicates_declined_deletes_nothing() {
        let media = MockMedia {
            assets: vec![
                asset("a1", "IMG_1.jpg", "/p/same", 100),
                asset("a2", "IMG_2.jpg", "/p/same", 200),
            ],
            ..MockMedia::default()
        };

        let (coordinator, _) = coordinator(media, MockRemote::default());
        let summary = coordinator.clean_duplicates(|_| false).await.unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.outcome.groups.len(), 1);
        assert_eq!(summary.report.deleted, 0);
    }

    #[tokio::test]
    async fn test_clean_duplicates_confirmed_deletes_newer_copies() {
        let media = MockMedia {
            assets: vec![
                asset("a1", "IMG_1.jpg", "/p/same", 200),
                asset("a2", "IMG_2.jpg", "/p/same", 100),
                asset("a3", "IMG_3.jpg", "/p/unique", 50),
            ],
            ..MockMedia::default()
        };

        let (coordinator, _) = coordinator(media, MockRemote::default());
        let summary = coordinator.clean_duplicates(|_| true).await.unwrap();

        assert!(!summary.cancelled);
        assert_eq!(summary.outcome.groups.len(), 1);
        // The t=100 copy is retained; the t=200 copy was deleted
        assert_eq!(summary.report.deleted, 1);
        assert_eq!(summary.outcome.groups[0].retained.id.as_str(), "a2");
    }

    #[tokio::test]
    async fn test_second_pass_replans_from_fresh_snapshots() {
        // After a successful backup, the remote holds the file; a second
        // pass must plan nothing.
        let media = MockMedia {
            assets: vec![asset("a1", "IMG_1.jpg", "/p/1", 100)],
            ..MockMedia::default()
        };
        let remote = MockRemote {
            files: vec![RemoteFile::new("img_1.jpg")],
            ..MockRemote::default()
        };

        let (coordinator, remote) = coordinator(media, remote);
        let summary = coordinator.run_backup().await.unwrap();

        assert_eq!(summary.planned, 0);
        assert!(remote.uploads.lock().unwrap().is_empty());
    }
}
