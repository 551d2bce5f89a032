//! # Transfer Orchestrator
//!
//! Executes a planned work list item by item, with per-item failure
//! isolation, monotonic progress events, and a single batched deletion call.
//!
//! ## Overview
//!
//! Work items run **sequentially, one at a time**. That bounds memory (one
//! in-flight file buffer) and keeps progress reporting monotonic and trivial
//! to reason about. A failing item is recorded with its filename and never
//! aborts the remainder; the orchestrator always drains the full list and
//! returns a report whose per-item counts close:
//! `succeeded + duplicates + failed == transfer_total`.
//!
//! Deletions are different: they execute as one batch call at the end of the
//! run (the caller only enqueues them after user confirmation), and a batch
//! failure is reported wholesale. Candidates without a resolvable locator
//! are excluded from the batch and counted separately before the call is
//! made.
//!
//! ## Progress
//!
//! Progress is emitted as `items_processed / total` after every item, starts
//! at 0, and is reset to 0 once the run ends, which is what a progress-bar
//! consumer expects. Re-running after a partial failure replans from fresh
//! snapshots, so completed items drop out on their own; there is no
//! persisted retry state here.

use crate::planner::SyncWorkItem;
use crate::report::{ItemFailure, PassId, TransferReport};
use bridge_traits::media::{AssetId, LocalAsset, MediaStore, RemoteFile, RemoteStore};
use bridge_traits::storage::FileSystemAccess;
use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// Executes work lists against the injected I/O boundaries.
pub struct TransferOrchestrator {
    /// Remote file service
    remote: Arc<dyn RemoteStore>,

    /// Device media store
    media: Arc<dyn MediaStore>,

    /// Staging-file access for downloads
    file_system: Arc<dyn FileSystemAccess>,

    /// Event bus for progress reporting
    event_bus: EventBus,

    /// Album marking restored content
    synced_album_name: String,
}

impl TransferOrchestrator {
    /// Creates a new orchestrator.
    ///
    /// # Arguments
    ///
    /// * `remote` - Remote file service client
    /// * `media` - Device media store bridge
    /// * `file_system` - Staging-file access for downloads
    /// * `event_bus` - Event bus for progress events
    /// * `synced_album_name` - Album restored assets are added to
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        media: Arc<dyn MediaStore>,
        file_system: Arc<dyn FileSystemAccess>,
        event_bus: EventBus,
        synced_album_name: impl Into<String>,
    ) -> Self {
        Self {
            remote,
            media,
            file_system,
            event_bus,
            synced_album_name: synced_album_name.into(),
        }
    }

    /// Executes a work list to completion.
    ///
    /// Uploads and downloads are processed sequentially in list order;
    /// `DeleteDuplicate` items are collected and executed as one batch after
    /// the per-item phase. The returned report is insensitive to which items
    /// failed; every item lands in exactly one counter.
    #[instrument(skip(self, items), fields(pass_id = %pass_id, items = items.len()))]
    pub async fn execute(
        &self,
        pass_id: PassId,
        direction: &str,
        items: Vec<SyncWorkItem>,
    ) -> TransferReport {
        let started = Instant::now();
        let total = items.len() as u64;

        let mut report = TransferReport::default();
        let mut delete_queue: Vec<LocalAsset> = Vec::new();

        self.event_bus
            .emit(CoreEvent::Sync(SyncEvent::Started {
                pass_id: pass_id.to_string(),
                direction: direction.to_string(),
                total_items: total,
            }))
            .ok();
        self.emit_progress(pass_id, direction, 0, total);

        let mut processed = 0u64;

        for item in items {
            match item {
                SyncWorkItem::Upload(asset) => {
                    report.transfer_total += 1;
                    match self.upload_one(&asset).await {
                        Ok(true) => report.duplicates += 1,
                        Ok(false) => report.succeeded += 1,
                        Err(message) => {
                            warn!(filename = %asset.filename, error = %message, "Upload failed");
                            report.failed += 1;
                            report.failures.push(ItemFailure {
                                filename: asset.filename.clone(),
                                message,
                            });
                        }
                    }
                    processed += 1;
                    self.emit_progress(pass_id, direction, processed, total);
                }
                SyncWorkItem::Download(file) => {
                    report.transfer_total += 1;
                    match self.download_one(&file).await {
                        Ok(()) => report.succeeded += 1,
                        Err(message) => {
                            warn!(filename = %file.filename, error = %message, "Download failed");
                            report.failed += 1;
                            report.failures.push(ItemFailure {
                                filename: file.filename.clone(),
                                message,
                            });
                        }
                    }
                    processed += 1;
                    self.emit_progress(pass_id, direction, processed, total);
                }
                SyncWorkItem::DeleteDuplicate(asset) => {
                    delete_queue.push(asset);
                }
            }
        }

        if !delete_queue.is_empty() {
            let deleted_steps = delete_queue.len() as u64;
            self.run_delete_batch(delete_queue, &mut report).await;
            processed += deleted_steps;
            self.emit_progress(pass_id, direction, processed, total);
        }

        report.duration_secs = started.elapsed().as_secs();

        info!(
            pass_id = %pass_id,
            succeeded = report.succeeded,
            duplicates = report.duplicates,
            failed = report.failed,
            deleted = report.deleted,
            "Work list drained"
        );

        self.event_bus
            .emit(CoreEvent::Sync(SyncEvent::Completed {
                pass_id: pass_id.to_string(),
                succeeded: report.succeeded,
                duplicates: report.duplicates,
                failed: report.failed,
                duration_secs: report.duration_secs,
            }))
            .ok();

        // Progress-bar reset for the next run
        self.event_bus
            .emit(CoreEvent::Sync(SyncEvent::Progress {
                pass_id: pass_id.to_string(),
                items_processed: 0,
                total_items: 0,
                percent: 0,
                phase: "idle".to_string(),
            }))
            .ok();

        report
    }

    /// Upload one asset; `Ok(true)` means the server already held the content.
    async fn upload_one(&self, asset: &LocalAsset) -> Result<bool, String> {
        let content = self
            .media
            .read_asset(asset)
            .await
            .map_err(|e| format!("read failed: {}", e))?;

        let outcome = self
            .remote
            .upload(&asset.filename, content)
            .await
            .map_err(|e| format!("upload failed: {}", e))?;

        if outcome.duplicate {
            debug!(filename = %asset.filename, "Skipped as server-side duplicate");
        }
        Ok(outcome.duplicate)
    }

    /// Download one file, stage it, commit it, and mark it restored.
    async fn download_one(&self, file: &RemoteFile) -> Result<(), String> {
        let content = self
            .remote
            .download(&file.filename)
            .await
            .map_err(|e| format!("download failed: {}", e))?;

        let staged = self
            .staged_path(&file.filename)
            .await
            .map_err(|e| format!("staging unavailable: {}", e))?;

        self.file_system
            .write_file(&staged, content)
            .await
            .map_err(|e| format!("staging write failed: {}", e))?;

        let commit_result = async {
            let asset_id = self
                .media
                .import_file(&staged, &file.filename)
                .await
                .map_err(|e| format!("import failed: {}", e))?;

            self.mark_restored(&asset_id).await;
            Ok::<(), String>(())
        }
        .await;

        // The staged copy is disposable either way
        if let Err(e) = self.file_system.delete_file(&staged).await {
            debug!(path = ?staged, error = %e, "Failed to remove staged file");
        }

        commit_result
    }

    /// Add a committed download to the already-synced album.
    ///
    /// Album bookkeeping failures are logged, not fatal: the asset is on the
    /// device, and the next pass simply sees it by filename.
    async fn mark_restored(&self, asset_id: &AssetId) {
        let album = match self.media.ensure_album(&self.synced_album_name).await {
            Ok(album) => album,
            Err(e) => {
                warn!(album = %self.synced_album_name, error = %e, "Synced album unavailable");
                return;
            }
        };

        if let Err(e) = self
            .media
            .add_to_album(&album, std::slice::from_ref(asset_id))
            .await
        {
            warn!(asset_id = %asset_id, error = %e, "Failed to mark asset restored");
        }
    }

    /// Execute the deletion batch, excluding unresolvable candidates first.
    async fn run_delete_batch(&self, queue: Vec<LocalAsset>, report: &mut TransferReport) {
        let (resolvable, unresolvable): (Vec<_>, Vec<_>) = queue
            .into_iter()
            .partition(|asset| asset.readable_uri.is_some());

        report.delete_unresolvable = unresolvable.len() as u64;
        report.delete_attempted = resolvable.len() as u64;

        if resolvable.is_empty() {
            return;
        }

        let ids: Vec<AssetId> = resolvable.into_iter().map(|a| a.id).collect();

        match self.media.delete_assets(&ids).await {
            Ok(()) => {
                report.deleted = ids.len() as u64;
                info!(deleted = report.deleted, "Deletion batch complete");
            }
            Err(e) => {
                error!(error = %e, "Deletion batch failed");
                report.delete_batch_error = Some(e.to_string());
            }
        }
    }

    async fn staged_path(&self, filename: &str) -> Result<PathBuf, String> {
        let dir = self
            .file_system
            .staging_directory()
            .await
            .map_err(|e| e.to_string())?;

        self.file_system
            .create_dir_all(&dir)
            .await
            .map_err(|e| e.to_string())?;

        // Keep only the final path segment; remote names are not trusted to
        // be path-free.
        let name = std::path::Path::new(filename)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "download.bin".to_string());

        Ok(dir.join(name))
    }

    fn emit_progress(&self, pass_id: PassId, direction: &str, processed: u64, total: u64) {
        let percent = if total > 0 {
            ((processed as f64 / total as f64) * 100.0).min(100.0) as u8
        } else {
            0
        };

        self.event_bus
            .emit(CoreEvent::Sync(SyncEvent::Progress {
                pass_id: pass_id.to_string(),
                items_processed: processed,
                total_items: total,
                percent,
                phase: direction.to_string(),
            }))
            .ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::media::{AlbumId, AssetFilter, MediaKind, UploadOutcome};
    use bytes::Bytes;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Mutex;

    // ========================================================================
    // Mock Implementations
    // ========================================================================

    #[derive(Default)]
    struct MockMedia {
        /// Filenames whose read should fail
        unreadable: Vec<String>,
        imported: Mutex<Vec<String>>,
        album_adds: Mutex<Vec<AssetId>>,
        deleted: Mutex<Vec<AssetId>>,
        fail_delete: bool,
    }

    #[async_trait]
    impl MediaStore for MockMedia {
        async fn enumerate_assets(&self, _filter: &AssetFilter) -> BridgeResult<Vec<AssetId>> {
            Ok(Vec::new())
        }

        async fn asset_detail(&self, _id: &AssetId) -> BridgeResult<LocalAsset> {
            Err(BridgeError::NotAvailable("asset_detail".into()))
        }

        async fn read_asset(&self, asset: &LocalAsset) -> BridgeResult<Bytes> {
            if self.unreadable.contains(&asset.filename) {
                return Err(BridgeError::OperationFailed("unreadable".into()));
            }
            Ok(Bytes::from(asset.filename.clone()))
        }

        async fn ensure_album(&self, _name: &str) -> BridgeResult<AlbumId> {
            Ok(AlbumId::new("synced"))
        }

        async fn album_members(&self, _album: &AlbumId) -> BridgeResult<Vec<AssetId>> {
            Ok(Vec::new())
        }

        async fn add_to_album(&self, _album: &AlbumId, assets: &[AssetId]) -> BridgeResult<()> {
            self.album_adds.lock().unwrap().extend_from_slice(assets);
            Ok(())
        }

        async fn delete_assets(&self, assets: &[AssetId]) -> BridgeResult<()> {
            if self.fail_delete {
                return Err(BridgeError::OperationFailed("batch rejected".into()));
            }
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
        /// Filenames the server reports as content duplicates
        duplicates: Vec<String>,
        /// Filenames whose transfer should fail
        failing: Vec<String>,
        uploads: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl RemoteStore for MockRemote {
        async fn list_files(&self) -> BridgeResult<Vec<RemoteFile>> {
            Ok(Vec::new())
        }

        async fn upload(&self, filename: &str, _content: Bytes) -> BridgeResult<UploadOutcome> {
            if self.failing.contains(&filename.to_string()) {
                return Err(BridgeError::OperationFailed("network error".into()));
            }
            self.uploads.lock().unwrap().push(filename.to_string());
            Ok(UploadOutcome {
                duplicate: self.duplicates.contains(&filename.to_string()),
            })
        }

        async fn download(&self, filename: &str) -> BridgeResult<Bytes> {
            if self.failing.contains(&filename.to_string()) {
                return Err(BridgeError::OperationFailed("network error".into()));
            }
            Ok(Bytes::from(format!("content-of-{}", filename)))
        }
    }

    #[derive(Default)]
    struct MockFs {
        files: Mutex<HashMap<PathBuf, Bytes>>,
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

    fn asset(id: &str, filename: &str, uri: Option<&str>) -> LocalAsset {
        LocalAsset {
            id: AssetId::new(id),
            filename: filename.to_string(),
            content_hash: None,
            creation_time: 100,
            media_kind: MediaKind::Photo,
            readable_uri: uri.map(String::from),
        }
    }

    fn orchestrator(
        remote: Arc<MockRemote>,
        media: Arc<MockMedia>,
        fs: Arc<MockFs>,
        bus: &EventBus,
    ) -> TransferOrchestrator {
        TransferOrchestrator::new(remote, media, fs, bus.clone(), "Synced")
    }

    #[tokio::test]
    async fn test_upload_failure_does_not_abort_remaining() {
        let remote = Arc::new(MockRemote {
            failing: vec!["img_2.jpg".to_string()],
            ..MockRemote::default()
        });
        let media = Arc::new(MockMedia::default());
        let fs = Arc::new(MockFs::default());
        let bus = EventBus::new(64);

        let items: Vec<SyncWorkItem> = ["img_1.jpg", "img_2.jpg", "img_3.jpg"]
            .iter()
            .enumerate()
            .map(|(i, name)| SyncWorkItem::Upload(asset(&format!("a{}", i), name, Some("/p"))))
            .collect();

        let report = orchestrator(remote.clone(), media, fs, &bus)
            .execute(PassId::new(), "upload", items)
            .await;

        assert_eq!(report.transfer_total, 3);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert!(report.accounting_closes());
        assert_eq!(report.failures[0].filename, "img_2.jpg");

        // Items after the failure still ran
        assert_eq!(
            *remote.uploads.lock().unwrap(),
            vec!["img_1.jpg", "img_3.jpg"]
        );
    }

    #[tokio::test]
    async fn test_server_duplicate_counts_separately() {
        let remote = Arc::new(MockRemote {
            duplicates: vec!["dup.jpg".to_string()],
            ..MockRemote::default()
        });
        let media = Arc::new(MockMedia::default());
        let fs = Arc::new(MockFs::default());
        let bus = EventBus::new(64);

        let items = vec![
            SyncWorkItem::Upload(asset("a1", "dup.jpg", Some("/p"))),
            SyncWorkItem::Upload(asset("a2", "new.jpg", Some("/p"))),
        ];

        let report = orchestrator(remote, media, fs, &bus)
            .execute(PassId::new(), "upload", items)
            .await;

        assert_eq!(report.duplicates, 1);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 0);
        assert!(report.accounting_closes());
    }

    #[tokio::test]
    async fn test_download_commits_and_marks_restored() {
        let remote = Arc::new(MockRemote::default());
        let media = Arc::new(MockMedia::default());
        let fs = Arc::new(MockFs::default());
        let bus = EventBus::new(64);

        let items = vec![SyncWorkItem::Download(RemoteFile::new("IMG_9.jpg"))];

        let report = orchestrator(remote, media.clone(), fs.clone(), &bus)
            .execute(PassId::new(), "download", items)
            .await;

        assert_eq!(report.succeeded, 1);
        assert_eq!(*media.imported.lock().unwrap(), vec!["IMG_9.jpg"]);
        assert_eq!(media.album_adds.lock().unwrap().len(), 1);

        // Staged copy was cleaned up after commit
        assert!(fs.files.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_batch_excludes_unresolvable() {
        let remote = Arc::new(MockRemote::default());
        let media = Arc::new(MockMedia::default());
        let fs = Arc::new(MockFs::default());
        let bus = EventBus::new(64);

        let items = vec![
            SyncWorkItem::DeleteDuplicate(asset("a1", "dup_1.jpg", Some("/p/1"))),
            SyncWorkItem::DeleteDuplicate(asset("a2", "dup_2.jpg", None)),
            SyncWorkItem::DeleteDuplicate(asset("a3", "dup_3.jpg", Some("/p/3"))),
        ];

        let report = orchestrator(remote, media.clone(), fs, &bus)
            .execute(PassId::new(), "dedup", items)
            .await;

        assert_eq!(report.delete_attempted, 2);
        assert_eq!(report.delete_unresolvable, 1);
        assert_eq!(report.deleted, 2);
        assert!(report.delete_batch_error.is_none());

        let deleted = media.deleted.lock().unwrap();
        assert_eq!(deleted.len(), 2);
        assert!(deleted.contains(&AssetId::new("a1")));
        assert!(deleted.contains(&AssetId::new("a3")));
    }

    #[tokio::test]
    async fn test_delete_batch_failure_reported_wholesale() {
        let remote = Arc::new(MockRemote::default());
        let media = Arc::new(MockMedia {
            fail_delete: true,
            ..MockMedia::default()
        });
        let fs = Arc::new(MockFs::default());
        let bus = EventBus::new(64);

        let items = vec![
            SyncWorkItem::DeleteDuplicate(asset("a1", "dup_1.jpg", Some("/p/1"))),
            SyncWorkItem::DeleteDuplicate(asset("a2", "dup_2.jpg", Some("/p/2"))),
        ];

        let report = orchestrator(remote, media, fs, &bus)
            .execute(PassId::new(), "dedup", items)
            .await;

        assert_eq!(report.deleted, 0);
        assert!(report.delete_batch_error.is_some());
        assert_eq!(report.delete_attempted, 2);
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_and_resets() {
        let remote = Arc::new(MockRemote {
            failing: vec!["bad.jpg".to_string()],
            ..MockRemote::default()
        });
        let media = Arc::new(MockMedia::default());
        let fs = Arc::new(MockFs::default());
        let bus = EventBus::new(64);
        let mut rx = bus.subscribe();

        let items = vec![
            SyncWorkItem::Upload(asset("a1", "ok.jpg", Some("/p"))),
            SyncWorkItem::Upload(asset("a2", "bad.jpg", Some("/p"))),
        ];

        orchestrator(remote, media, fs, &bus)
            .execute(PassId::new(), "upload", items)
            .await;

        let mut fractions = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let CoreEvent::Sync(SyncEvent::Progress {
                items_processed,
                total_items,
                ..
            }) = event
            {
                fractions.push((items_processed, total_items));
            }
        }

        // 0/2 -> 1/2 -> 2/2, then the reset frame
        assert_eq!(fractions, vec![(0, 2), (1, 2), (2, 2), (0, 0)]);
    }

    #[tokio::test]
    async fn test_empty_work_list_completes_immediately() {
        let remote = Arc::new(MockRemote::default());
        let media = Arc::new(MockMedia::default());
        let fs = Arc::new(MockFs::default());
        let bus = EventBus::new(64);

        let report = orchestrator(remote, media, fs, &bus)
            .execute(PassId::new(), "upload", Vec::new())
            .await;

        assert_eq!(report.transfer_total, 0);
        assert!(report.accounting_closes());
    }
}
