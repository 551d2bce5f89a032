//! # Sync & Reconciliation Module
//!
//! Reconciles the device media store against the remote file service and
//! eliminates duplicate local content.
//!
//! ## Overview
//!
//! This module owns the decisions of a sync pass:
//! - Computing upload and download sets from two full inventory listings
//! - Grouping local assets by content hash and choosing what to keep
//! - Executing the resulting work lists with per-item failure isolation
//!
//! ## Components
//!
//! - **Reconciliation Planner** (`planner`): case-insensitive filename
//!   set-difference over snapshot pairs
//! - **Duplicate Detector** (`dedup`): content-hash grouping with an
//!   oldest-wins retention rule
//! - **Transfer Orchestrator** (`orchestrator`): sequential execution,
//!   progress events, batched deletions
//! - **Backup Coordinator** (`coordinator`): sequences scan → list → plan →
//!   execute and enforces the single-pass discipline
//! - **Reports** (`report`): structured counts with example filenames

pub mod coordinator;
pub mod dedup;
pub mod error;
pub mod orchestrator;
pub mod planner;
pub mod report;

pub use coordinator::{BackupCoordinator, DedupSummary, PassSummary};
pub use dedup::{DedupOutcome, DedupStats, DuplicateDetector, DuplicateGroup, SkipReason};
pub use error::{Result, SyncError};
pub use orchestrator::TransferOrchestrator;
pub use planner::{plan_download, plan_upload, SyncWorkItem};
pub use report::{ItemFailure, PassId, TransferReport};
