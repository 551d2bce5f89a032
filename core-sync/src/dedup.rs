//! # Duplicate Detector
//!
//! Groups local assets by content hash and selects the retained
//! representative per group.
//!
//! ## Overview
//!
//! Detection is local-only: no remote content is consulted. Every asset with
//! a readable locator is hashed; assets sharing a digest form a group, and a
//! group qualifies as duplicates at cardinality ≥ 2. Within a group the
//! member with the earliest creation time is retained; on equal timestamps
//! the member enumerated first in the snapshot's stable scan order wins, so
//! repeated runs over an unchanged inventory always pick the same survivor.
//!
//! Assets that cannot be hashed never count as duplicate or as unique; they
//! are skipped under a reason code and the accounting always closes:
//! `hashed + skipped == candidates`.

use bridge_traits::error::BridgeError;
use bridge_traits::media::{ContentHasher, LocalAsset};
use core_inventory::LocalSnapshot;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Why an asset was left out of duplicate grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// No readable locator at all
    MissingUri,
    /// Locator scheme the hasher cannot open
    UnreadableLocator,
    /// Content read or digest failed
    HashFailure,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::MissingUri => "missing-uri",
            SkipReason::UnreadableLocator => "unreadable-locator",
            SkipReason::HashFailure => "hash-failure",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A set of local assets sharing identical content.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    /// The shared content hash
    pub content_hash: String,

    /// The member kept on the device (earliest creation time)
    pub retained: LocalAsset,

    /// Members marked for deletion, in scan order
    pub deletion_candidates: Vec<LocalAsset>,
}

impl DuplicateGroup {
    /// Total group size including the retained member; always ≥ 2
    pub fn member_count(&self) -> usize {
        self.deletion_candidates.len() + 1
    }
}

/// Structured accounting for one detection run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupStats {
    /// Assets considered (the whole snapshot)
    pub candidates: u64,
    /// Assets successfully hashed
    pub hashed: u64,
    /// Skipped: no readable locator
    pub skipped_missing_uri: u64,
    /// Skipped: locator scheme not openable
    pub skipped_unreadable_locator: u64,
    /// Skipped: read or digest failure
    pub skipped_hash_failure: u64,
}

impl DedupStats {
    /// Sum of all skip reasons
    pub fn skipped_total(&self) -> u64 {
        self.skipped_missing_uri + self.skipped_unreadable_locator + self.skipped_hash_failure
    }

    /// Invariant check: every candidate is either hashed or skipped
    pub fn accounting_closes(&self) -> bool {
        self.hashed + self.skipped_total() == self.candidates
    }

    fn record_skip(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::MissingUri => self.skipped_missing_uri += 1,
            SkipReason::UnreadableLocator => self.skipped_unreadable_locator += 1,
            SkipReason::HashFailure => self.skipped_hash_failure += 1,
        }
    }
}

/// Outcome of one detection run: groups plus accounting.
#[derive(Debug, Clone, Default)]
pub struct DedupOutcome {
    /// Duplicate groups in first-seen hash order
    pub groups: Vec<DuplicateGroup>,
    /// Structured counts
    pub stats: DedupStats,
}

impl DedupOutcome {
    /// Total assets marked for deletion across all groups
    pub fn deletion_candidates(&self) -> u64 {
        self.groups
            .iter()
            .map(|g| g.deletion_candidates.len() as u64)
            .sum()
    }
}

/// Detects duplicate content within the local inventory.
pub struct DuplicateDetector {
    hasher: Arc<dyn ContentHasher>,
}

impl DuplicateDetector {
    /// Creates a detector over the given content hasher.
    pub fn new(hasher: Arc<dyn ContentHasher>) -> Self {
        Self { hasher }
    }

    /// Hash and group the snapshot's assets.
    ///
    /// Hashing runs one asset at a time in snapshot order, so grouping and
    /// retention are deterministic for an unchanged inventory. Failures are
    /// absorbed into the stats; detection itself never fails.
    #[instrument(skip(self, snapshot), fields(assets = snapshot.len()))]
    pub async fn detect(&self, snapshot: &LocalSnapshot) -> DedupOutcome {
        let mut stats = DedupStats {
            candidates: snapshot.len() as u64,
            ..DedupStats::default()
        };

        // Hash order preserved: group_order holds first-seen hashes
        let mut group_index: HashMap<String, usize> = HashMap::new();
        let mut grouped: Vec<(String, Vec<LocalAsset>)> = Vec::new();

        for asset in snapshot.assets() {
            let Some(uri) = asset.readable_uri.as_deref() else {
                debug!(asset_id = %asset.id, "Skipping asset without readable locator");
                stats.record_skip(SkipReason::MissingUri);
                continue;
            };

            let hash = match self.hasher.hash(uri).await {
                Ok(hash) => hash,
                Err(BridgeError::NotAvailable(msg)) => {
                    debug!(asset_id = %asset.id, reason = %msg, "Locator not openable");
                    stats.record_skip(SkipReason::UnreadableLocator);
                    continue;
                }
                Err(e) => {
                    warn!(asset_id = %asset.id, error = %e, "Hashing failed");
                    stats.record_skip(SkipReason::HashFailure);
                    continue;
                }
            };

            stats.hashed += 1;

            let mut member = asset.clone();
            member.content_hash = Some(hash.clone());

            match group_index.get(&hash) {
                Some(&idx) => grouped[idx].1.push(member),
                None => {
                    group_index.insert(hash.clone(), grouped.len());
                    grouped.push((hash, vec![member]));
                }
            }
        }

        let groups: Vec<DuplicateGroup> = grouped
            .into_iter()
            .filter(|(_, members)| members.len() >= 2)
            .map(|(content_hash, members)| Self::build_group(content_hash, members))
            .collect();

        info!(
            groups = groups.len(),
            hashed = stats.hashed,
            skipped = stats.skipped_total(),
            "Duplicate detection complete"
        );

        DedupOutcome { groups, stats }
    }

    /// Pick the retained member and order the rest for deletion.
    ///
    /// `min_by_key` returns the first minimum, which encodes the scan-order
    /// tie-break for equal creation times.
    fn build_group(content_hash: String, members: Vec<LocalAsset>) -> DuplicateGroup {
        let retained_idx = members
            .iter()
            .enumerate()
            .min_by_key(|(_, m)| m.creation_time)
            .map(|(i, _)| i)
            .unwrap_or(0);

        let mut deletion_candidates = members;
        let retained = deletion_candidates.remove(retained_idx);

        DuplicateGroup {
            content_hash,
            retained,
            deletion_candidates,
        }
    }
}
