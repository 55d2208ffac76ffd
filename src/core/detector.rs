use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::config::{ConfigError, DetectorConfig};
use crate::core::fingerprint::{ContentHash, FingerprintError, PerceptualHash};
use crate::core::group::{sort_groups, DuplicateGroup, GroupPolicy};
use crate::core::index::{IndexedItem, SimilarityIndex};
use crate::core::record::FingerprintRecord;
use crate::core::union_find::UnionFind;

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("invalid detector configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("fingerprint comparison failed: {0}")]
    Fingerprint(#[from] FingerprintError),
}

/// Run-level aggregates for external reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionSummary {
    pub total_groups: usize,
    pub exact_groups: usize,
    pub approximate_groups: usize,
    /// Items marked for deletion: every group member except the keeper.
    pub items_flagged: usize,
    /// Records admitted to matching.
    pub matchable_items: usize,
    /// Records excluded: failed status, missing or malformed fingerprints.
    pub skipped_items: usize,
}

/// Output of one detection run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionReport {
    pub groups: Vec<DuplicateGroup>,
    pub summary: DetectionSummary,
}

/// The duplicate-detection engine.
///
/// Owns nothing but its configuration. Each `detect` call works on one
/// immutable snapshot of records; the union-find and seen-pairs scratch
/// state is scoped to that call and discarded with it, so concurrent runs on
/// disjoint inputs are independent.
pub struct DuplicateDetector {
    config: DetectorConfig,
}

impl DuplicateDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Cluster the given records into duplicate groups.
    ///
    /// Three edge classes feed the merge: shared content hashes, identical
    /// perceptual hashes, and approximate matches within the threshold.
    /// Records that cannot be matched (failed status, missing or malformed
    /// fingerprints) are skipped with a warning and counted, never fatal;
    /// configuration and width errors abort the run.
    pub fn detect(
        &self,
        records: &HashMap<String, FingerprintRecord>,
    ) -> Result<DetectionReport, DetectError> {
        self.config.validate()?;

        // Admission pass, in sorted id order so reruns on the same input
        // produce identical output.
        let mut sorted: Vec<(&String, &FingerprintRecord)> = records.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));

        let mut items: Vec<IndexedItem> = Vec::new();
        let mut hashes: HashMap<String, PerceptualHash> = HashMap::new();
        let mut skipped = 0usize;

        for (id, record) in sorted {
            if !record.is_valid() {
                skipped += 1;
                continue;
            }
            let Some(hex) = record.perceptual_hash.as_deref() else {
                skipped += 1;
                continue;
            };
            match PerceptualHash::parse(hex, self.config.hash_bits) {
                Ok(hash) => {
                    hashes.insert(id.clone(), hash.clone());
                    items.push(IndexedItem {
                        id: id.clone(),
                        hash,
                    });
                }
                Err(err) => {
                    log::warn!("skipping {}: {}", id, err);
                    skipped += 1;
                }
            }
        }

        let mut sets = UnionFind::new();
        for item in &items {
            sets.insert(&item.id);
        }

        // Exact content matches: byte-identical source files, linked without
        // any distance computation.
        let mut by_content: HashMap<&ContentHash, Vec<&str>> = HashMap::new();
        for item in &items {
            if let Some(digest) = records[&item.id].content_hash.as_ref() {
                by_content.entry(digest).or_default().push(&item.id);
            }
        }
        for group in by_content.values() {
            let first = group[0];
            for other in &group[1..] {
                sets.union(first, other);
            }
        }

        // Perceptual matches, exact and approximate.
        let index = SimilarityIndex::new(&self.config);
        for m in index.find_matches(&items)? {
            sets.union(&items[m.left].id, &items[m.right].id);
        }

        let mut clusters: HashMap<String, Vec<String>> = HashMap::new();
        for item in &items {
            let root = sets.find(&item.id);
            clusters.entry(root).or_default().push(item.id.clone());
        }

        let policy = GroupPolicy::new(&self.config);
        let mut groups = Vec::new();
        for members in clusters.into_values() {
            if members.len() < 2 {
                continue;
            }
            groups.push(policy.build(members, records, &hashes)?);
        }
        sort_groups(&mut groups);

        let exact_groups = groups.iter().filter(|g| g.is_exact).count();
        let summary = DetectionSummary {
            total_groups: groups.len(),
            exact_groups,
            approximate_groups: groups.len() - exact_groups,
            items_flagged: groups.iter().map(DuplicateGroup::flagged_count).sum(),
            matchable_items: items.len(),
            skipped_items: skipped,
        };

        log::info!(
            "found {} duplicate groups ({} exact, {} approximate), {} items flagged",
            summary.total_groups,
            summary.exact_groups,
            summary.approximate_groups,
            summary.items_flagged
        );

        Ok(DetectionReport { groups, summary })
    }
}
