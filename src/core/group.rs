use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::config::DetectorConfig;
use crate::core::fingerprint::{FingerprintError, PerceptualHash};
use crate::core::record::FingerprintRecord;

/// Which group member to mark as the keeper. Annotation only; nothing is
/// deleted here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeepStrategy {
    Oldest,
    Newest,
}

impl Default for KeepStrategy {
    fn default() -> Self {
        KeepStrategy::Oldest
    }
}

/// One cluster of duplicate items, ready for external review or export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Item ids in ascending creation-time order, missing timestamps first,
    /// ties broken by id.
    pub members: Vec<String>,
    /// All members share one non-empty content hash.
    pub is_exact: bool,
    /// Largest pairwise Hamming distance among members; `None` when the
    /// group exceeds the configured cutoff and the quadratic pass is skipped.
    pub max_internal_distance: Option<u32>,
    /// Position in `members` of the item to retain.
    pub keep_index: usize,
}

impl DuplicateGroup {
    /// Members marked for deletion: everyone except the keeper.
    pub fn flagged_count(&self) -> usize {
        self.members.len() - 1
    }
}

/// Turns raw union-find sets into ordered, classified groups.
pub struct GroupPolicy {
    keep_strategy: KeepStrategy,
    exact_distance_cutoff: usize,
}

impl GroupPolicy {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            keep_strategy: config.keep_strategy,
            exact_distance_cutoff: config.exact_distance_cutoff,
        }
    }

    /// Build one group from a set of member ids (size >= 2).
    ///
    /// Pairwise distances are recomputed over the whole group rather than
    /// reusing the edges that triggered the merge: a chain-merged group has
    /// member pairs the index never compared.
    pub fn build(
        &self,
        mut members: Vec<String>,
        records: &HashMap<String, FingerprintRecord>,
        hashes: &HashMap<String, PerceptualHash>,
    ) -> Result<DuplicateGroup, FingerprintError> {
        members.sort_by(|a, b| {
            let time_a = records.get(a).map(|r| r.sort_time()).unwrap_or("");
            let time_b = records.get(b).map(|r| r.sort_time()).unwrap_or("");
            time_a.cmp(time_b).then_with(|| a.cmp(b))
        });

        let is_exact = match records
            .get(&members[0])
            .and_then(|r| r.content_hash.as_ref())
        {
            Some(first) => members.iter().all(|id| {
                records.get(id).and_then(|r| r.content_hash.as_ref()) == Some(first)
            }),
            None => false,
        };

        let keep_index = match self.keep_strategy {
            KeepStrategy::Oldest => 0,
            KeepStrategy::Newest => members.len() - 1,
        };

        let max_internal_distance = if members.len() <= self.exact_distance_cutoff {
            let mut max = 0;
            for (i, a) in members.iter().enumerate() {
                for b in &members[i + 1..] {
                    if let (Some(hash_a), Some(hash_b)) = (hashes.get(a), hashes.get(b)) {
                        max = max.max(hash_a.distance(hash_b)?);
                    }
                }
            }
            Some(max)
        } else {
            None
        };

        Ok(DuplicateGroup {
            members,
            is_exact,
            max_internal_distance,
            keep_index,
        })
    }
}

/// Final output order: exact groups first, then larger groups first, ties by
/// the first member id so identical inputs produce identical output.
pub fn sort_groups(groups: &mut [DuplicateGroup]) {
    groups.sort_by(|a, b| {
        b.is_exact
            .cmp(&a.is_exact)
            .then_with(|| b.members.len().cmp(&a.members.len()))
            .then_with(|| a.members[0].cmp(&b.members[0]))
    });
}
