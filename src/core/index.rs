use std::collections::{BTreeMap, HashMap, HashSet};

use crate::core::config::DetectorConfig;
use crate::core::fingerprint::{FingerprintError, PerceptualHash};

/// One fingerprint admitted to the index.
#[derive(Debug, Clone)]
pub struct IndexedItem {
    pub id: String,
    pub hash: PerceptualHash,
}

/// A verified pair at Hamming distance within the threshold. `left` and
/// `right` are positions in the slice passed to
/// [`SimilarityIndex::find_matches`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub left: usize,
    pub right: usize,
    pub distance: u32,
}

/// Prefix-bucketed approximate matcher.
///
/// Fingerprints sharing their leading hex characters land in one bucket, and
/// full Hamming distances are only computed within a bucket and against the
/// next few lexicographically adjacent buckets. The bucket key is a locality
/// heuristic, not a correctness guarantee: a wider neighbor window trades
/// more comparisons for better recall on boundary-straddling pairs.
pub struct SimilarityIndex {
    threshold: u32,
    prefix_length: usize,
    neighbor_window: usize,
}

impl SimilarityIndex {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            threshold: config.similarity_threshold,
            prefix_length: config.bucket_prefix_length,
            neighbor_window: config.bucket_neighbor_window,
        }
    }

    /// All pairs at distance <= threshold that share a bucket or sit in
    /// adjacent buckets. Each pair is compared at most once; byte-identical
    /// fingerprints are linked up front without a distance computation.
    pub fn find_matches(&self, items: &[IndexedItem]) -> Result<Vec<Match>, FingerprintError> {
        let mut matches = Vec::new();
        let mut seen: HashSet<(usize, usize)> = HashSet::new();

        // Identical hash strings are always duplicates, regardless of
        // threshold.
        let mut identical: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, item) in items.iter().enumerate() {
            identical.entry(item.hash.hex()).or_default().push(i);
        }
        for group in identical.values() {
            let first = group[0];
            for &other in &group[1..] {
                seen.insert(ordered(first, other));
                matches.push(Match {
                    left: first,
                    right: other,
                    distance: 0,
                });
            }
        }

        // BTreeMap keeps the buckets in lexicographic order for the
        // adjacency walk.
        let mut buckets: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (i, item) in items.iter().enumerate() {
            buckets
                .entry(item.hash.prefix(self.prefix_length))
                .or_default()
                .push(i);
        }

        let keys: Vec<&str> = buckets.keys().copied().collect();
        log::debug!(
            "comparing {} fingerprints across {} buckets",
            items.len(),
            keys.len()
        );

        for (position, key) in keys.iter().enumerate() {
            let bucket = &buckets[key];

            for (i, &left) in bucket.iter().enumerate() {
                for &right in &bucket[i + 1..] {
                    self.compare(items, left, right, &mut seen, &mut matches)?;
                }
            }

            // Near-matches can straddle a bucket boundary; check the next few
            // buckets in prefix order.
            for neighbor_key in keys.iter().skip(position + 1).take(self.neighbor_window) {
                for &left in bucket {
                    for &right in &buckets[neighbor_key] {
                        self.compare(items, left, right, &mut seen, &mut matches)?;
                    }
                }
            }
        }

        Ok(matches)
    }

    fn compare(
        &self,
        items: &[IndexedItem],
        left: usize,
        right: usize,
        seen: &mut HashSet<(usize, usize)>,
        matches: &mut Vec<Match>,
    ) -> Result<(), FingerprintError> {
        if !seen.insert(ordered(left, right)) {
            return Ok(());
        }
        let distance = items[left].hash.distance(&items[right].hash)?;
        if distance <= self.threshold {
            matches.push(Match {
                left,
                right,
                distance,
            });
        }
        Ok(())
    }
}

fn ordered(a: usize, b: usize) -> (usize, usize) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
