use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::fingerprint::DEFAULT_HASH_BITS;
use crate::core::group::KeepStrategy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("similarity threshold {threshold} exceeds the {hash_bits}-bit hash width")]
    ThresholdTooLarge { threshold: u32, hash_bits: usize },

    #[error("bucket prefix length {prefix} must be shorter than the {hex_len}-character hash")]
    PrefixTooLong { prefix: usize, hex_len: usize },

    #[error("hash width must be a positive multiple of 8 bits, got {bits}")]
    InvalidHashBits { bits: usize },

    #[error("invalid configuration document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Tuning knobs for one detection run. Every field has a default, so a
/// partial JSON document or `DetectorConfig::default()` yields a working
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Max Hamming distance for an approximate match.
    pub similarity_threshold: u32,
    /// Which group member to mark as the keeper.
    pub keep_strategy: KeepStrategy,
    /// Hex characters of the bucket key. Longer prefixes mean smaller
    /// buckets and less comparison work, at some recall cost.
    pub bucket_prefix_length: usize,
    /// How many lexicographically following buckets each bucket is compared
    /// against, to catch near-matches straddling a bucket boundary.
    pub bucket_neighbor_window: usize,
    /// Group size above which pairwise internal distances are not computed.
    pub exact_distance_cutoff: usize,
    /// Fingerprint width in bits.
    pub hash_bits: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 6,
            keep_strategy: KeepStrategy::Oldest,
            bucket_prefix_length: 4,
            bucket_neighbor_window: 2,
            exact_distance_cutoff: 10,
            hash_bits: DEFAULT_HASH_BITS,
        }
    }
}

impl DetectorConfig {
    /// Hex string length implied by the configured bit width.
    pub fn hex_len(&self) -> usize {
        self.hash_bits / 4
    }

    /// Check structural invariants once, before a run does any work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hash_bits == 0 || self.hash_bits % 8 != 0 {
            return Err(ConfigError::InvalidHashBits {
                bits: self.hash_bits,
            });
        }
        if self.similarity_threshold as usize > self.hash_bits {
            return Err(ConfigError::ThresholdTooLarge {
                threshold: self.similarity_threshold,
                hash_bits: self.hash_bits,
            });
        }
        if self.bucket_prefix_length >= self.hex_len() {
            return Err(ConfigError::PrefixTooLong {
                prefix: self.bucket_prefix_length,
                hex_len: self.hex_len(),
            });
        }
        Ok(())
    }

    /// Parse a JSON configuration document. Missing keys fall back to
    /// defaults; unknown keys are ignored.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }
}
