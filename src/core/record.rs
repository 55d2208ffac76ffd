use serde::{Deserialize, Serialize};

use crate::core::fingerprint::ContentHash;

/// Whether a record is usable for matching. Failed records stay in the input
/// mapping for reporting but never enter the index or any group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordStatus {
    Valid,
    Failed(String),
}

impl Default for RecordStatus {
    fn default() -> Self {
        RecordStatus::Valid
    }
}

/// One scanned item's fingerprints plus minimal descriptive metadata.
///
/// Ids are assigned by the caller, never generated here. All fingerprint
/// fields are optional: upstream hashing may fail per item, and loosely
/// structured scanner output should still deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FingerprintRecord {
    pub item_id: String,
    /// Hex-encoded perceptual fingerprint (DCT-based).
    #[serde(default)]
    pub perceptual_hash: Option<String>,
    /// Hex-encoded gradient fingerprint, an independent second signal.
    #[serde(default)]
    pub secondary_hash: Option<String>,
    /// Digest of the raw source bytes, for exact-duplicate detection.
    #[serde(default)]
    pub content_hash: Option<ContentHash>,
    /// ISO-8601 timestamp; lexicographic order is chronological.
    #[serde(default)]
    pub creation_time: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub status: RecordStatus,
}

impl FingerprintRecord {
    pub fn new(item_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            perceptual_hash: None,
            secondary_hash: None,
            content_hash: None,
            creation_time: None,
            width: None,
            height: None,
            status: RecordStatus::Valid,
        }
    }

    pub fn failed(item_id: impl Into<String>, reason: impl Into<String>) -> Self {
        let mut record = Self::new(item_id);
        record.status = RecordStatus::Failed(reason.into());
        record
    }

    pub fn is_valid(&self) -> bool {
        matches!(self.status, RecordStatus::Valid)
    }

    /// Chronological sort key; a missing timestamp sorts before everything.
    pub fn sort_time(&self) -> &str {
        self.creation_time.as_deref().unwrap_or("")
    }
}
