use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default fingerprint width: a 16x16 hash grid, 256 bits, 64 hex characters.
pub const DEFAULT_HASH_BITS: usize = 256;

#[derive(Debug, Error)]
pub enum FingerprintError {
    #[error("malformed fingerprint {value:?}: {reason}")]
    Malformed { value: String, reason: String },

    #[error("fingerprint width mismatch: {left} bits vs {right} bits")]
    DimensionMismatch { left: usize, right: usize },
}

/// Fixed-width perceptual fingerprint, parsed from a hex-encoded string.
///
/// Visually similar images hash to values at small Hamming distance, so the
/// distance between two fingerprints is the similarity signal for
/// near-duplicate detection. Width is enforced at parse time; distance is
/// only defined between fingerprints of equal width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerceptualHash {
    hex: String,
    bytes: Vec<u8>,
}

impl PerceptualHash {
    /// Parse a hex string into a fingerprint of exactly `expected_bits` bits.
    pub fn parse(hex: &str, expected_bits: usize) -> Result<Self, FingerprintError> {
        let expected_len = expected_bits / 4;
        if hex.len() != expected_len {
            return Err(FingerprintError::Malformed {
                value: hex.to_string(),
                reason: format!(
                    "expected {} hex characters, got {}",
                    expected_len,
                    hex.len()
                ),
            });
        }
        if hex.len() % 2 != 0 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(FingerprintError::Malformed {
                value: hex.to_string(),
                reason: "not a valid hex encoding".to_string(),
            });
        }

        let mut bytes = Vec::with_capacity(hex.len() / 2);
        for i in (0..hex.len()).step_by(2) {
            let byte = u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| {
                FingerprintError::Malformed {
                    value: hex.to_string(),
                    reason: format!("invalid hex pair at offset {}", i),
                }
            })?;
            bytes.push(byte);
        }

        Ok(Self {
            hex: hex.to_ascii_lowercase(),
            bytes,
        })
    }

    pub fn hex(&self) -> &str {
        &self.hex
    }

    pub fn bit_len(&self) -> usize {
        self.bytes.len() * 8
    }

    /// Leading hex characters used as the bucket key.
    pub fn prefix(&self, len: usize) -> &str {
        &self.hex[..len.min(self.hex.len())]
    }

    /// Hamming distance: the number of differing bit positions.
    pub fn distance(&self, other: &Self) -> Result<u32, FingerprintError> {
        if self.bit_len() != other.bit_len() {
            return Err(FingerprintError::DimensionMismatch {
                left: self.bit_len(),
                right: other.bit_len(),
            });
        }

        Ok(self
            .bytes
            .iter()
            .zip(&other.bytes)
            .map(|(a, b)| (a ^ b).count_ones())
            .sum())
    }
}

/// Cryptographic digest of the raw source bytes. Equal only for
/// byte-identical content; never compared by distance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl ContentHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
