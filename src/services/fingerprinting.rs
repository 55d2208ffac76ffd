use std::path::Path;

use anyhow::{Context, Result};
use image_hasher::{HashAlg, Hasher, HasherConfig};
use rayon::prelude::*;
use sha2::{Digest, Sha256};

use crate::core::fingerprint::{ContentHash, DEFAULT_HASH_BITS};
use crate::core::record::{FingerprintRecord, RecordStatus};

/// Produces `FingerprintRecord`s from raw image bytes: a DCT perceptual
/// hash, a gradient hash as an independent second signal, and a SHA-256
/// digest of the bytes themselves.
///
/// A decode failure yields a `Failed` record instead of an error, so one
/// corrupt image never aborts a batch. The content digest is still computed
/// for failed records since it only needs the raw bytes.
pub struct FingerprintService {
    perceptual: Hasher,
    gradient: Hasher,
    hash_bits: usize,
}

impl FingerprintService {
    pub fn new() -> Self {
        Self::with_hash_bits(DEFAULT_HASH_BITS)
    }

    /// `hash_bits` must be a perfect square (the hash grid is square); the
    /// default 256 gives a 16x16 grid.
    pub fn with_hash_bits(hash_bits: usize) -> Self {
        let side = (hash_bits as f64).sqrt() as u32;
        Self {
            perceptual: HasherConfig::new()
                .hash_size(side, side)
                .hash_alg(HashAlg::Mean)
                .preproc_dct()
                .to_hasher(),
            gradient: HasherConfig::new()
                .hash_size(side, side)
                .hash_alg(HashAlg::Gradient)
                .to_hasher(),
            hash_bits,
        }
    }

    pub fn hash_bits(&self) -> usize {
        self.hash_bits
    }

    /// Fingerprint one image from its encoded bytes.
    pub fn fingerprint_bytes(&self, item_id: &str, bytes: &[u8]) -> FingerprintRecord {
        let mut record = FingerprintRecord::new(item_id);
        record.content_hash = Some(ContentHash(sha256_hex(bytes)));

        let image = match image::load_from_memory(bytes) {
            Ok(image) => image,
            Err(err) => {
                log::warn!("failed to decode {}: {}", item_id, err);
                record.status = RecordStatus::Failed(err.to_string());
                return record;
            }
        };

        record.width = Some(image.width());
        record.height = Some(image.height());
        record.perceptual_hash = Some(hex_encode(self.perceptual.hash_image(&image).as_bytes()));
        record.secondary_hash = Some(hex_encode(self.gradient.hash_image(&image).as_bytes()));
        record
    }

    /// Fingerprint an image file on disk.
    pub fn fingerprint_file(&self, item_id: &str, path: &Path) -> Result<FingerprintRecord> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(self.fingerprint_bytes(item_id, &bytes))
    }

    /// Fingerprint many images in parallel. Output order matches input
    /// order.
    pub fn fingerprint_batch(&self, items: &[(String, Vec<u8>)]) -> Vec<FingerprintRecord> {
        items
            .par_iter()
            .map(|(item_id, bytes)| self.fingerprint_bytes(item_id, bytes))
            .collect()
    }
}

impl Default for FingerprintService {
    fn default() -> Self {
        Self::new()
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageBuffer, Rgb};
    use std::io::Cursor;

    fn test_image_bytes(width: u32, height: u32, seed: u8) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            let intensity = ((x * 7 + y * 13) % 256) as u8 ^ seed;
            Rgb([intensity, intensity.wrapping_add(seed), intensity])
        });

        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_fingerprint_has_configured_width() {
        let service = FingerprintService::new();
        let record = service.fingerprint_bytes("img", &test_image_bytes(64, 64, 0));

        assert!(record.is_valid());
        let hex = record.perceptual_hash.unwrap();
        assert_eq!(hex.len(), service.hash_bits() / 4);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));

        let secondary = record.secondary_hash.unwrap();
        assert_eq!(secondary.len(), service.hash_bits() / 4);
    }

    #[test]
    fn test_identical_bytes_identical_fingerprints() {
        let service = FingerprintService::new();
        let bytes = test_image_bytes(64, 48, 3);

        let a = service.fingerprint_bytes("a", &bytes);
        let b = service.fingerprint_bytes("b", &bytes);

        assert_eq!(a.perceptual_hash, b.perceptual_hash);
        assert_eq!(a.secondary_hash, b.secondary_hash);
        assert_eq!(a.content_hash, b.content_hash);
        assert_eq!(a.width, Some(64));
        assert_eq!(a.height, Some(48));
    }

    #[test]
    fn test_different_content_different_digest() {
        let service = FingerprintService::new();

        let a = service.fingerprint_bytes("a", &test_image_bytes(64, 64, 0));
        let b = service.fingerprint_bytes("b", &test_image_bytes(64, 64, 255));

        assert_ne!(a.content_hash, b.content_hash);
    }

    #[test]
    fn test_undecodable_bytes_yield_failed_record() {
        let service = FingerprintService::new();
        let record = service.fingerprint_bytes("broken", b"not an image at all");

        assert!(!record.is_valid());
        assert!(matches!(record.status, RecordStatus::Failed(_)));
        assert!(record.perceptual_hash.is_none());
        // The digest only needs the bytes, so it survives the decode failure.
        assert!(record.content_hash.is_some());
    }

    #[test]
    fn test_batch_preserves_input_order() {
        let service = FingerprintService::new();
        let items: Vec<(String, Vec<u8>)> = (0..4)
            .map(|i| (format!("img-{}", i), test_image_bytes(32, 32, i as u8 * 40)))
            .collect();

        let records = service.fingerprint_batch(&items);

        assert_eq!(records.len(), 4);
        for (record, (id, bytes)) in records.iter().zip(&items) {
            assert_eq!(&record.item_id, id);
            assert_eq!(record, &service.fingerprint_bytes(id, bytes));
        }
    }

    #[test]
    fn test_fingerprint_file_matches_bytes() {
        let service = FingerprintService::new();
        let bytes = test_image_bytes(64, 64, 9);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, &bytes).unwrap();

        let from_file = service.fingerprint_file("photo", &path).unwrap();
        let from_bytes = service.fingerprint_bytes("photo", &bytes);

        assert_eq!(from_file, from_bytes);
    }

    #[test]
    fn test_service_output_feeds_detector() {
        use crate::core::config::DetectorConfig;
        use crate::core::detector::DuplicateDetector;
        use std::collections::HashMap;

        let service = FingerprintService::new();
        let bytes = test_image_bytes(64, 64, 5);

        let mut records = HashMap::new();
        for id in ["copy-1", "copy-2"] {
            records.insert(id.to_string(), service.fingerprint_bytes(id, &bytes));
        }

        let report = DuplicateDetector::new(DetectorConfig::default())
            .detect(&records)
            .unwrap();

        assert_eq!(report.groups.len(), 1);
        assert!(report.groups[0].is_exact);
        assert_eq!(report.groups[0].max_internal_distance, Some(0));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let service = FingerprintService::new();
        let err = service
            .fingerprint_file("gone", Path::new("/no/such/photo.png"))
            .unwrap_err();

        assert!(err.to_string().contains("/no/such/photo.png"));
    }
}
