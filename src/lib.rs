//! Duplicate photo detection engine.
//!
//! Clusters large image collections into groups of exact and near-duplicates
//! from precomputed content fingerprints, at a scale (tens of thousands of
//! items) where comparing every pair is infeasible. Prefix bucketing bounds
//! the comparison work, union-find consolidates matches into groups, and a
//! policy pass orders each group and marks which member to keep.
//!
//! The engine performs no I/O: callers supply a mapping of item id to
//! [`FingerprintRecord`] and receive ordered [`DuplicateGroup`]s plus
//! run-level counts. The [`FingerprintService`] produces those records from
//! raw image bytes for callers that do not already have fingerprints.

pub mod core;
pub mod services;

pub use crate::core::config::{ConfigError, DetectorConfig};
pub use crate::core::detector::{
    DetectError, DetectionReport, DetectionSummary, DuplicateDetector,
};
pub use crate::core::fingerprint::{
    ContentHash, FingerprintError, PerceptualHash, DEFAULT_HASH_BITS,
};
pub use crate::core::group::{DuplicateGroup, KeepStrategy};
pub use crate::core::record::{FingerprintRecord, RecordStatus};
pub use crate::services::fingerprinting::FingerprintService;
