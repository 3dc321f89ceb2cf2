//! Duplicate detection.
//!
//! - [`bucket`]: per-(device, size) state, unhashed until a second file
//!   of that size shows up
//! - [`detector`]: the single-pass, hash-deferred detector
//! - [`finder`]: a whole run, from walking the roots to writing events

pub mod bucket;
pub mod detector;
pub mod finder;

pub use bucket::{Bucket, BucketKey, HashedFiles, KnownInode, Lookup};
pub use detector::{
    Detector, DetectorConfig, DetectorStats, DuplicatePair, DuplicateStream, Observation,
    SkipReason,
};
pub use finder::{DuplicateFinder, FinderConfig, FinderError, RunSummary};
