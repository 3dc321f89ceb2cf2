//! Hash-deferred duplicate detection.
//!
//! # Overview
//!
//! The [`Detector`] consumes candidate paths one at a time and decides,
//! for each, whether it duplicates a file seen earlier in the same pass.
//! Content is only hashed once a second distinct file lands in the same
//! (device, size) bucket, so files with a unique size are never read.
//!
//! Candidates are processed strictly in input order and each one runs to
//! completion before the next starts. The first file seen with a given
//! hash is the original for every later file with that hash.
//!
//! # Example
//!
//! ```no_run
//! use dedupe::duplicates::{Detector, DetectorConfig};
//! use dedupe::scanner::{LocalInspector, Walker, WalkerConfig};
//! use std::path::PathBuf;
//!
//! let walker = Walker::new(vec![PathBuf::from(".")], WalkerConfig::default());
//! let detector = Detector::new(LocalInspector::default(), DetectorConfig::default());
//!
//! for pair in detector.stream(walker.walk().filter_map(Result::ok)) {
//!     match pair {
//!         Ok(pair) => println!(
//!             "{} duplicates {}",
//!             pair.duplicate.path.display(),
//!             pair.original.path.display()
//!         ),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use super::bucket::{Bucket, BucketKey, HashedFiles, KnownInode, Lookup};
use crate::progress::ProgressCallback;
use crate::scanner::{ContentHash, FileIdentity, FileInspector, HashError, Inspected, ScanError};

/// Detector configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectorConfig {
    /// Files smaller than this many bytes are skipped. `0` keeps everything.
    pub min_size: u64,
}

impl DetectorConfig {
    /// Set the minimum file size.
    #[must_use]
    pub fn with_min_size(mut self, min_size: u64) -> Self {
        self.min_size = min_size;
        self
    }
}

/// Two byte-identical files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicatePair {
    /// First file seen with this content
    pub original: FileIdentity,
    /// Later file with the same content
    pub duplicate: FileIdentity,
    /// Content hash shared by both
    pub hash: ContentHash,
}

/// Why a candidate produced no further work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Symbolic link, directory or special file.
    NotAFile,
    /// Smaller than the configured minimum.
    BelowMinSize,
    /// Another path to a file already in its bucket.
    SameInode,
}

/// Result of observing one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// The candidate duplicates an earlier original.
    Duplicate(DuplicatePair),
    /// The candidate is, so far, the only file with its content.
    Unique,
    /// The candidate was not considered.
    Skipped(SkipReason),
}

/// Counters for one detection pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DetectorStats {
    /// Candidate paths observed
    pub candidates: u64,
    /// Candidates that were not regular files
    pub not_files: u64,
    /// Regular files below the minimum size
    pub below_min_size: u64,
    /// Files skipped because their inode was already in the bucket
    pub same_inode: u64,
    /// Successful content hash computations
    pub files_hashed: u64,
    /// Bytes read by those computations
    pub bytes_hashed: u64,
    /// Duplicate pairs emitted
    pub duplicates: u64,
    /// Candidates abandoned because of an error
    pub errors: u64,
}

/// The hash-deferred duplicate detector.
///
/// Owns the bucket map for exactly one pass; start a new pass by creating
/// a new detector.
pub struct Detector<P: FileInspector> {
    inspector: P,
    config: DetectorConfig,
    buckets: HashMap<BucketKey, Bucket>,
    /// Hash of an `Unhashed` bucket's file, kept when its first collision
    /// failed on the other file, so the next collision does not read it again.
    occupant_hashes: HashMap<BucketKey, ContentHash>,
    stats: DetectorStats,
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl<P: FileInspector> std::fmt::Debug for Detector<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Detector")
            .field("config", &self.config)
            .field("buckets", &self.buckets.len())
            .field("stats", &self.stats)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish_non_exhaustive()
    }
}

impl<P: FileInspector> Detector<P> {
    /// Create a detector with an empty bucket map.
    #[must_use]
    pub fn new(inspector: P, config: DetectorConfig) -> Self {
        Self {
            inspector,
            config,
            buckets: HashMap::new(),
            occupant_hashes: HashMap::new(),
            stats: DetectorStats::default(),
            progress_callback: None,
        }
    }

    /// Report every content hash to `callback`.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Counters so far.
    #[must_use]
    pub fn stats(&self) -> &DetectorStats {
        &self.stats
    }

    /// Current state of one bucket.
    #[must_use]
    pub fn bucket(&self, key: &BucketKey) -> Option<&Bucket> {
        self.buckets.get(key)
    }

    /// Number of buckets created so far.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Process one candidate to completion.
    ///
    /// # Errors
    ///
    /// Returns a [`ScanError`] when the candidate's metadata cannot be read
    /// or a file involved in the comparison cannot be hashed. The bucket
    /// map is left exactly as it was before the call in that case.
    pub fn observe(&mut self, path: &Path) -> Result<Observation, ScanError> {
        self.stats.candidates += 1;
        let result = self.classify(path);

        match &result {
            Ok(Observation::Duplicate(pair)) => {
                self.stats.duplicates += 1;
                log::debug!(
                    "Duplicate: {} == {} ({})",
                    pair.duplicate.path.display(),
                    pair.original.path.display(),
                    pair.hash.short(12)
                );
            }
            Ok(Observation::Skipped(reason)) => {
                match reason {
                    SkipReason::NotAFile => self.stats.not_files += 1,
                    SkipReason::BelowMinSize => self.stats.below_min_size += 1,
                    SkipReason::SameInode => self.stats.same_inode += 1,
                }
                log::trace!("Skipped {} ({:?})", path.display(), reason);
            }
            Ok(Observation::Unique) => {}
            Err(_) => self.stats.errors += 1,
        }

        result
    }

    fn classify(&mut self, path: &Path) -> Result<Observation, ScanError> {
        let file = match self.inspector.identify(path)? {
            Inspected::File(file) => file,
            Inspected::NotAFile => return Ok(Observation::Skipped(SkipReason::NotAFile)),
        };
        if file.size < self.config.min_size {
            return Ok(Observation::Skipped(SkipReason::BelowMinSize));
        }

        let key = BucketKey::of(&file);
        let Self {
            inspector,
            buckets,
            occupant_hashes,
            stats,
            progress_callback,
            ..
        } = self;
        let mut read = |file: &FileIdentity| {
            hash_with(inspector, stats, progress_callback.as_deref(), file)
        };

        let mut slot = match buckets.entry(key) {
            Entry::Vacant(slot) => {
                log::trace!("New bucket for {} ({} bytes)", file.path.display(), file.size);
                slot.insert(Bucket::Unhashed(file));
                return Ok(Observation::Unique);
            }
            Entry::Occupied(slot) => slot,
        };

        match slot.get_mut() {
            Bucket::Unhashed(existing) => {
                if existing.same_inode(&file) {
                    return Ok(Observation::Skipped(SkipReason::SameInode));
                }

                // First collision for this key: both files are hashed now
                // and never again.
                let existing_hash = match occupant_hashes.remove(&key) {
                    Some(hash) => hash,
                    None => read(existing)?,
                };
                let hash = match read(&file) {
                    Ok(hash) => hash,
                    Err(e) => {
                        occupant_hashes.insert(key, existing_hash);
                        return Err(e);
                    }
                };
                let mut files = HashedFiles::new(existing.clone(), existing_hash);
                let lookup = files.record(&file, hash.clone());
                slot.insert(Bucket::Hashed(files));
                Ok(observation(lookup, file, hash))
            }
            Bucket::Hashed(files) => match files.known_inode(&file) {
                Some(KnownInode::Original) => Ok(Observation::Skipped(SkipReason::SameInode)),
                Some(KnownInode::Duplicate { original, hash }) => {
                    Ok(Observation::Duplicate(DuplicatePair {
                        original: original.clone(),
                        duplicate: file,
                        hash: hash.clone(),
                    }))
                }
                None => {
                    let hash = read(&file)?;
                    let lookup = files.record(&file, hash.clone());
                    Ok(observation(lookup, file, hash))
                }
            },
        }
    }

    /// Turn a sequence of candidate paths into a lazy sequence of
    /// duplicate pairs.
    pub fn stream<I>(self, paths: I) -> DuplicateStream<P, I::IntoIter>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        DuplicateStream {
            detector: self,
            paths: paths.into_iter(),
        }
    }
}

fn observation(lookup: Lookup, file: FileIdentity, hash: ContentHash) -> Observation {
    match lookup {
        Lookup::Original => Observation::Unique,
        Lookup::Duplicate(original) => Observation::Duplicate(DuplicatePair {
            original,
            duplicate: file,
            hash,
        }),
    }
}

fn hash_with<P: FileInspector>(
    inspector: &P,
    stats: &mut DetectorStats,
    progress: Option<&dyn ProgressCallback>,
    file: &FileIdentity,
) -> Result<ContentHash, ScanError> {
    match inspector.content_hash(file) {
        Ok(hash) => {
            stats.files_hashed += 1;
            stats.bytes_hashed += file.size;
            log::trace!("Hashed {} -> {}", file.path.display(), hash.short(12));
            if let Some(callback) = progress {
                callback.on_hash(&file.path, file.size);
            }
            Ok(hash)
        }
        Err(e) => {
            if !matches!(e, HashError::Interrupted(_)) {
                log::warn!("Failed to hash {}: {}", file.path.display(), e);
            }
            Err(e.into())
        }
    }
}

/// Lazy iterator of duplicate pairs; see [`Detector::stream`].
///
/// Per-candidate errors are yielded without ending the sequence.
pub struct DuplicateStream<P: FileInspector, I> {
    detector: Detector<P>,
    paths: I,
}

impl<P: FileInspector, I> DuplicateStream<P, I> {
    /// The detector driving this stream.
    #[must_use]
    pub fn detector(&self) -> &Detector<P> {
        &self.detector
    }

    /// Stop streaming and hand back the detector.
    #[must_use]
    pub fn into_detector(self) -> Detector<P> {
        self.detector
    }
}

impl<P, I> Iterator for DuplicateStream<P, I>
where
    P: FileInspector,
    I: Iterator<Item = PathBuf>,
{
    type Item = Result<DuplicatePair, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        for path in self.paths.by_ref() {
            match self.detector.observe(&path) {
                Ok(Observation::Duplicate(pair)) => return Some(Ok(pair)),
                Ok(_) => {}
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}
