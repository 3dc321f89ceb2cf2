//! Per-(device, size) bucket state for deferred hashing.
//!
//! # Overview
//!
//! Every regular file the detector accepts lands in exactly one bucket,
//! keyed by [`BucketKey`]. A bucket starts out as [`Bucket::Unhashed`]
//! holding the single file seen so far, and turns into
//! [`Bucket::Hashed`] the first time a second, distinct file of the same
//! size shows up on the same device. It never turns back.
//!
//! # Example
//!
//! ```
//! use dedupe::duplicates::{Bucket, BucketKey, Lookup};
//! use dedupe::scanner::{ContentHash, FileIdentity};
//!
//! let a = FileIdentity::new("/a", 1, 10, 5);
//! let b = FileIdentity::new("/b", 1, 11, 5);
//! let hash = ContentHash::new("2cf24dba");
//!
//! assert_eq!(BucketKey::of(&a), BucketKey::of(&b));
//!
//! let mut bucket = Bucket::hashed(a.clone(), hash.clone());
//! if let Bucket::Hashed(files) = &mut bucket {
//!     assert_eq!(files.record(&b, hash), Lookup::Duplicate(a));
//! }
//! ```

use std::collections::HashMap;

use crate::scanner::{ContentHash, FileIdentity};

/// Bucket map key: files are only ever compared within one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketKey {
    /// Filesystem device
    pub device_id: u64,
    /// File size in bytes
    pub size: u64,
}

impl BucketKey {
    /// The key a file belongs to.
    #[must_use]
    pub fn of(file: &FileIdentity) -> Self {
        Self {
            device_id: file.device_id,
            size: file.size,
        }
    }
}

/// State of one bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bucket {
    /// One file seen so far; not hashed.
    Unhashed(FileIdentity),
    /// Two or more distinct files seen; every one of them hashed once.
    Hashed(HashedFiles),
}

impl Bucket {
    /// A hashed bucket whose only original is `first`.
    #[must_use]
    pub fn hashed(first: FileIdentity, hash: ContentHash) -> Self {
        Self::Hashed(HashedFiles::new(first, hash))
    }

    /// Whether the bucket has made its one-way transition.
    #[must_use]
    pub fn is_hashed(&self) -> bool {
        matches!(self, Self::Hashed(_))
    }

    /// Original recorded for `hash`, if any.
    #[must_use]
    pub fn original_for(&self, hash: &ContentHash) -> Option<&FileIdentity> {
        match self {
            Self::Unhashed(_) => None,
            Self::Hashed(files) => files.originals.get(hash),
        }
    }

    /// Number of distinct contents this bucket knows about.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Unhashed(_) => 1,
            Self::Hashed(files) => files.originals.len(),
        }
    }

    /// Buckets are never empty; provided alongside [`Bucket::len`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Outcome of offering a file to a hashed bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// The file's hash was new; it is now the original for that hash.
    Original,
    /// The file matches an existing original.
    Duplicate(FileIdentity),
}

/// Inode already known to a hashed bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KnownInode<'a> {
    /// The inode is one of the stored originals.
    Original,
    /// The inode was previously reported as a duplicate of `original`.
    Duplicate {
        /// Original the inode duplicates
        original: &'a FileIdentity,
        /// Shared content hash
        hash: &'a ContentHash,
    },
}

/// Contents of a [`Bucket::Hashed`].
///
/// `originals` maps each content hash to the first file seen with it and
/// is insert-only. `inodes` remembers the hash of every inode hashed in
/// this bucket so that a second path to the same inode is resolved
/// without reading it again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashedFiles {
    originals: HashMap<ContentHash, FileIdentity>,
    inodes: HashMap<u64, (ContentHash, bool)>,
}

impl HashedFiles {
    /// Start a hashed bucket from its first original.
    #[must_use]
    pub fn new(first: FileIdentity, hash: ContentHash) -> Self {
        let mut files = Self::default();
        files.insert_original(first, hash);
        files
    }

    fn insert_original(&mut self, file: FileIdentity, hash: ContentHash) {
        self.remember(&file, &hash, true);
        self.originals.entry(hash).or_insert(file);
    }

    fn remember(&mut self, file: &FileIdentity, hash: &ContentHash, is_original: bool) {
        if let Some(inode) = file.inode {
            self.inodes
                .entry(inode)
                .or_insert_with(|| (hash.clone(), is_original));
        }
    }

    /// Look up whether `file`'s inode has already been hashed here.
    #[must_use]
    pub fn known_inode(&self, file: &FileIdentity) -> Option<KnownInode<'_>> {
        let (hash, is_original) = self.inodes.get(&file.inode?)?;
        if *is_original {
            return Some(KnownInode::Original);
        }
        self.originals
            .get_key_value(hash)
            .map(|(hash, original)| KnownInode::Duplicate { original, hash })
    }

    /// Record a freshly hashed file.
    ///
    /// The first file seen with a hash becomes its original and is never
    /// replaced; later files with that hash are reported as duplicates of
    /// it and are not stored as originals.
    pub fn record(&mut self, file: &FileIdentity, hash: ContentHash) -> Lookup {
        if let Some(original) = self.originals.get(&hash) {
            let original = original.clone();
            self.remember(file, &hash, false);
            return Lookup::Duplicate(original);
        }
        self.insert_original(file.clone(), hash);
        Lookup::Original
    }

    /// Stored originals, in no particular order.
    pub fn originals(&self) -> impl Iterator<Item = (&ContentHash, &FileIdentity)> {
        self.originals.iter()
    }
}
