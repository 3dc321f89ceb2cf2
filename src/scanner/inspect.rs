//! Filesystem access used by the duplicate detector.
//!
//! The detector never touches `std::fs` directly. It asks a [`FileInspector`]
//! for a candidate's identity and, only when a size collision requires
//! it, for the candidate's content hash. [`LocalInspector`] is the real
//! implementation; tests substitute in-memory inspectors to control device
//! ids and count hash calls.

use std::fs;
use std::path::Path;

use super::{ContentHash, FileIdentity, HashError, Hasher, ScanError};

/// Result of querying a candidate path's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inspected {
    /// A regular file.
    File(FileIdentity),
    /// A symbolic link, directory, or special file.
    NotAFile,
}

/// Metadata and content access for candidate files.
pub trait FileInspector {
    /// Query `path` without following symbolic links.
    ///
    /// # Errors
    ///
    /// Returns a [`ScanError`] if the metadata cannot be read.
    fn identify(&self, path: &Path) -> Result<Inspected, ScanError>;

    /// Hash the full content of `file`.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] if the file cannot be read to the end.
    fn content_hash(&self, file: &FileIdentity) -> Result<ContentHash, HashError>;
}

impl<P: FileInspector + ?Sized> FileInspector for &P {
    fn identify(&self, path: &Path) -> Result<Inspected, ScanError> {
        (**self).identify(path)
    }

    fn content_hash(&self, file: &FileIdentity) -> Result<ContentHash, HashError> {
        (**self).content_hash(file)
    }
}

/// [`FileInspector`] over the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct LocalInspector {
    hasher: Hasher,
}

impl LocalInspector {
    /// Create an inspector hashing with `hasher`.
    #[must_use]
    pub fn new(hasher: Hasher) -> Self {
        Self { hasher }
    }

    /// The hasher used for content hashes.
    #[must_use]
    pub fn hasher(&self) -> &Hasher {
        &self.hasher
    }
}

impl FileInspector for LocalInspector {
    fn identify(&self, path: &Path) -> Result<Inspected, ScanError> {
        let metadata = fs::symlink_metadata(path).map_err(|e| ScanError::from_io(path, e))?;
        if !metadata.file_type().is_file() {
            return Ok(Inspected::NotAFile);
        }
        Ok(Inspected::File(FileIdentity::from_metadata(
            path.to_path_buf(),
            &metadata,
        )))
    }

    fn content_hash(&self, file: &FileIdentity) -> Result<ContentHash, HashError> {
        self.hasher.hash_file(&file.path)
    }
}
