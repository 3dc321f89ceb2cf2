//! Scanner module: file identity, content hashing and candidate discovery.
//!
//! This module provides functionality for:
//! - Lazy enumeration of candidate paths using walkdir
//! - Content hashing with a selectable algorithm
//! - Device/inode identity so aliased files are recognized without hashing
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and candidate discovery
//! - [`hasher`]: Algorithm registry and streaming hasher
//! - [`inspect`]: The filesystem seam the detector reads through
//!
//! # Example
//!
//! ```no_run
//! use dedupe::scanner::{Walker, WalkerConfig};
//! use std::path::PathBuf;
//!
//! let walker = Walker::new(vec![PathBuf::from(".")], WalkerConfig::default());
//! for candidate in walker.walk() {
//!     match candidate {
//!         Ok(path) => println!("{}", path.display()),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod hasher;
pub mod inspect;
pub mod walker;

use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

pub use hasher::{available_names, ContentHash, HashAlgorithm, Hasher, UnknownAlgorithm};
pub use inspect::{FileInspector, Inspected, LocalInspector};
pub use walker::Walker;

/// Identity of a regular file as seen by one metadata query.
///
/// `device_id` + `inode` detect aliasing (hard links, repeated traversal)
/// without reading content; `size` selects the bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FileIdentity {
    /// Path the file was reached through
    pub path: PathBuf,
    /// Filesystem device the file lives on
    pub device_id: u64,
    /// Inode number on that device; `None` where the platform cannot
    /// report one. Unknown inodes never compare as the same file.
    pub inode: Option<u64>,
    /// File size in bytes
    pub size: u64,
}

impl FileIdentity {
    /// Create a new FileIdentity.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, device_id: u64, inode: u64, size: u64) -> Self {
        Self {
            path: path.into(),
            device_id,
            inode: Some(inode),
            size,
        }
    }

    /// Create an identity whose inode is not known.
    #[must_use]
    pub fn without_inode(path: impl Into<PathBuf>, device_id: u64, size: u64) -> Self {
        Self {
            path: path.into(),
            device_id,
            inode: None,
            size,
        }
    }

    /// Build an identity from metadata obtained for `path`.
    #[cfg(unix)]
    #[must_use]
    pub fn from_metadata(path: PathBuf, metadata: &Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;
        Self::new(path, metadata.dev(), metadata.ino(), metadata.len())
    }

    /// Build an identity from metadata obtained for `path`.
    ///
    /// Device and inode are not exposed through std metadata here, so
    /// same-file detection is disabled and files are compared by content.
    #[cfg(not(unix))]
    #[must_use]
    pub fn from_metadata(path: PathBuf, metadata: &Metadata) -> Self {
        Self::without_inode(path, 0, metadata.len())
    }

    /// Whether both identities name the same underlying file.
    #[must_use]
    pub fn same_inode(&self, other: &Self) -> bool {
        self.inode.is_some() && self.inode == other.inode && self.device_id == other.device_id
    }
}

/// Configuration for candidate enumeration.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Descend into subdirectories. When false only the immediate
    /// children of each root are listed.
    pub recurse: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Glob patterns to ignore (gitignore-style), relative to each root.
    pub ignore_patterns: Vec<String>,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            recurse: true,
            skip_hidden: false,
            ignore_patterns: Vec::new(),
        }
    }
}

impl WalkerConfig {
    /// Set whether to descend into subdirectories.
    #[must_use]
    pub fn with_recurse(mut self, recurse: bool) -> Self {
        self.recurse = recurse;
        self
    }

    /// Set whether hidden entries are skipped.
    #[must_use]
    pub fn with_skip_hidden(mut self, skip_hidden: bool) -> Self {
        self.skip_hidden = skip_hidden;
        self
    }

    /// Set the ignore patterns.
    #[must_use]
    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }
}

/// Errors that can occur while examining a single candidate.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The path disappeared or never existed.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while reading metadata.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Content hashing failed.
    #[error(transparent)]
    HashError(#[from] HashError),
}

impl ScanError {
    /// Classify a metadata/traversal I/O error for `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// The path the error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::PermissionDenied(p) | Self::NotFound(p) | Self::Io { path: p, .. } => p,
            Self::HashError(e) => e.path(),
        }
    }

    /// Whether the failure happened while reading content (as opposed to
    /// querying metadata or traversing).
    #[must_use]
    pub fn is_hash_error(&self) -> bool {
        matches!(self, Self::HashError(_))
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The file disappeared between the metadata query and the read.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Hashing stopped because shutdown was requested.
    #[error("Hashing interrupted: {0}")]
    Interrupted(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl HashError {
    /// Classify a read error for `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// The path that failed to hash.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) | Self::Interrupted(p) => p,
            Self::Io { path, .. } => path,
        }
    }
}
