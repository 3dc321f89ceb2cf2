//! Crash-safe replacement of a duplicate with a link to its original.
//!
//! # Overview
//!
//! The duplicate's directory entry is swapped in two steps:
//!
//! 1. A link to the original is created under a temporary name in the
//!    duplicate's directory (`.<hash>.dedupe-tmp`, then `.1`, `.2`, ... if
//!    that name is taken).
//! 2. The temporary link is renamed over the duplicate.
//!
//! Rename is atomic, so the duplicate's name always resolves to either its
//! old content or the original's content. The old content is never
//! removed before the replacement is in place.
//!
//! If anything fails after step 1, the temporary entry is removed by the
//! [`TempLink`] guard. A crash between the two steps can leave a
//! `.dedupe-tmp` entry behind; the duplicate itself is untouched.
//!
//! # Example
//!
//! ```no_run
//! use dedupe::actions::link::{replace_with_link, LinkKind};
//! use dedupe::scanner::ContentHash;
//! use std::path::Path;
//!
//! let hash = ContentHash::new("2cf24dba5fb0a30e");
//! replace_with_link(Path::new("a.txt"), Path::new("b.txt"), &hash, LinkKind::Hard)?;
//! # Ok::<(), dedupe::actions::link::LinkError>(())
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::Phase;
use crate::scanner::{ContentHash, FileIdentity};

/// Suffix of temporary link names.
pub const TEMP_SUFFIX: &str = ".dedupe-tmp";

/// Temporary names tried before giving up on a directory.
pub const MAX_TEMP_ATTEMPTS: u32 = 1000;

/// Kind of link a duplicate is replaced with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    /// A second name for the original's inode.
    Hard,
    /// A relative symbolic link pointing at the original.
    Symbolic,
}

/// Successful result of [`replace_with_link`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The duplicate now links to the original.
    Linked,
    /// Both names already resolved to the same file; nothing changed.
    AlreadyLinked,
}

/// Errors from the link protocol. Each one is fatal for its pair only.
#[derive(thiserror::Error, Debug)]
pub enum LinkError {
    /// The temporary link could not be created.
    #[error("Failed to create link {temp}: {source}")]
    Create {
        /// Temporary path that was attempted
        temp: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The temporary link could not be renamed over the duplicate.
    #[error("Failed to rename {temp} over {target}: {source}")]
    Rename {
        /// Temporary link (already removed)
        temp: PathBuf,
        /// Duplicate that was to be replaced
        target: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Every candidate temporary name in the directory was taken.
    #[error("No free temporary name in {dir} after {MAX_TEMP_ATTEMPTS} attempts")]
    TempNameExhausted {
        /// Directory of the duplicate
        dir: PathBuf,
    },

    /// Metadata of the original or the duplicate could not be read.
    #[error("Failed to inspect {path}: {source}")]
    Inspect {
        /// Path that could not be inspected
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The duplicate path has no parent directory.
    #[error("No parent directory for {0}")]
    NoParent(PathBuf),
}

impl LinkError {
    /// The step that failed.
    #[must_use]
    pub fn phase(&self) -> Phase {
        match self {
            Self::Rename { .. } => Phase::Rename,
            _ => Phase::Link,
        }
    }
}

/// Temporary link name for `hash`; `attempt` 0 has no numeric suffix.
#[must_use]
pub fn temp_link_name(hash: &ContentHash, attempt: u32) -> String {
    if attempt == 0 {
        format!(".{}{}", hash, TEMP_SUFFIX)
    } else {
        format!(".{}{}.{}", hash, TEMP_SUFFIX, attempt)
    }
}

/// Replace `duplicate` with a link to `original`.
///
/// # Errors
///
/// Returns a [`LinkError`] if either path cannot be inspected, the
/// temporary link cannot be created, or the rename fails. `duplicate` is
/// left in place with its old content in every error case.
pub fn replace_with_link(
    original: &Path,
    duplicate: &Path,
    hash: &ContentHash,
    kind: LinkKind,
) -> Result<LinkOutcome, LinkError> {
    if same_file(original, duplicate)? {
        log::debug!(
            "{} already links to {}",
            duplicate.display(),
            original.display()
        );
        return Ok(LinkOutcome::AlreadyLinked);
    }

    let dir = parent_dir(duplicate)?;
    let temp = match kind {
        LinkKind::Hard => TempLink::create(dir, hash, |temp| fs::hard_link(original, temp))?,
        LinkKind::Symbolic => {
            let target = relative_target(original, dir)?;
            log::debug!("Symlink target for {}: {}", duplicate.display(), target.display());
            TempLink::create(dir, hash, |temp| symlink(&target, temp))?
        }
    };

    temp.commit(duplicate)?;
    Ok(LinkOutcome::Linked)
}

/// Whether both paths resolve to the same inode on the same device.
fn same_file(original: &Path, duplicate: &Path) -> Result<bool, LinkError> {
    let inspect = |path: &Path| {
        fs::metadata(path)
            .map(|metadata| FileIdentity::from_metadata(path.to_path_buf(), &metadata))
            .map_err(|source| LinkError::Inspect {
                path: path.to_path_buf(),
                source,
            })
    };
    Ok(inspect(original)?.same_inode(&inspect(duplicate)?))
}

fn parent_dir(path: &Path) -> Result<&Path, LinkError> {
    match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Ok(Path::new(".")),
        Some(parent) => Ok(parent),
        None => Err(LinkError::NoParent(path.to_path_buf())),
    }
}

/// Path of `original` relative to the directory the link will live in.
///
/// Both sides are canonicalized first so `..` and symlinked directories
/// do not skew the result; if no relative form exists the canonical
/// absolute path is used.
fn relative_target(original: &Path, link_dir: &Path) -> Result<PathBuf, LinkError> {
    let canonical = |path: &Path| {
        fs::canonicalize(path).map_err(|source| LinkError::Inspect {
            path: path.to_path_buf(),
            source,
        })
    };
    let original = canonical(original)?;
    let link_dir = canonical(link_dir)?;
    Ok(pathdiff::diff_paths(&original, &link_dir).unwrap_or(original))
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

/// A link under a temporary name, removed on drop unless committed.
#[derive(Debug)]
pub struct TempLink {
    path: PathBuf,
    committed: bool,
}

impl TempLink {
    /// Create a temporary entry in `dir` with `make`, trying successive
    /// names while the previous one already exists.
    ///
    /// # Errors
    ///
    /// [`LinkError::Create`] if `make` fails for any reason other than
    /// the name being taken; [`LinkError::TempNameExhausted`] if every
    /// name is taken.
    pub fn create<F>(dir: &Path, hash: &ContentHash, make: F) -> Result<Self, LinkError>
    where
        F: FnMut(&Path) -> io::Result<()>,
    {
        Self::create_within(dir, hash, MAX_TEMP_ATTEMPTS, make)
    }

    fn create_within<F>(
        dir: &Path,
        hash: &ContentHash,
        max_attempts: u32,
        mut make: F,
    ) -> Result<Self, LinkError>
    where
        F: FnMut(&Path) -> io::Result<()>,
    {
        for attempt in 0..max_attempts {
            let path = dir.join(temp_link_name(hash, attempt));
            match make(&path) {
                Ok(()) => {
                    log::debug!("Created temporary link {}", path.display());
                    return Ok(Self {
                        path,
                        committed: false,
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    log::debug!("Temporary name {} is taken", path.display());
                }
                Err(source) => {
                    log::warn!("Failed to create link {}: {}", path.display(), source);
                    return Err(LinkError::Create { temp: path, source });
                }
            }
        }

        Err(LinkError::TempNameExhausted {
            dir: dir.to_path_buf(),
        })
    }

    /// Path of the temporary entry.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomically rename the temporary entry over `target`.
    ///
    /// # Errors
    ///
    /// [`LinkError::Rename`] if the rename fails; the temporary entry is
    /// removed before returning.
    pub fn commit(mut self, target: &Path) -> Result<(), LinkError> {
        if let Err(source) = fs::rename(&self.path, target) {
            log::warn!(
                "Failed to rename {} over {}: {}",
                self.path.display(),
                target.display(),
                source
            );
            return Err(LinkError::Rename {
                temp: self.path.clone(),
                target: target.to_path_buf(),
                source,
            });
        }
        self.committed = true;
        log::debug!("Replaced {}", target.display());
        Ok(())
    }
}

impl Drop for TempLink {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match fs::remove_file(&self.path) {
            Ok(()) => log::debug!("Removed temporary link {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::warn!(
                "Failed to remove temporary link {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}
