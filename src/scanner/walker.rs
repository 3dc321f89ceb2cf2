//! Candidate path enumeration using walkdir.
//!
//! # Overview
//!
//! [`Walker`] lazily yields every non-directory entry under a set of roots,
//! in a deterministic order: roots in the order given, entries sorted by
//! file name within each directory. Nothing is stat'ed beyond what the
//! traversal itself needs; deciding whether an entry is a regular file is
//! left to the detector.
//!
//! # Features
//!
//! - Recursive or single-level listing
//! - Gitignore-style pattern matching via the `ignore` crate
//! - Hidden file filtering
//! - Symbolic links are listed but never followed
//! - Graceful shutdown via atomic flag
//!
//! # Example
//!
//! ```no_run
//! use dedupe::scanner::{Walker, WalkerConfig};
//! use std::path::PathBuf;
//!
//! let config = WalkerConfig::default().with_recurse(false);
//! let walker = Walker::new(vec![PathBuf::from("/home/user/Downloads")], config);
//! let paths: Vec<_> = walker.walk().filter_map(Result::ok).collect();
//! println!("{} candidates", paths.len());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use walkdir::{DirEntry, WalkDir};

use super::{ScanError, WalkerConfig};

/// Lazy producer of candidate paths.
#[derive(Debug)]
pub struct Walker {
    /// Roots to enumerate, in order
    roots: Vec<PathBuf>,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker over `roots`.
    #[must_use]
    pub fn new(roots: Vec<PathBuf>, config: WalkerConfig) -> Self {
        Self {
            roots,
            config,
            shutdown_flag: None,
        }
    }

    /// Stop yielding candidates once `flag` is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Build the ignore matcher for one root from the configured patterns.
    fn build_gitignore(&self, root: &Path) -> Option<Gitignore> {
        if self.config.ignore_patterns.is_empty() {
            return None;
        }

        let mut builder = GitignoreBuilder::new(root);
        for pattern in &self.config.ignore_patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                log::warn!("Invalid ignore pattern '{}': {}", pattern, e);
            }
        }

        match builder.build() {
            Ok(gitignore) if !gitignore.is_empty() => Some(gitignore),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Failed to build ignore patterns: {}", e);
                None
            }
        }
    }

    /// Whether the entry is pruned by the hidden/ignore filters.
    ///
    /// Roots themselves are never pruned.
    fn is_excluded(&self, entry: &DirEntry, root: &Path, gitignore: Option<&Gitignore>) -> bool {
        if entry.depth() == 0 {
            return false;
        }

        if self.config.skip_hidden
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with('.'))
        {
            log::trace!("Skipping hidden entry: {}", entry.path().display());
            return true;
        }

        if let Some(gi) = gitignore {
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            if gi
                .matched(relative, entry.file_type().is_dir())
                .is_ignore()
            {
                log::trace!("Ignoring: {}", entry.path().display());
                return true;
            }
        }

        false
    }

    /// Enumerate one root.
    fn walk_root<'a>(
        &'a self,
        root: &'a Path,
    ) -> impl Iterator<Item = Result<PathBuf, ScanError>> + 'a {
        let gitignore = self.build_gitignore(root);
        let mut walk_dir = WalkDir::new(root).follow_links(false).sort_by_file_name();
        if !self.config.recurse {
            walk_dir = walk_dir.max_depth(1);
        }

        walk_dir
            .into_iter()
            .filter_entry(move |entry| !self.is_excluded(entry, root, gitignore.as_ref()))
            .filter_map(move |entry| match entry {
                Ok(entry) if entry.file_type().is_dir() => None,
                Ok(entry) => Some(Ok(entry.into_path())),
                Err(e) => Some(Err(Self::convert_error(root, e))),
            })
    }

    /// Walk every root, yielding candidate paths.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration.
    pub fn walk(&self) -> impl Iterator<Item = Result<PathBuf, ScanError>> + '_ {
        self.roots
            .iter()
            .flat_map(move |root| self.walk_root(root))
            .take_while(move |_| {
                if self.is_shutdown_requested() {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                    false
                } else {
                    true
                }
            })
    }

    fn convert_error(root: &Path, error: walkdir::Error) -> ScanError {
        let path = error
            .path()
            .map_or_else(|| root.to_path_buf(), Path::to_path_buf);
        if error.loop_ancestor().is_some() {
            log::warn!("Filesystem loop at {}", path.display());
        }
        match error.into_io_error() {
            Some(io_error) => {
                let err = ScanError::from_io(&path, io_error);
                log::warn!("Walker error: {}", err);
                err
            }
            None => ScanError::Io {
                path,
                source: std::io::Error::other("filesystem loop detected"),
            },
        }
    }
}
