//! Duplicate resolution actions.
//!
//! This module provides functionality for:
//! - Selecting what happens to a confirmed duplicate ([`Action`])
//! - Applying that action to one pair and describing the result as a
//!   [`DedupeEvent`]
//! - Crash-safe link replacement (see [`link`])
//!
//! Report mode is the default and never touches the filesystem.
//!
//! ```no_run
//! use dedupe::actions::{Action, Deduper};
//! use dedupe::duplicates::{Detector, DetectorConfig};
//! use dedupe::scanner::LocalInspector;
//! use std::path::PathBuf;
//!
//! let deduper = Deduper::new(Action::Hardlink)?;
//! let detector = Detector::new(LocalInspector::default(), DetectorConfig::default());
//! for pair in detector.stream(vec![PathBuf::from("a"), PathBuf::from("b")]) {
//!     if let Ok(pair) = pair {
//!         println!("{:?}", deduper.apply(&pair));
//!     }
//! }
//! # Ok::<(), dedupe::actions::ActionError>(())
//! ```

pub mod link;

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::duplicates::DuplicatePair;
use crate::scanner::{ContentHash, ScanError};

pub use link::{replace_with_link, LinkError, LinkKind, LinkOutcome};

/// What to do with each confirmed duplicate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Only report duplicates
    #[default]
    #[value(name = "print", alias = "report")]
    #[serde(rename = "print", alias = "report")]
    Report,
    /// Replace duplicates with hard links to the original
    Hardlink,
    /// Replace duplicates with relative symbolic links to the original
    Symlink,
    /// Delete duplicates (not supported)
    Delete,
}

impl Action {
    /// Reject actions this build does not implement.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Unsupported`] for [`Action::Delete`].
    pub fn ensure_supported(self) -> Result<Self, ActionError> {
        match self {
            Self::Delete => Err(ActionError::Unsupported(self)),
            _ => Ok(self),
        }
    }

    /// Link kind used by this action, if it links at all.
    #[must_use]
    pub fn link_kind(self) -> Option<LinkKind> {
        match self {
            Self::Hardlink => Some(LinkKind::Hard),
            Self::Symlink => Some(LinkKind::Symbolic),
            Self::Report | Self::Delete => None,
        }
    }

    /// Whether the action modifies the filesystem.
    #[must_use]
    pub fn is_destructive(self) -> bool {
        self.link_kind().is_some()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Report => "print",
            Self::Hardlink => "hardlink",
            Self::Symlink => "symlink",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Errors selecting an action.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// The action is recognized but not implemented.
    #[error("Action '{0}' is not supported")]
    Unsupported(Action),
}

/// Step at which a candidate or pair failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Traversal or metadata query
    Scan,
    /// Reading content
    Hash,
    /// Creating the temporary link
    Link,
    /// Renaming it over the duplicate
    Rename,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Scan => "scan",
            Self::Hash => "hash",
            Self::Link => "link",
            Self::Rename => "rename",
        };
        f.write_str(name)
    }
}

/// What happened to a confirmed duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Reported only
    Reported,
    /// Replaced by a link
    Linked,
    /// Already a link to the original
    AlreadyLinked,
}

/// One entry in the event stream, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DedupeEvent {
    /// A confirmed duplicate and what was done with it.
    Duplicate {
        /// First file seen with this content
        original: PathBuf,
        /// The duplicate
        duplicate: PathBuf,
        /// Shared content hash
        hash: ContentHash,
        /// Size of each file in bytes
        size: u64,
        /// Action applied
        action: Action,
        /// Result of the action
        outcome: Outcome,
    },
    /// A recoverable per-file or per-pair failure.
    Failure {
        /// Path the failure concerns
        path: PathBuf,
        /// Step that failed
        phase: Phase,
        /// Human-readable cause
        reason: String,
    },
}

impl DedupeEvent {
    /// Failure event for a candidate the detector could not process.
    #[must_use]
    pub fn from_scan_error(error: &ScanError) -> Self {
        let phase = if error.is_hash_error() {
            Phase::Hash
        } else {
            Phase::Scan
        };
        Self::Failure {
            path: error.path().to_path_buf(),
            phase,
            reason: error.to_string(),
        }
    }

    /// Whether this is a failure event.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }
}

/// Applies the selected action to duplicate pairs.
#[derive(Debug, Clone, Copy)]
pub struct Deduper {
    action: Action,
}

impl Deduper {
    /// Create a deduper for `action`.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Unsupported`] if the action is not implemented.
    pub fn new(action: Action) -> Result<Self, ActionError> {
        Ok(Self {
            action: action.ensure_supported()?,
        })
    }

    /// The action being applied.
    #[must_use]
    pub fn action(&self) -> Action {
        self.action
    }

    /// Apply the action to one pair.
    ///
    /// Link failures are returned as [`DedupeEvent::Failure`] against the
    /// duplicate's path; they never affect later pairs.
    #[must_use]
    pub fn apply(&self, pair: &DuplicatePair) -> DedupeEvent {
        let outcome = match self.action.link_kind() {
            None => Outcome::Reported,
            Some(kind) => {
                match replace_with_link(&pair.original.path, &pair.duplicate.path, &pair.hash, kind)
                {
                    Ok(LinkOutcome::Linked) => Outcome::Linked,
                    Ok(LinkOutcome::AlreadyLinked) => Outcome::AlreadyLinked,
                    Err(e) => {
                        log::warn!("{}: {}", pair.duplicate.path.display(), e);
                        return DedupeEvent::Failure {
                            path: pair.duplicate.path.clone(),
                            phase: e.phase(),
                            reason: e.to_string(),
                        };
                    }
                }
            }
        };

        DedupeEvent::Duplicate {
            original: pair.original.path.clone(),
            duplicate: pair.duplicate.path.clone(),
            hash: pair.hash.clone(),
            size: pair.duplicate.size,
            action: self.action,
            outcome,
        }
    }
}
