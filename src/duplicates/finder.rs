//! Run orchestration: walker, detector, action and sink in one pass.
//!
//! # Overview
//!
//! [`DuplicateFinder::run`] pulls candidate paths from the
//! [`Walker`](crate::scanner::Walker) one at a time, feeds each to the
//! [`Detector`], applies the selected [`Action`] to every duplicate pair
//! and hands the resulting [`DedupeEvent`] to an [`EventSink`] before the
//! next candidate is pulled. Nothing is collected up front, so stopping
//! early (Ctrl+C, or a sink error) leaves every already-emitted event
//! fully applied.
//!
//! # Example
//!
//! ```no_run
//! use dedupe::actions::Action;
//! use dedupe::duplicates::{DuplicateFinder, FinderConfig};
//! use dedupe::output::TextOutput;
//! use std::path::PathBuf;
//!
//! let config = FinderConfig::default()
//!     .with_action(Action::Hardlink)
//!     .with_min_size(4096);
//! let finder = DuplicateFinder::new(config);
//!
//! let mut sink = TextOutput::new(std::io::stdout().lock());
//! let summary = finder.run(&[PathBuf::from("/srv/media")], &mut sink).unwrap();
//!
//! println!("Reclaimable space: {}", summary.reclaimable_display());
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use bytesize::ByteSize;
use serde::Serialize;

use super::detector::{Detector, DetectorConfig, DetectorStats, Observation};
use crate::actions::{Action, ActionError, DedupeEvent, Deduper, Outcome};
use crate::error::ExitCode;
use crate::output::{EventSink, OutputError};
use crate::progress::ProgressCallback;
use crate::scanner::hasher::DEFAULT_CHUNK_SIZE;
use crate::scanner::{
    HashAlgorithm, HashError, Hasher, LocalInspector, ScanError, Walker, WalkerConfig,
};

/// Configuration for a dedupe run.
#[derive(Clone)]
pub struct FinderConfig {
    /// Walker configuration for directory traversal.
    pub walker_config: WalkerConfig,
    /// Content hash algorithm.
    pub algorithm: HashAlgorithm,
    /// Read size while hashing.
    pub chunk_size: usize,
    /// Files smaller than this are ignored.
    pub min_size: u64,
    /// What to do with each duplicate.
    pub action: Action,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("walker_config", &self.walker_config)
            .field("algorithm", &self.algorithm)
            .field("chunk_size", &self.chunk_size)
            .field("min_size", &self.min_size)
            .field("action", &self.action)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            walker_config: WalkerConfig::default(),
            algorithm: HashAlgorithm::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            min_size: 0,
            action: Action::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the hash algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the hashing read size.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the minimum file size.
    #[must_use]
    pub fn with_min_size(mut self, min_size: u64) -> Self {
        self.min_size = min_size;
        self
    }

    /// Set the action applied to duplicates.
    #[must_use]
    pub fn with_action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Totals for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Candidate paths examined
    pub candidates: u64,
    /// Successful content hash computations
    pub files_hashed: u64,
    /// Bytes read while hashing
    pub bytes_hashed: u64,
    /// Duplicate events emitted
    pub duplicates: u64,
    /// Duplicates replaced by a link in this run
    pub linked: u64,
    /// Duplicates that already were links to their original
    pub already_linked: u64,
    /// Failure events emitted
    pub failures: u64,
    /// Bytes freed (or freeable) by the reported and linked duplicates
    pub reclaimable_bytes: u64,
    /// Wall-clock duration
    pub duration_ms: u64,
    /// Whether the run stopped before the walk was exhausted
    pub interrupted: bool,
}

impl RunSummary {
    /// Count one event.
    pub fn record(&mut self, event: &DedupeEvent) {
        match event {
            DedupeEvent::Duplicate { size, outcome, .. } => {
                self.duplicates += 1;
                match outcome {
                    Outcome::Reported => self.reclaimable_bytes += size,
                    Outcome::Linked => {
                        self.linked += 1;
                        self.reclaimable_bytes += size;
                    }
                    Outcome::AlreadyLinked => self.already_linked += 1,
                }
            }
            DedupeEvent::Failure { .. } => self.failures += 1,
        }
    }

    /// Copy the detector's counters.
    pub fn absorb(&mut self, stats: &DetectorStats) {
        self.candidates = stats.candidates;
        self.files_hashed = stats.files_hashed;
        self.bytes_hashed = stats.bytes_hashed;
    }

    /// Exit code for a run that ended with this summary.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        if self.interrupted {
            ExitCode::Interrupted
        } else if self.failures > 0 {
            ExitCode::PartialSuccess
        } else {
            ExitCode::Success
        }
    }

    /// Format reclaimable space as human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize::b(self.reclaimable_bytes).to_string()
    }
}

/// Errors that end a run.
///
/// Per-file problems never show up here; they become
/// [`DedupeEvent::Failure`] events instead.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// No directories were given.
    #[error("No directories to scan")]
    NoRoots,

    /// The configured action cannot be applied.
    #[error(transparent)]
    Action(#[from] ActionError),

    /// The event sink failed.
    #[error("Failed to write output: {0}")]
    Output(#[from] OutputError),
}

/// Drives one dedupe pass over a set of roots.
#[derive(Debug, Clone)]
pub struct DuplicateFinder {
    config: FinderConfig,
}

impl DuplicateFinder {
    /// Create a new finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }

    /// Create a finder that reports duplicates with default settings.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    fn inspector(&self) -> LocalInspector {
        let mut hasher = Hasher::new(self.config.algorithm).with_chunk_size(self.config.chunk_size);
        if let Some(ref flag) = self.config.shutdown_flag {
            hasher = hasher.with_shutdown_flag(Arc::clone(flag));
        }
        LocalInspector::new(hasher)
    }

    /// Scan `roots` in order, writing one event per duplicate or failure.
    ///
    /// One bucket map covers all roots, so a file under the second root can
    /// be a duplicate of one under the first.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::NoRoots`] for an empty `roots`,
    /// [`FinderError::Action`] for an unsupported action (before anything
    /// is touched), and [`FinderError::Output`] if the sink fails.
    pub fn run<S: EventSink + ?Sized>(
        &self,
        roots: &[PathBuf],
        sink: &mut S,
    ) -> Result<RunSummary, FinderError> {
        if roots.is_empty() {
            return Err(FinderError::NoRoots);
        }
        let deduper = Deduper::new(self.config.action)?;
        let start_time = Instant::now();
        let callback = self.config.progress_callback.as_deref();

        log::info!(
            "Scanning {} root(s) with {} (action: {})",
            roots.len(),
            self.config.algorithm,
            self.config.action
        );

        let mut walker = Walker::new(roots.to_vec(), self.config.walker_config.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }

        let mut detector = Detector::new(
            self.inspector(),
            DetectorConfig::default().with_min_size(self.config.min_size),
        );
        if let Some(ref callback) = self.config.progress_callback {
            detector = detector.with_progress_callback(Arc::clone(callback));
        }

        let mut summary = RunSummary::default();
        let mut seen = 0u64;

        for candidate in walker.walk() {
            let event = match candidate {
                Ok(path) => {
                    seen += 1;
                    if let Some(callback) = callback {
                        callback.on_candidate(seen, &path);
                    }
                    match detector.observe(&path) {
                        Ok(Observation::Duplicate(pair)) => deduper.apply(&pair),
                        Ok(Observation::Unique | Observation::Skipped(_)) => continue,
                        Err(ScanError::HashError(HashError::Interrupted(path))) => {
                            log::debug!("Stopped while hashing {}", path.display());
                            summary.interrupted = true;
                            break;
                        }
                        Err(e) => DedupeEvent::from_scan_error(&e),
                    }
                }
                Err(e) => DedupeEvent::from_scan_error(&e),
            };

            summary.record(&event);
            if let Some(callback) = callback {
                callback.on_event(&event);
            }
            sink.write_event(&event)?;
        }

        if self.config.is_shutdown_requested() {
            summary.interrupted = true;
        }
        summary.absorb(detector.stats());
        summary.duration_ms = u64::try_from(start_time.elapsed().as_millis()).unwrap_or(u64::MAX);

        log::info!(
            "Done: {} duplicate(s), {} failure(s), {} candidates in {} ms{}",
            summary.duplicates,
            summary.failures,
            summary.candidates,
            summary.duration_ms,
            if summary.interrupted {
                " (interrupted)"
            } else {
                ""
            }
        );

        if let Some(callback) = callback {
            callback.on_finish(&summary);
        }
        sink.finish(&summary)?;
        Ok(summary)
    }

    /// Run and collect every event in memory.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run).
    pub fn find_duplicates(
        &self,
        roots: &[PathBuf],
    ) -> Result<(Vec<DedupeEvent>, RunSummary), FinderError> {
        let mut events = Vec::new();
        let summary = self.run(roots, &mut events)?;
        Ok((events, summary))
    }
}
