//! Progress reporting using indicatif.
//!
//! The candidate count is unknown up front (the walker is lazy), so
//! progress is a spinner on stderr rather than a bar:
//!
//! ```text
//! ⠂ [00:00:04] 18233 candidates | 41 duplicates, 1.2 GiB hashed | .../IMG_2291.jpg
//! ```

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bytesize::ByteSize;
use indicatif::{ProgressBar, ProgressStyle};

use crate::actions::DedupeEvent;
use crate::duplicates::RunSummary;

/// Progress callback for a dedupe run.
///
/// Implement this trait to receive progress updates while candidates are
/// processed. All methods are called from the thread driving the run.
pub trait ProgressCallback: Send + Sync {
    /// Called before each candidate is examined.
    ///
    /// # Arguments
    ///
    /// * `count` - Number of candidates seen so far, including this one
    /// * `path` - The candidate
    fn on_candidate(&self, count: u64, path: &Path);

    /// Called after a file's content was hashed.
    fn on_hash(&self, _path: &Path, _bytes: u64) {}

    /// Called for every event the run produces.
    fn on_event(&self, _event: &DedupeEvent) {}

    /// Called once when the run ends, interrupted or not.
    fn on_finish(&self, summary: &RunSummary);
}

/// Spinner on stderr implementing [`ProgressCallback`].
pub struct Progress {
    bar: ProgressBar,
    duplicates: AtomicU64,
    bytes_hashed: AtomicU64,
}

impl Progress {
    /// Create a progress spinner.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, nothing is drawn.
    ///
    /// # Examples
    ///
    /// ```
    /// use dedupe::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new_spinner();
            bar.set_style(spinner_style());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        };
        Self {
            bar,
            duplicates: AtomicU64::new(0),
            bytes_hashed: AtomicU64::new(0),
        }
    }

    /// The spinner, for writers that must pause it while printing.
    #[must_use]
    pub fn bar(&self) -> &ProgressBar {
        &self.bar
    }

    fn refresh_prefix(&self) {
        self.bar.set_prefix(format!(
            "{} duplicates, {} hashed",
            self.duplicates.load(Ordering::Relaxed),
            ByteSize::b(self.bytes_hashed.load(Ordering::Relaxed))
        ));
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {pos} candidates | {prefix} | {wide_msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_spinner())
    .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
}

impl ProgressCallback for Progress {
    fn on_candidate(&self, count: u64, path: &Path) {
        self.bar.set_position(count);
        self.bar.set_message(truncate_path(path, 40));
    }

    fn on_hash(&self, _path: &Path, bytes: u64) {
        self.bytes_hashed.fetch_add(bytes, Ordering::Relaxed);
        self.refresh_prefix();
    }

    fn on_event(&self, event: &DedupeEvent) {
        if let DedupeEvent::Duplicate { .. } = event {
            self.duplicates.fetch_add(1, Ordering::Relaxed);
            self.refresh_prefix();
        }
    }

    fn on_finish(&self, _summary: &RunSummary) {
        self.bar.finish_and_clear();
    }
}

/// Shorten a path for the spinner, keeping the file name.
fn truncate_path(path: &Path, max_len: usize) -> String {
    let full = path.display().to_string();
    if full.chars().count() <= max_len {
        return full;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name_len = file_name.chars().count();
    if name_len + 4 > max_len {
        let tail: String = file_name
            .chars()
            .skip(name_len.saturating_sub(max_len.saturating_sub(3)))
            .collect();
        return format!("...{}", tail);
    }

    format!(".../{}", file_name)
}
