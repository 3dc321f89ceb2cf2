//! Human-readable output.
//!
//! One line per event, followed by a short summary:
//!
//! ```text
//! [hardlink] photos/a.jpg -> backup/a.jpg
//! error [hash] backup/locked.jpg: Permission denied: backup/locked.jpg
//! 1 duplicate, 2.3 MiB reclaimable (14 candidates, 3 hashed)
//! ```

use std::io::Write;

use indicatif::ProgressBar;
use yansi::Paint;

use super::{EventSink, OutputError};
use crate::actions::{Action, DedupeEvent, Outcome};
use crate::duplicates::RunSummary;

/// Plain text event writer.
pub struct TextOutput<W: Write> {
    writer: W,
    progress: Option<ProgressBar>,
}

impl<W: Write> TextOutput<W> {
    /// Create a text writer.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            progress: None,
        }
    }

    /// Pause `bar` while each event line is written, so spinner redraws
    /// never interleave with the output on a shared terminal.
    #[must_use]
    pub fn with_progress_bar(mut self, bar: ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    /// Give back the underlying writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn label(action: Action, outcome: Outcome) -> String {
    match outcome {
        Outcome::AlreadyLinked => format!("[{}, already linked]", action),
        Outcome::Reported | Outcome::Linked => format!("[{}]", action),
    }
}

impl<W: Write> TextOutput<W> {
    fn write_line(&mut self, event: &DedupeEvent) -> Result<(), OutputError> {
        match event {
            DedupeEvent::Duplicate {
                original,
                duplicate,
                action,
                outcome,
                ..
            } => {
                let label = label(*action, *outcome);
                let label = match outcome {
                    Outcome::Linked => label.green().bold(),
                    Outcome::Reported => label.cyan(),
                    Outcome::AlreadyLinked => label.dim(),
                };
                writeln!(
                    self.writer,
                    "{} {} -> {}",
                    label,
                    original.display(),
                    duplicate.display()
                )?;
            }
            DedupeEvent::Failure {
                path,
                phase,
                reason,
            } => {
                writeln!(
                    self.writer,
                    "{} [{}] {}: {}",
                    "error".red().bold(),
                    phase,
                    path.display(),
                    reason
                )?;
            }
        }
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> EventSink for TextOutput<W> {
    fn write_event(&mut self, event: &DedupeEvent) -> Result<(), OutputError> {
        match self.progress.clone() {
            Some(bar) => bar.suspend(|| self.write_line(event)),
            None => self.write_line(event),
        }
    }

    fn finish(&mut self, summary: &RunSummary) -> Result<(), OutputError> {
        let noun = if summary.duplicates == 1 {
            "duplicate"
        } else {
            "duplicates"
        };
        write!(
            self.writer,
            "{} {}, {} reclaimable ({} candidates, {} hashed",
            summary.duplicates.bold(),
            noun,
            summary.reclaimable_display(),
            summary.candidates,
            summary.files_hashed
        )?;
        if summary.linked > 0 {
            write!(self.writer, ", {} linked", summary.linked)?;
        }
        if summary.failures > 0 {
            write!(self.writer, ", {} failed", summary.failures.red())?;
        }
        writeln!(self.writer, ")")?;
        if summary.interrupted {
            writeln!(self.writer, "{}", "Interrupted; results are partial".yellow())?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
