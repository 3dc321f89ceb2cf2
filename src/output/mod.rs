//! Output formatters for the dedupe event stream.
//!
//! Events are written as they are produced, so output keeps pace with the
//! lazy detector instead of being collected up front:
//! - [`TextOutput`] for humans
//! - [`JsonLinesOutput`] for automation and scripting
//! - [`CsvOutput`] for spreadsheet import
//!
//! # Example
//!
//! ```no_run
//! use dedupe::duplicates::DuplicateFinder;
//! use dedupe::output::JsonLinesOutput;
//! use std::path::PathBuf;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let mut sink = JsonLinesOutput::new(std::io::stdout().lock());
//! let summary = finder.run(&[PathBuf::from(".")], &mut sink).unwrap();
//! eprintln!("{} duplicates", summary.duplicates);
//! ```

pub mod csv;
pub mod json;
pub mod text;

use std::io;

use thiserror::Error;

use crate::actions::DedupeEvent;
use crate::duplicates::RunSummary;

pub use csv::CsvOutput;
pub use json::JsonLinesOutput;
pub use text::TextOutput;

/// Errors writing output.
#[derive(Debug, Error)]
pub enum OutputError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during JSON serialization.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),
}

/// Consumer of dedupe events.
pub trait EventSink {
    /// Handle one event.
    ///
    /// # Errors
    ///
    /// Returns an [`OutputError`] if the event cannot be written.
    fn write_event(&mut self, event: &DedupeEvent) -> Result<(), OutputError>;

    /// Handle the end of the run.
    ///
    /// # Errors
    ///
    /// Returns an [`OutputError`] if the summary cannot be written.
    fn finish(&mut self, summary: &RunSummary) -> Result<(), OutputError>;
}

/// Collects events in memory.
impl EventSink for Vec<DedupeEvent> {
    fn write_event(&mut self, event: &DedupeEvent) -> Result<(), OutputError> {
        self.push(event.clone());
        Ok(())
    }

    fn finish(&mut self, _summary: &RunSummary) -> Result<(), OutputError> {
        Ok(())
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn write_event(&mut self, event: &DedupeEvent) -> Result<(), OutputError> {
        (**self).write_event(event)
    }

    fn finish(&mut self, summary: &RunSummary) -> Result<(), OutputError> {
        (**self).finish(summary)
    }
}
