//! CSV output for spreadsheets and data analysis.
//!
//! One row per event. Columns that do not apply to an event are empty.
//!
//! # Columns
//!
//! - `event`: `duplicate` or `failure`
//! - `original`, `duplicate`, `hash`, `size`, `outcome`: duplicate rows
//! - `phase`, `reason`: failure rows (`path` goes in `duplicate`)
//!
//! The summary is not part of the CSV stream.

use std::io::Write;

use serde::Serialize;

use super::{EventSink, OutputError};
use crate::actions::{DedupeEvent, Outcome, Phase};
use crate::duplicates::RunSummary;

/// A single row in the CSV output.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    event: &'static str,
    original: Option<String>,
    duplicate: String,
    hash: Option<&'a str>,
    size: Option<u64>,
    outcome: Option<Outcome>,
    phase: Option<Phase>,
    reason: Option<&'a str>,
}

impl<'a> CsvRow<'a> {
    fn from_event(event: &'a DedupeEvent) -> Self {
        match event {
            DedupeEvent::Duplicate {
                original,
                duplicate,
                hash,
                size,
                outcome,
                ..
            } => Self {
                event: "duplicate",
                original: Some(original.display().to_string()),
                duplicate: duplicate.display().to_string(),
                hash: Some(hash.as_str()),
                size: Some(*size),
                outcome: Some(*outcome),
                phase: None,
                reason: None,
            },
            DedupeEvent::Failure {
                path,
                phase,
                reason,
            } => Self {
                event: "failure",
                original: None,
                duplicate: path.display().to_string(),
                hash: None,
                size: None,
                outcome: None,
                phase: Some(*phase),
                reason: Some(reason),
            },
        }
    }
}

/// CSV event writer.
pub struct CsvOutput<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvOutput<W> {
    /// Create a CSV writer; the header is written with the first row.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
        }
    }

    /// Flush and give back the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns an error if buffered rows cannot be flushed.
    pub fn into_inner(self) -> Result<W, OutputError> {
        self.writer
            .into_inner()
            .map_err(|e| OutputError::Io(e.into_error()))
    }
}

impl<W: Write> EventSink for CsvOutput<W> {
    fn write_event(&mut self, event: &DedupeEvent) -> Result<(), OutputError> {
        self.writer.serialize(CsvRow::from_event(event))?;
        Ok(())
    }

    fn finish(&mut self, _summary: &RunSummary) -> Result<(), OutputError> {
        self.writer.flush()?;
        Ok(())
    }
}
