//! JSON Lines output for scripting and automation.
//!
//! Each event is one JSON object on its own line, tagged with `"event"`.
//! The last line is the run summary:
//!
//! ```json
//! {"event":"duplicate","original":"a","duplicate":"b","hash":"2cf2...","size":5,"action":"hardlink","outcome":"linked"}
//! {"event":"failure","path":"c","phase":"hash","reason":"Permission denied: c"}
//! {"event":"summary","candidates":3,"files_hashed":2,...,"exit_code":3,"exit_code_name":"DD003"}
//! ```

use std::io::Write;

use serde::Serialize;

use super::{EventSink, OutputError};
use crate::actions::DedupeEvent;
use crate::duplicates::RunSummary;

/// Final line of the stream.
#[derive(Debug, Serialize)]
struct SummaryLine<'a> {
    event: &'static str,
    #[serde(flatten)]
    summary: &'a RunSummary,
    /// The exit code number
    exit_code: i32,
    /// The machine-readable exit code name (e.g., "DD000")
    exit_code_name: &'static str,
}

/// JSON Lines event writer.
pub struct JsonLinesOutput<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesOutput<W> {
    /// Create a JSON Lines writer.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Give back the underlying writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EventSink for JsonLinesOutput<W> {
    fn write_event(&mut self, event: &DedupeEvent) -> Result<(), OutputError> {
        serde_json::to_writer(&mut self.writer, event)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&mut self, summary: &RunSummary) -> Result<(), OutputError> {
        let exit_code = summary.exit_code();
        let line = SummaryLine {
            event: "summary",
            summary,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix(),
        };
        serde_json::to_writer(&mut self.writer, &line)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}
