//! Structured error handling and exit codes.

use serde::Serialize;

use crate::actions::ActionError;
use crate::config::ConfigError;
use crate::duplicates::FinderError;

/// Process exit codes.
///
/// - 0: Success (completed normally, with or without duplicates)
/// - 1: General error (unexpected failure)
/// - 2: Usage error (bad configuration or unsupported action)
/// - 3: Partial success (completed, but some files or pairs failed)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Run completed and every pair was handled.
    Success = 0,
    /// An unexpected error occurred.
    GeneralError = 1,
    /// Invalid arguments or configuration; nothing was scanned.
    Usage = 2,
    /// Run completed but at least one per-file or per-pair failure was reported.
    PartialSuccess = 3,
    /// Interrupted by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DD000",
            Self::GeneralError => "DD001",
            Self::Usage => "DD002",
            Self::PartialSuccess => "DD003",
            Self::Interrupted => "DD130",
        }
    }

    /// Exit code for an error that ended the run.
    ///
    /// Configuration and argument problems are usage errors; anything
    /// else is a general error.
    #[must_use]
    pub fn from_error(err: &anyhow::Error) -> Self {
        let usage = err.chain().any(|cause| {
            cause.is::<ConfigError>()
                || cause.is::<ActionError>()
                || matches!(
                    cause.downcast_ref::<FinderError>(),
                    Some(FinderError::NoRoots | FinderError::Action(_))
                )
        });
        if usage {
            Self::Usage
        } else {
            Self::GeneralError
        }
    }
}

/// Structured error information for `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DD001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
