//! Command-line interface definitions for dedupe.
//!
//! This module defines all CLI arguments using the clap derive API. Every
//! option that also exists in the configuration file is optional here, so
//! an absent flag leaves the configured value alone.
//!
//! # Example
//!
//! ```bash
//! # Report duplicates under two trees (default action)
//! dedupe ~/Photos /mnt/backup/Photos
//!
//! # Replace duplicates with hard links, ignoring small files
//! dedupe --action hardlink --min-size 1MiB ~/Downloads
//!
//! # Only the top level, hashed with BLAKE3, as JSON Lines
//! dedupe --no-recurse -a blake3 -o json ~/Downloads
//!
//! # Verbose mode for debugging
//! dedupe -vv ~/Downloads
//! ```

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::actions::Action;
use crate::scanner::{HashAlgorithm, UnknownAlgorithm};

/// Find identical files and collapse them into links.
///
/// Files are grouped by device and size; content is hashed only when two
/// files of the same size meet. The first file seen with some content is
/// kept as the original and later copies are reported or replaced.
#[derive(Debug, Parser)]
#[command(name = "dedupe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directories (or files) to scan, in order
    #[arg(value_name = "DIR", required_unless_present = "list_algorithms")]
    pub dirs: Vec<PathBuf>,

    /// Descend into subdirectories (default)
    #[arg(short, long, overrides_with = "no_recurse")]
    pub recurse: bool,

    /// Only look at the immediate contents of each directory
    #[arg(long, overrides_with = "recurse")]
    pub no_recurse: bool,

    /// Ignore files smaller than this (e.g., 1KB, 1MiB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// What to do with each duplicate
    #[arg(long, value_enum, value_name = "ACTION")]
    pub action: Option<Action>,

    /// Content hash algorithm (see --list-algorithms)
    #[arg(short, long, value_name = "NAME", value_parser = parse_algorithm)]
    pub algorithm: Option<HashAlgorithm>,

    /// Read size used while hashing
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub chunk_size: Option<u64>,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Glob patterns to ignore (can be specified multiple times)
    ///
    /// Added to any patterns from the configuration file.
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Configuration file to use instead of the default location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    ///
    /// Any non-empty `NO_COLOR` other than `0`, `false`, `no` or `off`
    /// turns color off.
    #[arg(
        long,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_color: bool,

    /// Print fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,

    /// List available hash algorithms and exit
    #[arg(long)]
    pub list_algorithms: bool,
}

impl Cli {
    /// Recursion setting given on the command line, if any.
    #[must_use]
    pub fn recurse_override(&self) -> Option<bool> {
        if self.no_recurse {
            Some(false)
        } else if self.recurse {
            Some(true)
        } else {
            None
        }
    }
}

/// Output format for the event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// JSON Lines for scripting
    Json,
    /// CSV for spreadsheets
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Parse a hash algorithm name, case-insensitively.
///
/// # Errors
///
/// Returns the list of valid names if `s` is not one of them.
pub fn parse_algorithm(s: &str) -> Result<HashAlgorithm, String> {
    s.parse().map_err(|e: UnknownAlgorithm| e.to_string())
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use dedupe::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("1KiB").unwrap(), 1024);
/// assert_eq!(parse_size("1MiB").unwrap(), 1_048_576);
/// ```
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }
    if s.starts_with('-') {
        return Err("Size cannot be negative".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
