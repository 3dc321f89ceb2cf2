//! dedupe - find identical files and collapse them into links.
//!
//! Files are bucketed by device and size while the tree is walked. Content
//! is hashed only when a second file lands in the same bucket, and each
//! confirmed duplicate is reported or atomically replaced by a hard or
//! symbolic link to the first file seen with that content.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Context;

use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use crate::error::ExitCode;
use crate::output::{CsvOutput, EventSink, JsonLinesOutput, TextOutput};
use crate::progress::Progress;
use crate::scanner::HashAlgorithm;

/// Run the command line application.
///
/// # Errors
///
/// Returns an error for anything that stops the run as a whole: bad
/// configuration, an unsupported action, no directories, or a failure
/// writing output. Per-file problems are events, not errors; they only
/// change the returned exit code.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    if cli.list_algorithms {
        list_algorithms(&mut io::stdout().lock())?;
        return Ok(ExitCode::Success);
    }

    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config.apply_cli(&cli);
    config.action.ensure_supported()?;
    if cli.dirs.is_empty() {
        return Err(FinderError::NoRoots.into());
    }
    log::debug!("Effective configuration: {:?}", config);

    let handler = signal::install_handler()?;
    let show_progress = !cli.quiet && config.output == OutputFormat::Text;
    let progress = Arc::new(Progress::new(!show_progress));

    let finder = DuplicateFinder::new(
        FinderConfig::default()
            .with_walker_config(config.walker_config())
            .with_algorithm(config.algorithm)
            .with_chunk_size(config.chunk_size)
            .with_min_size(config.min_size)
            .with_action(config.action)
            .with_shutdown_flag(handler.get_flag())
            .with_progress_callback(progress.clone()),
    );

    let stdout = io::stdout();
    let mut sink: Box<dyn EventSink> = match config.output {
        OutputFormat::Text => {
            Box::new(TextOutput::new(stdout.lock()).with_progress_bar(progress.bar().clone()))
        }
        OutputFormat::Json => Box::new(JsonLinesOutput::new(stdout.lock())),
        OutputFormat::Csv => Box::new(CsvOutput::new(stdout.lock())),
    };

    let summary = finder.run(&cli.dirs, sink.as_mut())?;
    Ok(summary.exit_code())
}

/// Print the algorithm names, marking the default.
fn list_algorithms<W: Write>(writer: &mut W) -> io::Result<()> {
    let default = HashAlgorithm::default();
    for algorithm in HashAlgorithm::ALL {
        if algorithm == default {
            writeln!(writer, "{algorithm} (default)")?;
        } else {
            writeln!(writer, "{algorithm}")?;
        }
    }
    Ok(())
}
