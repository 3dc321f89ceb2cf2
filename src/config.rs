//! Layered configuration.
//!
//! Settings are merged from several sources, later ones winning:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. A TOML file: `--config PATH`, or `config.toml` in the platform
//!    config directory (`~/.config/dedupe/config.toml` on Linux)
//! 3. `DEDUPE_*` environment variables (`DEDUPE_MIN_SIZE=4096`)
//! 4. Flags given on the command line ([`Config::apply_cli`])
//!
//! ```toml
//! algorithm = "blake3"
//! min_size = 1024
//! action = "hardlink"
//! ignore_patterns = ["*.tmp", "node_modules/"]
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::actions::Action;
use crate::cli::{Cli, OutputFormat};
use crate::scanner::hasher::DEFAULT_CHUNK_SIZE;
use crate::scanner::{HashAlgorithm, WalkerConfig};

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "DEDUPE_";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A file passed with `--config` does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// A source could not be parsed or holds a bad value.
    #[error("Invalid configuration: {0}")]
    Invalid(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Invalid(Box::new(err))
    }
}

/// Effective settings for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Content hash algorithm.
    pub algorithm: HashAlgorithm,
    /// Files smaller than this many bytes are ignored.
    pub min_size: u64,
    /// What to do with each duplicate.
    pub action: Action,
    /// Descend into subdirectories.
    pub recurse: bool,
    /// Read size while hashing.
    pub chunk_size: usize,
    /// Skip entries whose name starts with a dot.
    pub skip_hidden: bool,
    /// Gitignore-style patterns to leave out.
    pub ignore_patterns: Vec<String>,
    /// Event stream format.
    pub output: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            min_size: 0,
            action: Action::default(),
            recurse: true,
            chunk_size: DEFAULT_CHUNK_SIZE,
            skip_hidden: false,
            ignore_patterns: Vec::new(),
            output: OutputFormat::default(),
        }
    }
}

impl Config {
    /// Location of the per-user config file, if the platform has one.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dedupe").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Build the figment for a given file, without extracting it.
    ///
    /// A missing file contributes nothing.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = file {
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load defaults, the config file and the environment.
    ///
    /// `explicit` is the `--config` path. It must exist; the default
    /// location is optional.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] for a missing explicit file and
    /// [`ConfigError::Invalid`] when any source fails to parse.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match explicit {
            Some(path) if !path.is_file() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path(),
        };

        if let Some(ref path) = file {
            log::debug!("Reading configuration from {}", path.display());
        }
        let config = Self::figment(file.as_deref()).extract()?;
        Ok(config)
    }

    /// Overlay flags that were given on the command line.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(algorithm) = cli.algorithm {
            self.algorithm = algorithm;
        }
        if let Some(min_size) = cli.min_size {
            self.min_size = min_size;
        }
        if let Some(action) = cli.action {
            self.action = action;
        }
        if let Some(recurse) = cli.recurse_override() {
            self.recurse = recurse;
        }
        if let Some(chunk_size) = cli.chunk_size {
            self.chunk_size = usize::try_from(chunk_size).unwrap_or(usize::MAX);
        }
        if cli.skip_hidden {
            self.skip_hidden = true;
        }
        self.ignore_patterns.extend(cli.ignore_patterns.iter().cloned());
        if let Some(output) = cli.output {
            self.output = output;
        }
    }

    /// Walker settings derived from this config.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig::default()
            .with_recurse(self.recurse)
            .with_skip_hidden(self.skip_hidden)
            .with_ignore_patterns(self.ignore_patterns.clone())
    }
}
