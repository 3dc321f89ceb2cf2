use crate::common::ENV_MUTEX;
use clap::Parser;
use dedupe::actions::Action;
use dedupe::cli::{Cli, OutputFormat};
use dedupe::config::{Config, ConfigError};
use dedupe::scanner::HashAlgorithm;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use std::fs;
use tempfile::tempdir;

fn clear_env() {
    for key in ["DEDUPE_ALGORITHM", "DEDUPE_MIN_SIZE", "DEDUPE_ACTION", "DEDUPE_OUTPUT"] {
        std::env::remove_var(key);
    }
}

#[test]
fn test_config_load_defaults() {
    // No env provider, so other tests cannot interfere.
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .extract()
        .unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_config_load_from_toml() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
algorithm = "sha512"
min_size = 4096
action = "symlink"
recurse = false
chunk_size = 65536
skip_hidden = true
ignore_patterns = ["*.tmp", ".git/"]
output = "csv"
"#,
    )
    .unwrap();

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .extract()
        .unwrap();

    assert_eq!(config.algorithm, HashAlgorithm::Sha512);
    assert_eq!(config.min_size, 4096);
    assert_eq!(config.action, Action::Symlink);
    assert!(!config.recurse);
    assert_eq!(config.chunk_size, 65536);
    assert!(config.skip_hidden);
    assert_eq!(config.ignore_patterns, vec!["*.tmp", ".git/"]);
    assert_eq!(config.output, OutputFormat::Csv);
}

#[test]
fn test_env_overrides_file() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "min_size = 100\naction = \"hardlink\"\n").unwrap();

    std::env::set_var("DEDUPE_MIN_SIZE", "2048");
    std::env::set_var("DEDUPE_ALGORITHM", "blake3");

    let result = Config::load(Some(path.as_path()));
    clear_env();

    let config = result.unwrap();
    assert_eq!(config.min_size, 2048);
    assert_eq!(config.algorithm, HashAlgorithm::Blake3);
    assert_eq!(config.action, Action::Hardlink);
}

#[test]
fn test_cli_overrides_env() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "").unwrap();
    std::env::set_var("DEDUPE_OUTPUT", "json");

    let result = Config::load(Some(path.as_path()));
    clear_env();

    let mut config = result.unwrap();
    assert_eq!(config.output, OutputFormat::Json);

    let cli = Cli::try_parse_from(["dedupe", "-o", "text", "/p"]).unwrap();
    config.apply_cli(&cli);
    assert_eq!(config.output, OutputFormat::Text);
}

#[test]
fn test_invalid_env_value_is_an_error() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "").unwrap();
    std::env::set_var("DEDUPE_ACTION", "shred");

    let result = Config::load(Some(path.as_path()));
    clear_env();

    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_invalid_toml_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "min_size = [not toml").unwrap();

    let result: Result<Config, _> = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("DEDUPE_TEST_UNUSED_"))
        .extract();
    assert!(result.is_err());
}

#[test]
fn test_config_save_toml_roundtrip_names() {
    let config = Config {
        action: Action::Report,
        algorithm: HashAlgorithm::Md5,
        ..Config::default()
    };

    let content = toml::to_string_pretty(&config).unwrap();
    assert!(content.contains("action = \"print\""));
    assert!(content.contains("algorithm = \"md5\""));
    assert!(content.contains("output = \"text\""));
}
