use crate::common::{write_file, ENV_MUTEX};
use clap::Parser;
use dedupe::cli::Cli;
use dedupe::error::ExitCode;
use dedupe::run_app;
use std::fs;
use tempfile::tempdir;

fn run(args: &[&str]) -> anyhow::Result<ExitCode> {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let cli = Cli::try_parse_from(std::iter::once("dedupe").chain(args.iter().copied())).unwrap();
    run_app(cli)
}

#[test]
fn test_list_algorithms_needs_no_directory() {
    assert_eq!(run(&["--list-algorithms"]).unwrap(), ExitCode::Success);
}

#[test]
fn test_delete_fails_before_touching_anything() {
    let dir = tempdir().unwrap();
    let a = write_file(dir.path(), "a", b"keep me");
    let b = write_file(dir.path(), "b", b"keep me");
    let dir_arg = dir.path().to_str().unwrap();

    let err = run(&["-q", "--action", "delete", dir_arg]).unwrap_err();

    assert_eq!(ExitCode::from_error(&err), ExitCode::Usage);
    assert!(err.to_string().contains("not supported"));
    assert!(a.exists() && b.exists());
}

#[test]
fn test_missing_config_file_is_usage_error() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("absent.toml");

    let err = run(&[
        "-q",
        "--config",
        config.to_str().unwrap(),
        dir.path().to_str().unwrap(),
    ])
    .unwrap_err();

    assert_eq!(ExitCode::from_error(&err), ExitCode::Usage);
}

#[test]
fn test_config_file_sets_action() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("dedupe.toml");
    fs::write(&config, "action = \"delete\"\n").unwrap();
    let data = dir.path().join("data");
    write_file(&data, "a", b"x");

    let err = run(&[
        "-q",
        "--config",
        config.to_str().unwrap(),
        data.to_str().unwrap(),
    ])
    .unwrap_err();
    assert_eq!(ExitCode::from_error(&err), ExitCode::Usage);

    // An explicit flag wins over the file.
    let code = run(&[
        "-q",
        "--action",
        "print",
        "-o",
        "json",
        "--config",
        config.to_str().unwrap(),
        data.to_str().unwrap(),
    ])
    .unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[cfg(unix)]
#[test]
fn test_hardlink_run_exit_codes() {
    use std::os::unix::fs::MetadataExt;

    let dir = tempdir().unwrap();
    let a = write_file(dir.path(), "a", b"linked by run_app");
    let b = write_file(dir.path(), "b", b"linked by run_app");
    let missing = dir.path().join("missing");

    let code = run(&[
        "-q",
        "-o",
        "json",
        "--action",
        "hardlink",
        dir.path().to_str().unwrap(),
    ])
    .unwrap();
    assert_eq!(code, ExitCode::Success);
    assert_eq!(
        fs::metadata(&a).unwrap().ino(),
        fs::metadata(&b).unwrap().ino()
    );

    let code = run(&[
        "-q",
        "-o",
        "csv",
        missing.to_str().unwrap(),
        dir.path().to_str().unwrap(),
    ])
    .unwrap();
    assert_eq!(code, ExitCode::PartialSuccess);
}
