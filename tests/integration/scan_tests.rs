use crate::common::write_file;
use dedupe::actions::{DedupeEvent, Phase};
use dedupe::duplicates::{DuplicateFinder, FinderConfig};
use dedupe::error::ExitCode;
use dedupe::scanner::{HashAlgorithm, WalkerConfig};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn duplicates(events: &[DedupeEvent]) -> Vec<(PathBuf, PathBuf)> {
    events
        .iter()
        .filter_map(|e| match e {
            DedupeEvent::Duplicate {
                original,
                duplicate,
                ..
            } => Some((original.clone(), duplicate.clone())),
            DedupeEvent::Failure { .. } => None,
        })
        .collect()
}

fn scan(config: FinderConfig, roots: &[PathBuf]) -> Vec<(PathBuf, PathBuf)> {
    let (events, _) = DuplicateFinder::new(config).find_duplicates(roots).unwrap();
    duplicates(&events)
}

#[test]
fn test_min_size_no_hashing() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a", b"hello");
    write_file(dir.path(), "b", b"hello");

    let (events, summary) = DuplicateFinder::new(FinderConfig::default().with_min_size(10))
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert!(events.is_empty());
    assert_eq!(summary.candidates, 2);
    assert_eq!(summary.files_hashed, 0);
}

#[test]
fn test_no_recurse_only_top_level() {
    let dir = tempdir().unwrap();
    let a = write_file(dir.path(), "a.txt", b"dup");
    let b = write_file(dir.path(), "b.txt", b"dup");
    write_file(dir.path(), "sub/c.txt", b"dup");

    let config = FinderConfig::default()
        .with_walker_config(WalkerConfig::default().with_recurse(false));
    assert_eq!(
        scan(config, &[dir.path().to_path_buf()]),
        vec![(a.clone(), b.clone())]
    );

    let all = scan(FinderConfig::default(), &[dir.path().to_path_buf()]);
    assert_eq!(all.len(), 2);
}

#[test]
fn test_ignore_and_hidden() {
    let dir = tempdir().unwrap();
    let a = write_file(dir.path(), "a.txt", b"same");
    write_file(dir.path(), ".hidden", b"same");
    write_file(dir.path(), "build/out.txt", b"same");
    write_file(dir.path(), "z.tmp", b"same");

    let config = FinderConfig::default().with_walker_config(
        WalkerConfig::default()
            .with_skip_hidden(true)
            .with_ignore_patterns(vec!["build/".to_string(), "*.tmp".to_string()]),
    );
    assert!(scan(config, &[dir.path().to_path_buf()]).is_empty());

    let everything = scan(FinderConfig::default(), &[dir.path().to_path_buf()]);
    assert_eq!(everything.len(), 3);
    // ".hidden" sorts before "a.txt", so it is the original.
    assert!(everything.iter().all(|(orig, _)| orig != &a));
}

#[test]
fn test_empty_files_are_duplicates_of_each_other() {
    let dir = tempdir().unwrap();
    let a = write_file(dir.path(), "a", b"");
    let b = write_file(dir.path(), "b", b"");

    assert_eq!(
        scan(FinderConfig::default(), &[dir.path().to_path_buf()]),
        vec![(a, b)]
    );
}

#[cfg(unix)]
#[test]
fn test_same_root_twice_reports_nothing() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a", b"only one");

    let root = dir.path().to_path_buf();
    let (events, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(&[root.clone(), root])
        .unwrap();

    assert!(events.is_empty());
    assert_eq!(summary.candidates, 2);
    assert_eq!(summary.files_hashed, 0);
}

#[test]
fn test_algorithm_changes_hash_not_pairs() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a", b"algo");
    write_file(dir.path(), "b", b"algo");

    for algorithm in HashAlgorithm::ALL {
        let (events, _) = DuplicateFinder::new(FinderConfig::default().with_algorithm(algorithm))
            .find_duplicates(&[dir.path().to_path_buf()])
            .unwrap();
        assert_eq!(events.len(), 1, "{algorithm}");
    }
}

#[test]
fn test_missing_root_continues_with_others() {
    let dir = tempdir().unwrap();
    let a = write_file(dir.path(), "a", b"x1");
    let b = write_file(dir.path(), "b", b"x1");
    let missing = dir.path().join("missing");

    let (events, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(&[missing.clone(), dir.path().to_path_buf()])
        .unwrap();

    assert!(matches!(
        &events[0],
        DedupeEvent::Failure { path, phase: Phase::Scan, .. } if path == &missing
    ));
    assert_eq!(duplicates(&events), vec![(a, b)]);
    assert_eq!(summary.exit_code(), ExitCode::PartialSuccess);
}

#[cfg(unix)]
#[test]
fn test_symlinks_are_not_candidates() {
    let dir = tempdir().unwrap();
    let a = write_file(dir.path(), "a", b"target");
    std::os::unix::fs::symlink(&a, dir.path().join("link")).unwrap();

    let (events, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert!(events.is_empty());
    assert_eq!(summary.candidates, 2);
    assert_eq!(summary.files_hashed, 0);
}

#[cfg(unix)]
#[test]
fn test_existing_hardlinks_are_skipped() {
    let dir = tempdir().unwrap();
    let a = write_file(dir.path(), "a", b"linked already");
    fs::hard_link(&a, dir.path().join("b")).unwrap();

    let (events, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert!(events.is_empty());
    assert_eq!(summary.files_hashed, 0);
}
