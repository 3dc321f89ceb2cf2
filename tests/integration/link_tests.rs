use crate::common::write_file;
use dedupe::actions::link::{replace_with_link, temp_link_name, LinkKind, LinkOutcome, TempLink};
use dedupe::actions::{Action, DedupeEvent, Outcome};
use dedupe::duplicates::{DuplicateFinder, FinderConfig};
use dedupe::scanner::{ContentHash, HashAlgorithm, Hasher};
use std::fs;
use tempfile::tempdir;

fn linker(action: Action) -> DuplicateFinder {
    DuplicateFinder::new(FinderConfig::default().with_action(action))
}

#[cfg(unix)]
fn inode(path: &std::path::Path) -> u64 {
    use std::os::unix::fs::MetadataExt;
    fs::metadata(path).unwrap().ino()
}

#[cfg(unix)]
#[test]
fn test_hardlink_scenario_hello_world() {
    let dir = tempdir().unwrap();
    let a = write_file(dir.path(), "A", b"hello");
    let b = write_file(dir.path(), "B", b"hello");
    let c = write_file(dir.path(), "C", b"world");

    let (events, summary) = linker(Action::Hardlink)
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    let expected_hash = Hasher::new(HashAlgorithm::Sha256).hash_file(&a).unwrap();
    assert_eq!(
        events,
        vec![DedupeEvent::Duplicate {
            original: a.clone(),
            duplicate: b.clone(),
            hash: expected_hash,
            size: 5,
            action: Action::Hardlink,
            outcome: Outcome::Linked,
        }]
    );
    assert_eq!(inode(&a), inode(&b));
    assert_ne!(inode(&a), inode(&c));
    assert_eq!(summary.files_hashed, 3);
    assert_eq!(fs::read(&b).unwrap(), b"hello");
}

#[cfg(unix)]
#[test]
fn test_hardlink_nested_duplicates() {
    let dir = tempdir().unwrap();
    let a = write_file(dir.path(), "a/photo.jpg", b"jpeg bytes");
    let b = write_file(dir.path(), "b/c/photo-copy.jpg", b"jpeg bytes");
    let d = write_file(dir.path(), "d/again.jpg", b"jpeg bytes");

    let (_, summary) = linker(Action::Hardlink)
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(summary.linked, 2);
    assert_eq!(inode(&a), inode(&b));
    assert_eq!(inode(&a), inode(&d));
}

#[cfg(unix)]
#[test]
fn test_symlink_run_points_at_original() {
    let dir = tempdir().unwrap();
    let a = write_file(dir.path(), "keep/a.txt", b"shared");
    let b = write_file(dir.path(), "other/b.txt", b"shared");

    let (events, _) = linker(Action::Symlink)
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(events.len(), 1);
    let link = fs::read_link(&b).unwrap();
    assert_eq!(link, std::path::PathBuf::from("../keep/a.txt"));
    assert_eq!(fs::read(&b).unwrap(), fs::read(&a).unwrap());

    // The symlink is not a regular file, so a second run has nothing to do.
    let (events, summary) = linker(Action::Symlink)
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();
    assert!(events.is_empty());
    assert_eq!(summary.files_hashed, 0);
}

#[cfg(unix)]
#[test]
fn test_replace_twice_is_noop() {
    let dir = tempdir().unwrap();
    let a = write_file(dir.path(), "a", b"twice");
    let b = write_file(dir.path(), "b", b"twice");
    let hash = ContentHash::new("abc123");

    assert_eq!(
        replace_with_link(&a, &b, &hash, LinkKind::Hard).unwrap(),
        LinkOutcome::Linked
    );
    assert_eq!(
        replace_with_link(&a, &b, &hash, LinkKind::Hard).unwrap(),
        LinkOutcome::AlreadyLinked
    );
    assert_eq!(fs::read(&a).unwrap(), b"twice");
}

#[cfg(unix)]
#[test]
fn test_crash_leftover_is_harmless_on_rerun() {
    let dir = tempdir().unwrap();
    let a = write_file(dir.path(), "a", b"leftover");
    let b = write_file(dir.path(), "b", b"leftover");
    let hash = ContentHash::new("feed");

    // Crash right after the temporary link exists.
    let temp = TempLink::create(dir.path(), &hash, |temp| fs::hard_link(&a, temp)).unwrap();
    let leftover = temp.path().to_path_buf();
    std::mem::forget(temp);

    assert_eq!(fs::read(&b).unwrap(), b"leftover");
    assert_eq!(
        leftover.file_name().unwrap().to_string_lossy(),
        temp_link_name(&hash, 0)
    );

    // The leftover shares a's inode, so only b is reported and linked.
    let (events, summary) = linker(Action::Hardlink)
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(summary.linked, 1);
    assert!(matches!(
        &events[0],
        DedupeEvent::Duplicate { duplicate, .. } if duplicate == &b
    ));
    assert_eq!(inode(&a), inode(&b));
}

#[test]
fn test_report_mode_leaves_files_alone() {
    let dir = tempdir().unwrap();
    let a = write_file(dir.path(), "a", b"report me");
    let b = write_file(dir.path(), "b", b"report me");
    let before = fs::symlink_metadata(&b).unwrap();

    let (events, summary) = linker(Action::Report)
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(summary.linked, 0);
    assert_eq!(summary.reclaimable_bytes, 9);
    let after = fs::symlink_metadata(&b).unwrap();
    assert!(after.file_type().is_file());
    assert_eq!(before.modified().unwrap(), after.modified().unwrap());
    assert!(a.exists());
}
