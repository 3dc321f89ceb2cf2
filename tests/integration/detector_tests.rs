use crate::common::{paths, MemoryInspector};
use dedupe::duplicates::{Bucket, BucketKey, Detector, DetectorConfig, DuplicatePair, Observation};
use dedupe::scanner::ScanError;
use std::path::{Path, PathBuf};

fn pairs(inspector: &MemoryInspector, names: &[&str]) -> Vec<(PathBuf, PathBuf)> {
    Detector::new(inspector, DetectorConfig::default())
        .stream(paths(names))
        .filter_map(Result::ok)
        .map(|pair: DuplicatePair| (pair.original.path, pair.duplicate.path))
        .collect()
}

#[test]
fn test_hello_world_scenario() {
    let inspector = MemoryInspector::new()
        .with_file("A", 1, 10, b"hello")
        .with_file("B", 1, 11, b"hello")
        .with_file("C", 1, 12, b"world");

    let mut stream =
        Detector::new(&inspector, DetectorConfig::default()).stream(paths(&["A", "B", "C"]));
    let pair = stream.next().unwrap().unwrap();
    assert!(stream.next().is_none());

    assert_eq!(pair.original.path, PathBuf::from("A"));
    assert_eq!(pair.duplicate.path, PathBuf::from("B"));
    assert_eq!(pair.hash.as_str(), "mem:hello");
    assert_eq!(inspector.hash_count(1, 12), 1);
    assert_eq!(inspector.total_hashes(), 3);
}

#[test]
fn test_pair_order_follows_traversal_order() {
    let inspector = MemoryInspector::new()
        .with_file("A", 1, 10, b"same")
        .with_file("B", 1, 11, b"same");

    assert_eq!(
        pairs(&inspector, &["B", "A"]),
        vec![(PathBuf::from("B"), PathBuf::from("A"))]
    );
}

#[test]
fn test_all_later_copies_point_at_first_original() {
    let inspector = MemoryInspector::new()
        .with_file("1", 1, 1, b"dup")
        .with_file("2", 1, 2, b"dup")
        .with_file("3", 1, 3, b"dup")
        .with_file("4", 1, 4, b"dup");

    let found = pairs(&inspector, &["1", "2", "3", "4"]);
    assert_eq!(found.len(), 3);
    assert!(found.iter().all(|(orig, _)| orig == &PathBuf::from("1")));
}

#[test]
fn test_cross_device_copies_are_not_paired() {
    let inspector = MemoryInspector::new()
        .with_file("disk1/a", 1, 7, b"payload")
        .with_file("disk2/a", 2, 7, b"payload");

    assert!(pairs(&inspector, &["disk1/a", "disk2/a"]).is_empty());
    assert_eq!(inspector.total_hashes(), 0);
}

#[test]
fn test_existing_hard_link_is_never_hashed() {
    let inspector = MemoryInspector::new()
        .with_file("a", 1, 5, b"content")
        .with_file("a-link", 1, 5, b"content");

    assert!(pairs(&inspector, &["a", "a-link"]).is_empty());
    assert_eq!(inspector.total_hashes(), 0);
}

#[test]
fn test_equal_size_distinct_content() {
    let inspector = MemoryInspector::new()
        .with_file("x", 1, 1, b"abc")
        .with_file("y", 1, 2, b"xyz")
        .with_file("z", 1, 3, b"pqr");

    assert!(pairs(&inspector, &["x", "y", "z"]).is_empty());
    for inode in 1..=3 {
        assert_eq!(inspector.hash_count(1, inode), 1);
    }
}

#[test]
fn test_min_size_skips_hashing() {
    let inspector = MemoryInspector::new()
        .with_file("a", 1, 1, b"hello")
        .with_file("b", 1, 2, b"hello");

    let detector = Detector::new(&inspector, DetectorConfig::default().with_min_size(10));
    let mut stream = detector.stream(paths(&["a", "b"]));
    assert!(stream.next().is_none());

    let detector = stream.into_detector();
    assert_eq!(detector.stats().below_min_size, 2);
    assert_eq!(detector.bucket_count(), 0);
    assert_eq!(inspector.total_hashes(), 0);
}

#[test]
fn test_unreadable_candidate_leaves_bucket_untouched() {
    let inspector = MemoryInspector::new()
        .with_file("a", 1, 1, b"12345")
        .with_unreadable("locked", 1, 2, 5)
        .with_file("b", 1, 3, b"12345");

    let mut detector = Detector::new(&inspector, DetectorConfig::default());
    let key = BucketKey {
        device_id: 1,
        size: 5,
    };

    detector.observe(Path::new("a")).unwrap();
    let err = detector.observe(Path::new("locked")).unwrap_err();
    assert!(matches!(&err, ScanError::HashError(e) if e.path() == Path::new("locked")));
    assert!(matches!(detector.bucket(&key), Some(Bucket::Unhashed(f)) if f.inode == Some(1)));

    let next = detector.observe(Path::new("b")).unwrap();
    assert!(matches!(next, Observation::Duplicate(_)));
    assert!(matches!(detector.bucket(&key), Some(Bucket::Hashed(_))));
    assert_eq!(detector.stats().errors, 1);

    // The failed collision already read "a"; it is not read again.
    assert_eq!(inspector.hash_count(1, 1), 1);
    assert_eq!(detector.stats().files_hashed as usize, inspector.total_hashes() - 1);
}

#[test]
fn test_stream_reports_missing_paths_and_continues() {
    let inspector = MemoryInspector::new()
        .with_file("a", 1, 1, b"same")
        .with_file("b", 1, 2, b"same");

    let results: Vec<_> = Detector::new(&inspector, DetectorConfig::default())
        .stream(paths(&["a", "vanished", "b"]))
        .collect();

    assert_eq!(results.len(), 2);
    assert!(matches!(
        &results[0],
        Err(ScanError::NotFound(p)) if p.as_path() == Path::new("vanished")
    ));
    assert!(results[1].is_ok());
}

#[test]
fn test_consumer_can_stop_early() {
    let inspector = MemoryInspector::new()
        .with_file("a", 1, 1, b"one")
        .with_file("b", 1, 2, b"one")
        .with_file("c", 1, 3, b"two")
        .with_file("d", 1, 4, b"two");

    let first: Vec<_> = Detector::new(&inspector, DetectorConfig::default())
        .stream(paths(&["a", "b", "c", "d"]))
        .take(1)
        .collect();

    assert_eq!(first.len(), 1);
    // c and d were never pulled, so never hashed.
    assert_eq!(inspector.hash_count(1, 3), 0);
    assert_eq!(inspector.hash_count(1, 4), 0);
}
