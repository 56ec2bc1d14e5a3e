use linedupe::duplicates::{DuplicateFinder, FinderConfig};
use linedupe::scanner::{DigestWidth, HashAlgorithm, KeyConfig, SourceError, SourceId};
use std::fs;
use tempfile::tempdir;

fn write_source(dir: &tempfile::TempDir, name: &str, content: &str) -> SourceId {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    SourceId::File(path)
}

#[test]
fn test_scan_unique_lines() {
    let dir = tempdir().unwrap();
    let a = write_source(&dir, "a.txt", "one\ntwo\nthree\n");

    let finder = DuplicateFinder::with_defaults();
    let (lines, summary) = finder.find_duplicates(&[a]).unwrap();

    assert!(lines.is_empty());
    assert_eq!(summary.lines_read, 3);
    assert_eq!(summary.distinct_keys, 3);
    assert_eq!(summary.duplicate_lines, 0);
}

#[test]
fn test_scan_across_three_files() {
    let dir = tempdir().unwrap();
    let a = write_source(&dir, "a.txt", "alpha\nbeta\n");
    let b = write_source(&dir, "b.txt", "beta\ngamma\nalpha\n");
    let c = write_source(&dir, "c.txt", "delta\nbeta\n");

    let finder = DuplicateFinder::with_defaults();
    let (mut lines, summary) = finder
        .find_duplicates(&[a.clone(), b.clone(), c.clone()])
        .unwrap();
    lines.sort_by(|x, y| x.key.cmp(&y.key));

    assert_eq!(lines.len(), 2);

    let alpha = &lines[0];
    assert_eq!(alpha.text(), "alpha");
    assert_eq!(alpha.count, 2);
    assert_eq!(alpha.lines_in(&a), Some(&[1][..]));
    assert_eq!(alpha.lines_in(&b), Some(&[3][..]));
    assert_eq!(alpha.lines_in(&c), None);

    let beta = &lines[1];
    assert_eq!(beta.text(), "beta");
    assert_eq!(beta.count, 3);
    assert_eq!(beta.locations.len(), 3);
    assert_eq!(beta.lines_in(&c), Some(&[2][..]));

    assert_eq!(summary.sources, 3);
    assert_eq!(summary.lines_read, 7);
    assert!(!summary.has_errors());
}

#[test]
fn test_threshold_filters_counts() {
    let dir = tempdir().unwrap();
    let a = write_source(&dir, "a.txt", "x\nx\nx\ny\ny\nz\n");

    let finder = DuplicateFinder::new(FinderConfig::default().with_threshold(2));
    let (lines, _) = finder.find_duplicates(&[a.clone()]).unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].text(), "x");

    let finder = DuplicateFinder::new(FinderConfig::default().with_threshold(0));
    let (lines, _) = finder.find_duplicates(&[a]).unwrap();
    assert_eq!(lines.len(), 3);
}

#[test]
fn test_same_file_listed_twice_is_two_sources() {
    let dir = tempdir().unwrap();
    let a = write_source(&dir, "a.txt", "once\n");

    let finder = DuplicateFinder::with_defaults();
    let (lines, summary) = finder.find_duplicates(&[a.clone(), a]).unwrap();

    assert_eq!(summary.sources, 2);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].count, 2);
    assert_eq!(lines[0].locations.len(), 2);
    assert!(lines[0].locations.iter().all(|l| l.lines == vec![1]));
}

#[test]
fn test_long_lines_compared_by_digest() {
    let dir = tempdir().unwrap();
    let long = "the quick brown fox jumps over the lazy dog";
    let a = write_source(&dir, "a.txt", &format!("{long}\nshort\n"));
    let b = write_source(&dir, "b.txt", &format!("{long}\n{long}x\n"));

    let finder = DuplicateFinder::with_defaults();
    let (lines, summary) = finder.find_duplicates(&[a, b]).unwrap();

    assert_eq!(lines.len(), 1);
    assert!(lines[0].is_hashed());
    assert_eq!(lines[0].count, 2);
    assert_eq!(lines[0].text().len(), 64);
    assert_eq!(summary.hashed_keys, 2);
}

#[test]
fn test_blake3_truncated_digests() {
    let dir = tempdir().unwrap();
    let long = "b".repeat(100);
    let a = write_source(&dir, "a.txt", &format!("{long}\n{long}\n"));

    let key_config = KeyConfig::default()
        .with_algorithm(HashAlgorithm::Blake3)
        .with_digest_width(DigestWidth::Bits128);
    let finder = DuplicateFinder::new(FinderConfig::default().with_key_config(key_config));
    let (lines, _) = finder.find_duplicates(&[a]).unwrap();

    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].key.algorithm(), Some(HashAlgorithm::Blake3));
    assert_eq!(lines[0].text().len(), 32);
}

#[test]
fn test_crlf_and_lf_lines_match() {
    let dir = tempdir().unwrap();
    let a = write_source(&dir, "dos.txt", "same\r\nother\r\n");
    let b = write_source(&dir, "unix.txt", "same\n");

    let finder = DuplicateFinder::with_defaults();
    let (lines, _) = finder.find_duplicates(&[a, b]).unwrap();

    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].text(), "same");
}

#[test]
fn test_unreadable_source_does_not_stop_others() {
    let dir = tempdir().unwrap();
    let a = write_source(&dir, "a.txt", "k\n");
    let missing = SourceId::File(dir.path().join("missing.txt"));
    let b = write_source(&dir, "b.txt", "k\n");

    let finder = DuplicateFinder::with_defaults();
    let (lines, summary) = finder.find_duplicates(&[a, missing.clone(), b]).unwrap();

    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].count, 2);
    assert_eq!(summary.sources, 3);
    assert_eq!(summary.sources_failed, 1);
    match &summary.source_errors[0] {
        SourceError::Open { id, .. } => assert_eq!(id, &missing),
        other => panic!("Expected open failure, got {:?}", other),
    }
}

#[test]
fn test_directory_as_source_is_partial_failure() {
    let dir = tempdir().unwrap();
    let a = write_source(&dir, "a.txt", "v\nv\n");
    let directory = SourceId::File(dir.path().to_path_buf());

    let finder = DuplicateFinder::with_defaults();
    let (lines, summary) = finder.find_duplicates(&[a, directory]).unwrap();

    assert_eq!(lines.len(), 1);
    assert_eq!(summary.sources_failed, 1);
}
