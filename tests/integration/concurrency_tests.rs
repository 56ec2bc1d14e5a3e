use linedupe::duplicates::{DuplicateFinder, FinderConfig};
use linedupe::progress::ProgressCallback;
use linedupe::scanner::SourceId;
use std::fmt::Write as _;
use std::fs;
use std::io::Cursor;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::tempdir;

#[derive(Default)]
struct CountingProgress {
    started: AtomicUsize,
    finished: AtomicUsize,
    failed: AtomicUsize,
    lines: AtomicU64,
}

impl ProgressCallback for CountingProgress {
    fn on_source_start(&self, _index: usize, _source: &SourceId) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn on_lines(&self, _index: usize, _lines: u64) {}

    fn on_source_end(&self, _index: usize, lines: u64, failed: bool) {
        self.finished.fetch_add(1, Ordering::SeqCst);
        self.lines.fetch_add(lines, Ordering::SeqCst);
        if failed {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[test]
fn test_many_sources_share_one_aggregator() {
    const SOURCES: usize = 32;
    const LINES: u64 = 500;

    let mut content = String::new();
    for i in 1..=LINES {
        writeln!(content, "line {}", i % 50).unwrap();
    }
    let inputs: Vec<_> = (0..SOURCES)
        .map(|i| (SourceId::from_arg(&format!("mem-{i}")), Cursor::new(content.clone())))
        .collect();

    let finder = DuplicateFinder::with_defaults();
    let (lines, summary) = finder.find_duplicates_from_readers(inputs).unwrap();

    assert_eq!(summary.lines_read, SOURCES as u64 * LINES);
    assert_eq!(lines.len(), 50);
    for line in &lines {
        assert_eq!(line.count, SOURCES as u64 * 10);
        assert_eq!(line.locations.len(), SOURCES);
        assert_eq!(line.location_count() as u64, line.count);
        for location in &line.locations {
            assert_eq!(location.lines.len(), 10);
            assert!(location.lines.windows(2).all(|w| w[0] < w[1]));
        }
    }
}

#[test]
fn test_rendezvous_and_buffered_channels_agree() {
    let dir = tempdir().unwrap();
    let sources: Vec<SourceId> = (0..8)
        .map(|i| {
            let path = dir.path().join(format!("{i}.txt"));
            let body: String = (0..200).map(|n| format!("{}\n", (n * (i + 1)) % 37)).collect();
            fs::write(&path, body).unwrap();
            SourceId::File(path)
        })
        .collect();

    let rendezvous = DuplicateFinder::new(FinderConfig::default().with_channel_capacity(0));
    let buffered = DuplicateFinder::new(FinderConfig::default().with_channel_capacity(1024));

    let (mut a, summary_a) = rendezvous.find_duplicates(&sources).unwrap();
    let (mut b, summary_b) = buffered.find_duplicates(&sources).unwrap();
    a.sort_by(|x, y| x.key.cmp(&y.key));
    b.sort_by(|x, y| x.key.cmp(&y.key));

    assert_eq!(a, b);
    assert_eq!(summary_a.lines_read, summary_b.lines_read);
    assert_eq!(summary_a.distinct_keys, summary_b.distinct_keys);
}

#[test]
fn test_progress_callback_sees_every_source() {
    let dir = tempdir().unwrap();
    let present = dir.path().join("present.txt");
    fs::write(&present, "a\nb\na\n").unwrap();
    let sources = vec![
        SourceId::File(present.clone()),
        SourceId::File(dir.path().join("missing.txt")),
        SourceId::File(present),
    ];

    let progress = Arc::new(CountingProgress::default());
    let finder = DuplicateFinder::new(
        FinderConfig::default().with_progress_callback(progress.clone()),
    );
    let (_, summary) = finder.find_duplicates(&sources).unwrap();

    assert_eq!(progress.started.load(Ordering::SeqCst), 3);
    assert_eq!(progress.finished.load(Ordering::SeqCst), 3);
    assert_eq!(progress.failed.load(Ordering::SeqCst), 1);
    assert_eq!(progress.lines.load(Ordering::SeqCst), 6);
    assert_eq!(summary.sources_failed, 1);
}
