//! Single-writer aggregation of line records.
//!
//! # Overview
//!
//! The [`Aggregator`] owns the mapping from [`NormalizedKey`] to
//! [`OccurrenceEntry`]. It is the only component that mutates that mapping:
//! source readers send [`RawRecord`]s over a channel and the aggregator
//! applies them one at a time, so no locking is needed.
//!
//! Entries are created on first sighting of a key, updated on every further
//! sighting and never removed during a run. Once every sender is gone the
//! aggregator yields the entries whose count strictly exceeds the threshold,
//! in no particular order.
//!
//! # Example
//!
//! ```
//! use linedupe::duplicates::aggregate;
//! use linedupe::scanner::{normalize, RawRecord};
//!
//! let records = vec![
//!     RawRecord { key: normalize("x"), source: 0, line: 1 },
//!     RawRecord { key: normalize("y"), source: 0, line: 2 },
//!     RawRecord { key: normalize("x"), source: 1, line: 1 },
//! ];
//!
//! let duplicates = aggregate(records, 1);
//! assert_eq!(duplicates.len(), 1);
//! assert_eq!(duplicates[0].1.count(), 2);
//! ```

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};

use crate::scanner::{NormalizedKey, RawRecord};

/// Occurrence metadata for one distinct key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccurrenceEntry {
    count: u64,
    /// Line numbers per source, keyed by source position
    locations: BTreeMap<usize, Vec<u64>>,
}

impl OccurrenceEntry {
    /// Create an entry for the first sighting of a key.
    #[must_use]
    pub fn new(source: usize, line: u64) -> Self {
        let mut locations = BTreeMap::new();
        locations.insert(source, vec![line]);
        Self {
            count: 1,
            locations,
        }
    }

    /// Record a further sighting.
    ///
    /// The per-source list is created on the first sighting from that source.
    pub fn record(&mut self, source: usize, line: u64) {
        self.count += 1;
        self.locations.entry(source).or_default().push(line);
    }

    /// Number of sightings.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Line numbers per source position, each list in scan order.
    #[must_use]
    pub fn locations(&self) -> &BTreeMap<usize, Vec<u64>> {
        &self.locations
    }

    /// Line numbers recorded for one source.
    #[must_use]
    pub fn lines_in(&self, source: usize) -> &[u64] {
        self.locations.get(&source).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of recorded line numbers across all sources.
    #[must_use]
    pub fn location_count(&self) -> usize {
        self.locations.values().map(Vec::len).sum()
    }

    /// Consume the entry, returning its per-source line lists.
    #[must_use]
    pub fn into_locations(self) -> BTreeMap<usize, Vec<u64>> {
        self.locations
    }
}

/// Owner of the key to occurrence mapping.
#[derive(Debug, Default)]
pub struct Aggregator {
    threshold: u64,
    entries: HashMap<NormalizedKey, OccurrenceEntry>,
    records: u64,
    hashed_keys: usize,
}

impl Aggregator {
    /// Create an aggregator reporting keys seen more than `threshold` times.
    #[must_use]
    pub fn new(threshold: u64) -> Self {
        Self {
            threshold,
            ..Default::default()
        }
    }

    /// Apply one record.
    pub fn record(&mut self, record: RawRecord) {
        self.records += 1;
        match self.entries.entry(record.key) {
            Entry::Occupied(mut slot) => slot.get_mut().record(record.source, record.line),
            Entry::Vacant(slot) => {
                if slot.key().is_digest() {
                    self.hashed_keys += 1;
                }
                slot.insert(OccurrenceEntry::new(record.source, record.line));
            }
        }
    }

    /// Apply every record until the input is exhausted.
    ///
    /// With a channel receiver this blocks until all senders are dropped.
    pub fn consume<I: IntoIterator<Item = RawRecord>>(&mut self, records: I) {
        for record in records {
            self.record(record);
        }
        log::debug!(
            "Aggregated {} records into {} distinct keys",
            self.records,
            self.entries.len()
        );
    }

    /// Reporting threshold.
    #[must_use]
    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Number of records applied.
    #[must_use]
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Number of distinct keys seen.
    #[must_use]
    pub fn distinct_keys(&self) -> usize {
        self.entries.len()
    }

    /// Number of distinct keys that are digests of long lines.
    #[must_use]
    pub fn hashed_keys(&self) -> usize {
        self.hashed_keys
    }

    /// Look up the entry for a key.
    #[must_use]
    pub fn get(&self, key: &NormalizedKey) -> Option<&OccurrenceEntry> {
        self.entries.get(key)
    }

    /// Consume the aggregator, yielding entries with `count > threshold`.
    ///
    /// Output order is unspecified.
    #[must_use]
    pub fn into_duplicates(self) -> Vec<(NormalizedKey, OccurrenceEntry)> {
        let threshold = self.threshold;
        self.entries
            .into_iter()
            .filter(|(_, entry)| entry.count > threshold)
            .collect()
    }
}

/// Aggregate a stream of records and return entries with `count > threshold`.
///
/// Output order is unspecified.
#[must_use]
pub fn aggregate<I: IntoIterator<Item = RawRecord>>(
    records: I,
    threshold: u64,
) -> Vec<(NormalizedKey, OccurrenceEntry)> {
    let mut aggregator = Aggregator::new(threshold);
    aggregator.consume(records);
    aggregator.into_duplicates()
}
