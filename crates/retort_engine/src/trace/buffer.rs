//! Bounded storage for trace records.

use std::collections::{BTreeMap, VecDeque};

use super::record::{TraceEvent, TraceRecord};

/// Ring buffer of trace records, oldest first.
///
/// When full, pushing evicts the oldest record. Record ids keep counting
/// across evictions and [`TraceBuffer::clear`], so an id identifies one
/// event for the lifetime of the tracer.
#[derive(Clone, Debug)]
pub struct TraceBuffer {
    records: VecDeque<TraceRecord>,
    capacity: usize,
    issued: u64,
    evicted: u64,
}

impl TraceBuffer {
    /// Creates a buffer holding at most `capacity` records.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            issued: 0,
            evicted: 0,
        }
    }

    /// Appends an event and returns its record id.
    pub fn push(&mut self, step: u64, timestamp_ns: u64, event: TraceEvent) -> u64 {
        let id = self.issued;
        self.issued += 1;
        self.records
            .push_back(TraceRecord::new(id, step, timestamp_ns, event));
        while self.records.len() > self.capacity {
            self.records.pop_front();
            self.evicted += 1;
        }
        id
    }

    /// Number of records held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no records are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drops every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Iterates records, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &TraceRecord> {
        self.records.iter()
    }

    /// The newest record.
    #[must_use]
    pub fn last(&self) -> Option<&TraceRecord> {
        self.records.back()
    }

    fn matching(&self, keep: impl Fn(&TraceRecord) -> bool) -> Vec<&TraceRecord> {
        self.records.iter().filter(|r| keep(r)).collect()
    }

    /// Records produced by one network mutation.
    #[must_use]
    pub fn records_for_step(&self, step: u64) -> Vec<&TraceRecord> {
        self.matching(|r| r.step == step)
    }

    /// Records with the given event type name, such as `"node-created"`.
    #[must_use]
    pub fn by_event_type(&self, event_type: &str) -> Vec<&TraceRecord> {
        self.matching(|r| r.event_type() == event_type)
    }

    /// The newest `count` records, oldest first.
    #[must_use]
    pub fn recent(&self, count: usize) -> Vec<&TraceRecord> {
        let skip = self.records.len().saturating_sub(count);
        self.records.iter().skip(skip).collect()
    }

    /// Summarizes the buffer.
    #[must_use]
    pub fn stats(&self) -> TraceBufferStats {
        let mut event_counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        for record in &self.records {
            *event_counts.entry(record.event_type()).or_default() += 1;
        }
        TraceBufferStats {
            record_count: self.records.len(),
            capacity: self.capacity,
            evicted: self.evicted,
            steps: self
                .records
                .front()
                .zip(self.records.back())
                .map(|(oldest, newest)| (oldest.step, newest.step)),
            event_counts,
        }
    }
}

impl Default for TraceBuffer {
    fn default() -> Self {
        Self::new(10_000)
    }
}

/// Snapshot of a [`TraceBuffer`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceBufferStats {
    /// Records held.
    pub record_count: usize,
    /// Maximum records held.
    pub capacity: usize,
    /// Records dropped to make room.
    pub evicted: u64,
    /// Oldest and newest step held.
    pub steps: Option<(u64, u64)>,
    /// Records held per event type.
    pub event_counts: BTreeMap<&'static str, usize>,
}
