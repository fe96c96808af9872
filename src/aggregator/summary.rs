//! Order-independent reduction of I/O events.

use crate::parser::{IoEvent, IoKind};
use log::debug;
use serde::{Deserialize, Serialize};

/// Read/write counts and byte sums
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoSummary {
    pub read_count: u64,
    pub write_count: u64,
    pub read_bytes: u64,
    pub write_bytes: u64,
}

impl IoSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one operation
    pub fn record(&mut self, kind: IoKind, bytes: u64) {
        match kind {
            IoKind::Read => {
                self.read_count += 1;
                self.read_bytes = self.read_bytes.saturating_add(bytes);
            }
            IoKind::Write => {
                self.write_count += 1;
                self.write_bytes = self.write_bytes.saturating_add(bytes);
            }
        }
    }

    pub fn total_ops(&self) -> u64 {
        self.read_count + self.write_count
    }

    pub fn total_bytes(&self) -> u64 {
        self.read_bytes.saturating_add(self.write_bytes)
    }
}

impl Extend<(IoKind, u64)> for IoSummary {
    fn extend<T: IntoIterator<Item = (IoKind, u64)>>(&mut self, iter: T) {
        for (kind, bytes) in iter {
            self.record(kind, bytes);
        }
    }
}

impl FromIterator<(IoKind, u64)> for IoSummary {
    fn from_iter<T: IntoIterator<Item = (IoKind, u64)>>(iter: T) -> Self {
        let mut summary = IoSummary::new();
        summary.extend(iter);
        summary
    }
}

impl<'a> FromIterator<&'a IoEvent> for IoSummary {
    fn from_iter<T: IntoIterator<Item = &'a IoEvent>>(iter: T) -> Self {
        iter.into_iter().map(|ev| (ev.kind, ev.bytes)).collect()
    }
}

/// Reduce an event list to its summary
///
/// **Public** - main entry point for event aggregation
pub fn summarize_events(events: &[IoEvent]) -> IoSummary {
    let summary: IoSummary = events.iter().collect();
    debug!(
        "Summarized {} events: {} reads, {} writes",
        events.len(),
        summary.read_count,
        summary.write_count
    );
    summary
}

/// Cumulative I/O counter snapshot
///
/// Counters only grow, but a snapshot source that resets (device hot-plug,
/// counter wrap) must never yield a negative delta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IoCounters {
    pub read_count: u64,
    pub write_count: u64,
    pub read_bytes: u64,
    pub write_bytes: u64,
}

impl IoCounters {
    /// Field-wise `after - self`, floored at zero
    pub fn delta(&self, after: &IoCounters) -> IoSummary {
        IoSummary {
            read_count: after.read_count.saturating_sub(self.read_count),
            write_count: after.write_count.saturating_sub(self.write_count),
            read_bytes: after.read_bytes.saturating_sub(self.read_bytes),
            write_bytes: after.write_bytes.saturating_sub(self.write_bytes),
        }
    }
}
