//! Scoped I/O interception for counter-mode measurements.
//!
//! Instead of patching a process-wide "open" entry point, the executor is
//! handed an `ExecContext` whose `open` returns a `TrackedFile`. Reads and
//! writes through that handle are recorded into an `IoTracker` that only
//! lives for one traced call. Native I/O that bypasses the context is
//! invisible to it.

use crate::parser::{IoEvent, IoKind};
use chrono::Utc;
use std::cell::RefCell;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};

/// Event sink for one traced call
#[derive(Debug, Default)]
pub struct IoTracker {
    events: RefCell<Vec<IoEvent>>,
}

impl IoTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed operation, stamped with the current wall clock
    /// as decimal epoch seconds
    pub fn record(&self, kind: IoKind, bytes: u64) {
        let now = Utc::now();
        let stamp = format!("{}.{:06}", now.timestamp(), now.timestamp_subsec_micros());
        self.events
            .borrow_mut()
            .push(IoEvent::new(kind, bytes).with_timestamp(stamp));
    }

    /// Consume the tracker, returning events in the order they happened
    pub fn into_events(self) -> Vec<IoEvent> {
        self.events.into_inner()
    }
}

/// File handle that reports its reads and writes to a tracker
#[derive(Debug)]
pub struct TrackedFile<'a> {
    file: File,
    tracker: Option<&'a IoTracker>,
}

impl<'a> TrackedFile<'a> {
    pub(crate) fn new(file: File, tracker: Option<&'a IoTracker>) -> Self {
        Self { file, tracker }
    }

    fn note(&self, kind: IoKind, bytes: usize) {
        if let Some(tracker) = self.tracker {
            tracker.record(kind, bytes as u64);
        }
    }
}

impl Read for TrackedFile<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.file.read(buf)?;
        self.note(IoKind::Read, n);
        Ok(n)
    }
}

impl Write for TrackedFile<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.file.write(buf)?;
        self.note(IoKind::Write, n);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl Seek for TrackedFile<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::OpenOptions;

    #[test]
    fn test_tracked_file_records_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        let tracker = IoTracker::new();

        {
            let file = OpenOptions::new()
                .create(true)
                .truncate(true)
                .read(true)
                .write(true)
                .open(&path)
                .unwrap();
            let mut tracked = TrackedFile::new(file, Some(&tracker));
            tracked.write_all(b"hello").unwrap();
            tracked.seek(SeekFrom::Start(0)).unwrap();
            let mut buf = Vec::new();
            tracked.read_to_end(&mut buf).unwrap();
            assert_eq!(buf, b"hello");
        }

        let events = tracker.into_events();
        assert_eq!((events[0].kind, events[0].bytes), (IoKind::Write, 5));
        assert!(events.iter().any(|ev| ev.kind == IoKind::Read && ev.bytes == 5));
        // read_to_end finishes with a 0-byte EOF read
        assert_eq!(events.last().map(|ev| ev.bytes), Some(0));
        assert!(events.iter().all(|ev| ev.timestamp.is_some()));
    }

    #[test]
    fn test_untracked_file_records_nothing() {
        let file = tempfile::tempfile().unwrap();
        let mut tracked = TrackedFile::new(file, None);
        tracked.write_all(b"x").unwrap();
    }
}
