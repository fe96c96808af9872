//! Trace line parsing.
//!
//! This module handles:
//! - Normalizing tracer output into `IoEvent`s
//! - strace syscall lines
//! - fs_usage filesystem-event lines
//! - Reading a whole capture file through one parser

pub mod event;
pub mod fs_usage;
pub mod strace;

// Re-export main types
pub use event::{IoEvent, IoKind};
pub use fs_usage::FsUsageParser;
pub use strace::StraceParser;

use crate::aggregator::IoSummary;
use log::debug;
use serde::{Deserialize, Serialize};
use std::io::BufRead;

/// Result of parsing one line in either shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// Reduced shape: kind and byte count only
    Op(IoKind, u64),
    /// Detail shape: full event including timestamp
    Event(IoEvent),
}

impl ParsedLine {
    pub fn kind(&self) -> IoKind {
        match self {
            Self::Op(kind, _) => *kind,
            Self::Event(ev) => ev.kind,
        }
    }

    pub fn bytes(&self) -> u64 {
        match self {
            Self::Op(_, bytes) => *bytes,
            Self::Event(ev) => ev.bytes,
        }
    }
}

/// A stateless parser for one tracer's line format
///
/// Implementations are pure functions of the line: a rejected line is
/// `None`, never an error.
pub trait TraceLineParser {
    /// Parse a line into a full event
    fn parse_event(&self, line: &str) -> Option<IoEvent>;

    /// Parse a line into `(kind, bytes)` without keeping the timestamp
    fn parse_op(&self, line: &str) -> Option<(IoKind, u64)> {
        self.parse_event(line).map(|ev| (ev.kind, ev.bytes))
    }

    /// Parse in the shape selected by `detail`
    fn parse(&self, line: &str, detail: bool) -> Option<ParsedLine> {
        if detail {
            self.parse_event(line).map(ParsedLine::Event)
        } else {
            self.parse_op(line)
                .map(|(kind, bytes)| ParsedLine::Op(kind, bytes))
        }
    }
}

/// Which tracer produced a capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TraceFormat {
    Strace,
    FsUsage,
}

/// Capture file contents reduced to a summary
#[derive(Debug, Clone, Default)]
pub struct ParsedTrace {
    pub summary: IoSummary,
    /// Accepted events in file order, only when detail was requested
    pub operations: Option<Vec<IoEvent>>,
    pub total_lines: usize,
    pub accepted_lines: usize,
}

/// Parse every line of a capture through `parser`
///
/// Invalid UTF-8 is replaced rather than rejected so one garbled buffer
/// dump cannot abort the run.
///
/// # Arguments
/// * `reader` - Capture contents
/// * `parser` - Line parser for the capture's format
/// * `detail` - Keep the ordered event list
///
/// # Errors
/// Only I/O errors from the reader. Unparseable lines are skipped.
pub fn parse_trace_lines<R, P>(mut reader: R, parser: &P, detail: bool) -> std::io::Result<ParsedTrace>
where
    R: BufRead,
    P: TraceLineParser + ?Sized,
{
    let mut parsed = ParsedTrace {
        operations: detail.then(Vec::new),
        ..ParsedTrace::default()
    };
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        parsed.total_lines += 1;

        let line = String::from_utf8_lossy(&buf);
        let Some(op) = parser.parse(&line, detail) else {
            continue;
        };
        parsed.accepted_lines += 1;
        parsed.summary.record(op.kind(), op.bytes());
        if let (Some(ops), ParsedLine::Event(ev)) = (parsed.operations.as_mut(), op) {
            ops.push(ev);
        }
    }

    debug!(
        "Parsed {} of {} trace lines",
        parsed.accepted_lines, parsed.total_lines
    );
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shapes_agree() {
        let parser = StraceParser::new();
        let line = "1700000000.5 100 read(3, \"x\", 10) = 10";
        let reduced = parser.parse(line, false).unwrap();
        let full = parser.parse(line, true).unwrap();
        assert_eq!(reduced, ParsedLine::Op(IoKind::Read, 10));
        assert_eq!(full.kind(), reduced.kind());
        assert_eq!(full.bytes(), reduced.bytes());
    }

    #[test]
    fn test_parse_trace_lines_lossy() {
        let mut data = b"100 write(1, \"".to_vec();
        data.extend_from_slice(&[0xff, 0xfe]);
        data.extend_from_slice(b"\", 2) = 2\n100 read(0, \"\", 0) = 0\n");

        let parsed = parse_trace_lines(&data[..], &StraceParser::new(), true).unwrap();
        assert_eq!(parsed.total_lines, 2);
        assert_eq!(parsed.accepted_lines, 2);
        assert_eq!(parsed.summary.write_count, 1);
        assert_eq!(parsed.operations.unwrap().len(), 2);
    }
}
