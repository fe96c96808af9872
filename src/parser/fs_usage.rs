//! Filesystem-event line parser for `fs_usage -w -f filesys` output.
//!
//! Shape: `<HH:MM:SS.ffffff> <op> [F=..] [B=0x<hex>] ... <path> <proc>`.
//! The operation is always the second whitespace token.
//!
//! Classification is a case-insensitive substring match on `read`/`write`
//! in the operation token, so abbreviated spellings such as `RdData` or
//! `WrData` are not recognized.

use super::event::{IoEvent, IoKind};
use super::TraceLineParser;

const BYTE_MARKER: &str = "B=0x";

/// Parser for one fs_usage output line
#[derive(Debug, Clone, Copy, Default)]
pub struct FsUsageParser;

impl FsUsageParser {
    pub fn new() -> Self {
        Self
    }
}

impl TraceLineParser for FsUsageParser {
    fn parse_event(&self, line: &str) -> Option<IoEvent> {
        let mut tokens = line.split_whitespace();
        let first = tokens.next()?;
        let op = tokens.next()?;

        let kind = IoKind::from_op_name(&op.to_lowercase())?;
        let bytes = byte_count(line).unwrap_or(0);
        // Only clock-style leading tokens are timestamps
        let timestamp = first.contains(':').then(|| first.to_string());

        Some(IoEvent {
            kind,
            bytes,
            timestamp,
        })
    }
}

/// **Private** - value of the first `B=0x<hex>` marker in the line
///
/// Returns `None` when the marker is missing, has no hex digits, or does
/// not fit in 64 bits.
fn byte_count(line: &str) -> Option<u64> {
    let start = line.find(BYTE_MARKER)? + BYTE_MARKER.len();
    let rest = &line[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_hexdigit())
        .unwrap_or(rest.len());
    u64::from_str_radix(&rest[..end], 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_count() {
        assert_eq!(byte_count("x B=0x800 y"), Some(2048));
        assert_eq!(byte_count("x B=0xFFff y"), Some(0xffff));
        assert_eq!(byte_count("x B=0x y"), None);
        assert_eq!(byte_count("x B=0xzz"), None);
        assert_eq!(byte_count("no marker"), None);
        assert_eq!(byte_count("B=0x10000000000000000"), None);
    }

    #[test]
    fn test_marker_anywhere_in_line() {
        let ev = FsUsageParser
            .parse_event("12:00:00.000001  pwrite  F=4  B=0x10  /tmp/f  proc.1")
            .unwrap();
        assert_eq!(ev.bytes, 16);
        assert_eq!(ev.timestamp.as_deref(), Some("12:00:00.000001"));
    }

    #[test]
    fn test_abbreviated_ops_not_recognized() {
        assert!(FsUsageParser
            .parse_event("12:00:00.000001  RdData[A]  D=0x1  B=0x1000  /dev/disk1")
            .is_none());
        assert!(FsUsageParser
            .parse_event("12:00:00.000001  WrData[A]  D=0x1  B=0x1000  /dev/disk1")
            .is_none());
    }
}
