use iops_profiler::parser::{
    parse_trace_lines, FsUsageParser, IoKind, ParsedLine, StraceParser, TraceLineParser,
};
use pretty_assertions::assert_eq;
use std::io::Cursor;

const STRACE_CAPTURE: &str = "\
1234 1700000000.000100 read(3, \"abc\", 4096) = 3
1234 1700000000.000200 write(1, \"hello\\n\", 6) = 6
1234 1700000000.000300 read(3, \"\", 4096) = 0
1234 1700000000.000400 openat(AT_FDCWD, \"/etc/passwd\", O_RDONLY) = 3
1234 1700000000.000500 read(3, 0x7ffd, 4096) = -1 EAGAIN (Resource temporarily unavailable)
1235 1700000000.000600 <... read resumed> \"xyz\", 4096) = 3
strace: Process 1234 detached
";

#[test]
fn test_strace_capture_summary() {
    let parsed = parse_trace_lines(Cursor::new(STRACE_CAPTURE), &StraceParser::new(), false).unwrap();

    assert_eq!(parsed.total_lines, 7);
    assert_eq!(parsed.accepted_lines, 3);
    assert_eq!(parsed.summary.read_count, 2);
    assert_eq!(parsed.summary.write_count, 1);
    assert_eq!(parsed.summary.read_bytes, 3);
    assert_eq!(parsed.summary.write_bytes, 6);
    assert!(parsed.operations.is_none());
}

#[test]
fn test_strace_capture_detail_keeps_order_and_timestamps() {
    let parsed = parse_trace_lines(Cursor::new(STRACE_CAPTURE), &StraceParser::new(), true).unwrap();
    let ops = parsed.operations.unwrap();

    let kinds: Vec<IoKind> = ops.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![IoKind::Read, IoKind::Write, IoKind::Read]);
    assert_eq!(ops[0].timestamp.as_deref(), Some("1700000000.000100"));
    assert_eq!(ops[2].bytes, 0);
}

#[test]
fn test_strace_custom_allow_list() {
    let parser = StraceParser::with_syscalls(["write"]);
    let parsed = parse_trace_lines(Cursor::new(STRACE_CAPTURE), &parser, false).unwrap();
    assert_eq!(parsed.summary.read_count, 0);
    assert_eq!(parsed.summary.write_count, 1);
}

#[test]
fn test_fs_usage_write_line() {
    let line = "12:34:56  write  B=0x800  /tmp/f  Python";
    match FsUsageParser.parse(line, true) {
        Some(ParsedLine::Event(ev)) => {
            assert_eq!(ev.kind, IoKind::Write);
            assert_eq!(ev.bytes, 2048);
            assert_eq!(ev.timestamp.as_deref(), Some("12:34:56"));
        }
        other => panic!("unexpected parse: {:?}", other),
    }
}

#[test]
fn test_fs_usage_capture_mixed_lines() {
    let capture = "\
12:34:56.001  read   B=0x1000  /tmp/in   cat
12:34:56.002  pread  B=0x200   /tmp/in   cat
12:34:56.003  open   F=3       /tmp/in   cat
12:34:56.004  RdData[A]  D=0x1  B=0x1000 /dev/disk1 cat
garbage
";
    let parsed = parse_trace_lines(Cursor::new(capture), &FsUsageParser, false).unwrap();
    assert_eq!(parsed.summary.read_count, 2);
    assert_eq!(parsed.summary.read_bytes, 0x1000 + 0x200);
    assert_eq!(parsed.summary.write_count, 0);
}

#[test]
fn test_parsing_is_idempotent() {
    let parser = StraceParser::new();
    for line in STRACE_CAPTURE.lines() {
        assert_eq!(parser.parse_op(line), parser.parse_op(line));
    }
}

#[test]
fn test_invalid_utf8_is_tolerated() {
    let mut bytes = b"1 read(3, \"".to_vec();
    bytes.extend_from_slice(&[0xff, 0xfe]);
    bytes.extend_from_slice(b"\", 2) = 2\n");
    let parsed = parse_trace_lines(Cursor::new(bytes), &StraceParser::new(), false).unwrap();
    assert_eq!(parsed.summary.read_bytes, 2);
}
