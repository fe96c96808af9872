//! Syscall-trace line parser.
//!
//! Accepts lines of the shape `[<ts>] <pid> <name>(<args>) = <result>` as
//! written by `strace -f -ttt -o`. strace puts the pid first when writing
//! to a file (`<pid> <ts> <name>(...)`); both orders are accepted.
//!
//! Continuation lines (`<unfinished ...>`, `<... read resumed>`) never
//! carry a complete call plus return value and are rejected.

use super::event::{IoEvent, IoKind};
use super::TraceLineParser;
use crate::utils::config::STRACE_IO_SYSCALLS;

/// Parser for one strace output line
#[derive(Debug, Clone)]
pub struct StraceParser {
    /// Lowercased allow-list of I/O syscall names
    syscalls: Vec<String>,
}

impl Default for StraceParser {
    fn default() -> Self {
        Self::with_syscalls(STRACE_IO_SYSCALLS.iter().copied())
    }
}

impl StraceParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a parser that accepts the given syscall names.
    ///
    /// Names are matched case-insensitively. A name that contains neither
    /// `read` nor `write` is accepted by the allow-list but still rejected
    /// at classification time.
    pub fn with_syscalls<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            syscalls: names
                .into_iter()
                .map(|s| s.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn syscalls(&self) -> &[String] {
        &self.syscalls
    }

    fn is_io_syscall(&self, name: &str) -> bool {
        self.syscalls.iter().any(|s| s.eq_ignore_ascii_case(name))
    }
}

impl StraceParser {
    fn classify<'a>(&self, line: &'a str) -> Option<(IoKind, SyscallLine<'a>)> {
        let call = split_call(line)?;
        if !self.is_io_syscall(call.name) {
            return None;
        }
        let kind = IoKind::from_op_name(&call.name.to_ascii_lowercase())?;
        Some((kind, call))
    }
}

impl TraceLineParser for StraceParser {
    fn parse_event(&self, line: &str) -> Option<IoEvent> {
        let (kind, call) = self.classify(line)?;
        Some(IoEvent {
            kind,
            bytes: call.result,
            timestamp: call.timestamp.map(str::to_string),
        })
    }

    fn parse_op(&self, line: &str) -> Option<(IoKind, u64)> {
        self.classify(line).map(|(kind, call)| (kind, call.result))
    }
}

/// A syscall line broken into its parts
#[derive(Debug, PartialEq)]
struct SyscallLine<'a> {
    timestamp: Option<&'a str>,
    name: &'a str,
    result: u64,
}

/// **Private** - split a line into timestamp, syscall name and return value
///
/// Returns `None` for anything that is not a complete call with a
/// non-negative integer return value.
fn split_call(line: &str) -> Option<SyscallLine<'_>> {
    let line = line.trim();
    let open = line.find('(')?;
    let head = &line[..open];

    // The name is the identifier run directly before '('
    let name_start = head
        .rfind(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .map(|i| i + 1)?;
    let name = &head[name_start..];
    if name.is_empty() {
        return None;
    }

    let prefix: Vec<&str> = head[..name_start].split_whitespace().collect();
    let timestamp = match prefix.as_slice() {
        [pid] if is_pid(pid) => None,
        [first, second] if is_pid(first) && is_decimal(second) && second.contains('.') => {
            Some(*second)
        }
        [ts, pid] if is_decimal(ts) && is_pid(pid) => Some(*ts),
        _ => return None,
    };

    let result = return_value(&line[open + 1..])?;

    Some(SyscallLine {
        timestamp,
        name,
        result,
    })
}

/// **Private** - find `) = <n>` after a non-empty argument list
fn return_value(after_open: &str) -> Option<u64> {
    for (idx, _) in after_open.match_indices(')') {
        let rest = after_open[idx + 1..].trim_start();
        let Some(value) = rest.strip_prefix('=') else {
            continue;
        };
        if idx == 0 {
            // empty argument list
            return None;
        }
        return parse_return(value.trim_start());
    }
    None
}

/// **Private** - leading signed integer; negative values are errors
fn parse_return(text: &str) -> Option<u64> {
    if text.starts_with('-') {
        return None;
    }
    let digits: &str = {
        let end = text
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(text.len());
        &text[..end]
    };
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

fn is_pid(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

fn is_decimal(token: &str) -> bool {
    let (int, frac) = match token.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (token, None),
    };
    is_pid(int) && frac.map_or(true, is_pid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_pid_only() {
        let call = split_call("100 read(3, \"x\", 10) = 10").unwrap();
        assert_eq!(
            call,
            SyscallLine {
                timestamp: None,
                name: "read",
                result: 10
            }
        );
    }

    #[test]
    fn test_split_timestamp_first() {
        let call = split_call("1700000000.123456 4242 write(1, \"hi\", 2) = 2").unwrap();
        assert_eq!(call.timestamp, Some("1700000000.123456"));
        assert_eq!(call.name, "write");
    }

    #[test]
    fn test_split_strace_file_order() {
        let call = split_call("4242 1700000000.123456 pread64(3, \"\"..., 4096, 0) = 4096").unwrap();
        assert_eq!(call.timestamp, Some("1700000000.123456"));
        assert_eq!(call.result, 4096);
    }

    #[test]
    fn test_rejects_continuations() {
        assert!(split_call("100 read(3,  <unfinished ...>").is_none());
        assert!(split_call("100 <... read resumed>\"x\", 10) = 10").is_none());
    }

    #[test]
    fn test_return_after_paren_inside_args() {
        // ')' inside a quoted buffer is not the end of the call
        let call = split_call("100 write(1, \"a) b\", 4) = 4").unwrap();
        assert_eq!(call.result, 4);
    }

    #[test]
    fn test_rejects_error_and_unknown_returns() {
        assert!(split_call("100 read(3, \"x\", 1) = -1 EBADF (Bad file descriptor)").is_none());
        assert!(split_call("100 read(3, \"x\", 1) = ?").is_none());
        assert!(split_call("100 read() = 0").is_none());
    }

    #[test]
    fn test_is_decimal() {
        assert!(is_decimal("123"));
        assert!(is_decimal("123.5"));
        assert!(!is_decimal("12:34"));
        assert!(!is_decimal("1.2.3"));
        assert!(!is_decimal(""));
    }
}
