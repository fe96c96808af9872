//! User-visible warning stream.
//!
//! Notices are plain strings meant for the person running the profiler:
//! password prompts, fallbacks, missing chart data. They are not log
//! records and are shown regardless of the log level.

/// Receiver of user-facing notices
pub trait NoticeSink {
    fn notice(&mut self, message: &str);
}

/// Prints each notice to stderr
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrNotices;

impl NoticeSink for StderrNotices {
    fn notice(&mut self, message: &str) {
        eprintln!("{}", message);
    }
}

/// Collects notices, mostly for tests and HTML output
impl NoticeSink for Vec<String> {
    fn notice(&mut self, message: &str) {
        self.push(message.to_string());
    }
}
