//! Configuration and constants for the profiler.
//!
//! The constants are the defaults; `ProfilerConfig` overrides them and can
//! be loaded from a TOML file.

use super::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Current saved-result schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

// Settle delays around the traced window
pub const TRACER_ATTACH_DELAY: Duration = Duration::from_millis(500);
pub const TRACER_CAPTURE_DELAY: Duration = Duration::from_millis(500);

/// Time a tracer gets to exit after SIGTERM before it is killed
pub const TRACER_STOP_TIMEOUT: Duration = Duration::from_secs(2);

// Privileged helper handshake
pub const HELPER_READY_TIMEOUT: Duration = Duration::from_secs(30);
pub const HELPER_POLL_INTERVAL: Duration = Duration::from_millis(500);
pub const HELPER_STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// I/O syscalls traced by strace
pub const STRACE_IO_SYSCALLS: &[&str] = &[
    "read", "write", // Basic I/O
    "pread64", "pwrite64", // Positional I/O
    "readv", "writev", // Vectored I/O
    "preadv", "pwritev", // Positional vectored I/O
    "preadv2", "pwritev2", // Extended vectored I/O
];

// Binning
pub const HISTOGRAM_BINS: usize = 200;
pub const HEATMAP_SIZE_BINS: usize = 29;
pub const HEATMAP_TIME_BINS: usize = 49;

/// Pad applied to both ends of a log-spaced size range (min*0.99, max*1.01)
pub const SIZE_RANGE_PAD: f64 = 0.01;

/// Expansion around a single repeated size (v*0.9, v*1.1)
pub const SINGLE_VALUE_EXPANSION: f64 = 0.1;

// Counter sources (Linux procfs)
pub const PROC_SELF_IO: &str = "/proc/self/io";
pub const PROC_DISKSTATS: &str = "/proc/diskstats";

/// Sector size used by /proc/diskstats
pub const DISKSTATS_SECTOR_SIZE: u64 = 512;

// Chart files written in plain-text mode
pub const HISTOGRAM_FILE_NAME: &str = "iops_histogram.svg";
pub const HEATMAP_FILE_NAME: &str = "iops_heatmap.svg";

/// Environment variable forcing the display mode (`html` or `plain`)
pub const DISPLAY_ENV_VAR: &str = "IOPS_PROFILER_DISPLAY";

/// Tunables for one profiling invocation.
///
/// Every field has a default, so a TOML file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilerConfig {
    /// Syscall names the strace backend filters for and the parser accepts
    pub io_syscalls: Vec<String>,

    pub attach_delay_ms: u64,
    pub capture_delay_ms: u64,
    pub tracer_stop_timeout_ms: u64,

    pub helper_ready_timeout_ms: u64,
    pub helper_poll_interval_ms: u64,
    pub helper_stop_timeout_ms: u64,

    /// Tracer binaries (resolved through PATH when relative)
    pub strace_path: PathBuf,
    pub fs_usage_path: PathBuf,

    pub proc_io_path: PathBuf,
    pub diskstats_path: PathBuf,

    /// Record reads/writes made through `ExecContext::open` in counter mode
    pub intercept_io: bool,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            io_syscalls: STRACE_IO_SYSCALLS.iter().map(|s| s.to_string()).collect(),
            attach_delay_ms: TRACER_ATTACH_DELAY.as_millis() as u64,
            capture_delay_ms: TRACER_CAPTURE_DELAY.as_millis() as u64,
            tracer_stop_timeout_ms: TRACER_STOP_TIMEOUT.as_millis() as u64,
            helper_ready_timeout_ms: HELPER_READY_TIMEOUT.as_millis() as u64,
            helper_poll_interval_ms: HELPER_POLL_INTERVAL.as_millis() as u64,
            helper_stop_timeout_ms: HELPER_STOP_TIMEOUT.as_millis() as u64,
            strace_path: PathBuf::from("strace"),
            fs_usage_path: PathBuf::from("fs_usage"),
            proc_io_path: PathBuf::from(PROC_SELF_IO),
            diskstats_path: PathBuf::from(PROC_DISKSTATS),
            intercept_io: false,
        }
    }
}

impl ProfilerConfig {
    pub fn attach_delay(&self) -> Duration {
        Duration::from_millis(self.attach_delay_ms)
    }

    pub fn capture_delay(&self) -> Duration {
        Duration::from_millis(self.capture_delay_ms)
    }

    pub fn tracer_stop_timeout(&self) -> Duration {
        Duration::from_millis(self.tracer_stop_timeout_ms)
    }

    pub fn helper_ready_timeout(&self) -> Duration {
        Duration::from_millis(self.helper_ready_timeout_ms)
    }

    pub fn helper_poll_interval(&self) -> Duration {
        Duration::from_millis(self.helper_poll_interval_ms.max(1))
    }

    pub fn helper_stop_timeout(&self) -> Duration {
        Duration::from_millis(self.helper_stop_timeout_ms)
    }

    /// Zero every settle delay. Used when the caller knows the trace source
    /// needs no attach time (tests, offline replay).
    pub fn without_delays(mut self) -> Self {
        self.attach_delay_ms = 0;
        self.capture_delay_ms = 0;
        self
    }
}

/// Load a profiler configuration from a TOML file
///
/// # Errors
/// * `ConfigError::Read` - If file cannot be read
/// * `ConfigError::Parse` - If TOML is invalid
/// * `ConfigError::Invalid` - If the syscall allow-list is empty
///
/// # Example
/// ```ignore
/// let config = load_config("iops.toml")?;
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<ProfilerConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: ProfilerConfig = toml::from_str(&contents)?;

    if config.io_syscalls.is_empty() {
        return Err(ConfigError::Invalid(
            "io_syscalls must name at least one syscall".to_string(),
        ));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_allow_list() {
        let config = ProfilerConfig::default();
        assert_eq!(config.io_syscalls.len(), 10);
        assert!(config.io_syscalls.iter().any(|s| s == "pwritev2"));
        assert_eq!(config.attach_delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_load_partial_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "io_syscalls = [\"read\", \"write\", \"sendfile\"]").unwrap();
        writeln!(file, "attach_delay_ms = 100").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.io_syscalls, vec!["read", "write", "sendfile"]);
        assert_eq!(config.attach_delay_ms, 100);
        assert_eq!(config.capture_delay_ms, 500);
    }

    #[test]
    fn test_load_rejects_empty_allow_list() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "io_syscalls = []").unwrap();
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            load_config("/nonexistent/iops.toml"),
            Err(ConfigError::Read { .. })
        ));
    }
}
