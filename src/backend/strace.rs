//! Syscall-trace backend: attaches `strace` to this process.
//!
//! Lifecycle:
//! 1. allow our own descendants to ptrace us (Yama `ptrace_scope=1`)
//! 2. spawn `strace -f -ttt -e trace=<syscalls> -o <capture> -p <pid>`
//! 3. wait for attach, run the code, wait for trailing events
//! 4. stop strace and parse the capture

use super::executor::{run_timed, ExecContext, Executor};
use super::process::ChildGuard;
use super::selector::BackendKind;
use super::Backend;
use crate::aggregator::{MeasurementResult, MeasurementScope};
use crate::parser::{parse_trace_lines, ParsedTrace, StraceParser};
use crate::utils::config::ProfilerConfig;
use crate::utils::error::BackendError;
use log::{debug, info, warn};
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use tempfile::NamedTempFile;

pub const STRACE_METHOD: &str = "strace (per-process)";

/// Diagnostic strace prints when ptrace is refused
const ATTACH_DENIED_SIGNATURE: &str = "Operation not permitted";

/// strace-based per-process backend
#[derive(Debug, Clone)]
pub struct StraceBackend {
    config: ProfilerConfig,
}

impl StraceBackend {
    pub fn new(config: ProfilerConfig) -> Self {
        Self { config }
    }

    fn tracer_name(&self) -> String {
        self.config.strace_path.display().to_string()
    }

    /// **Private** - spawn strace attached to `pid`, writing to `capture`
    fn spawn_tracer(&self, pid: u32, capture: &Path, stderr: File) -> Result<ChildGuard, BackendError> {
        let filter = format!("trace={}", self.config.io_syscalls.join(","));

        debug!(
            "Spawning {} -f -ttt -e {} -o {} -p {}",
            self.tracer_name(),
            filter,
            capture.display(),
            pid
        );

        let child = Command::new(&self.config.strace_path)
            .arg("-f")
            .arg("-ttt")
            .arg("-e")
            .arg(&filter)
            .arg("-o")
            .arg(capture)
            .arg("-p")
            .arg(pid.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr))
            .spawn()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => BackendError::TracerNotFound(self.tracer_name()),
                _ => BackendError::HelperFailed {
                    tool: self.tracer_name(),
                    detail: e.to_string(),
                },
            })?;

        Ok(ChildGuard::new(
            child,
            "strace",
            self.config.tracer_stop_timeout(),
        ))
    }

    /// **Private** - fail if strace already exited during attach
    fn check_attached(&self, tracer: &mut ChildGuard, stderr_path: &Path) -> Result<(), BackendError> {
        let Some(status) = tracer.try_wait()? else {
            return Ok(());
        };

        let diagnostics = fs::read_to_string(stderr_path).unwrap_or_default();
        let detail = match diagnostics.trim() {
            "" => format!("exited with {}", status),
            text => text.to_string(),
        };

        if diagnostics.contains(ATTACH_DENIED_SIGNATURE) {
            Err(BackendError::AttachDenied {
                tool: self.tracer_name(),
                detail,
            })
        } else {
            Err(BackendError::HelperFailed {
                tool: self.tracer_name(),
                detail,
            })
        }
    }

    /// **Private** - parse the capture; a lost capture yields zero counts
    fn collect(&self, capture: &Path, detail: bool) -> ParsedTrace {
        let parser = StraceParser::with_syscalls(&self.config.io_syscalls);
        let parsed = File::open(capture)
            .and_then(|file| parse_trace_lines(BufReader::new(file), &parser, detail));

        match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Could not read strace capture {}: {}", capture.display(), e);
                ParsedTrace {
                    operations: detail.then(Vec::new),
                    ..ParsedTrace::default()
                }
            }
        }
    }
}

impl Backend for StraceBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Strace
    }

    fn supports_detail(&self) -> bool {
        true
    }

    fn measure(
        &self,
        executor: &mut dyn Executor,
        code: &str,
        detail: bool,
    ) -> Result<MeasurementResult, BackendError> {
        let capture = tempfile::Builder::new()
            .prefix("iops-strace-")
            .suffix(".txt")
            .tempfile()?;
        let stderr = NamedTempFile::new()?;
        let stderr_file = stderr.reopen()?;

        let _ptracer = PtracerGrant::allow_descendants();
        let mut tracer = self.spawn_tracer(std::process::id(), capture.path(), stderr_file)?;

        thread::sleep(self.config.attach_delay());
        self.check_attached(&mut tracer, stderr.path())?;
        info!("strace attached to pid {}", std::process::id());

        let elapsed = run_timed(executor, code, &ExecContext::untracked())?;

        thread::sleep(self.config.capture_delay());
        if let Err(e) = tracer.terminate() {
            warn!("Failed to stop strace cleanly: {}", e);
        }

        let parsed = self.collect(capture.path(), detail);
        info!(
            "strace captured {} I/O calls in {:.4}s",
            parsed.summary.total_ops(),
            elapsed
        );

        Ok(MeasurementResult::from_summary(
            parsed.summary,
            elapsed,
            STRACE_METHOD,
            MeasurementScope::PerProcess,
        )
        .with_operations(parsed.operations))
    }
}

/// Registers this process as traceable by its own descendants for as
/// long as the grant lives
///
/// Passing our own pid to `PR_SET_PTRACER` lets the strace we spawn attach
/// without opening ptrace to unrelated processes.
struct PtracerGrant {
    #[cfg_attr(not(target_os = "linux"), allow(dead_code))]
    active: bool,
}

impl PtracerGrant {
    #[cfg(target_os = "linux")]
    fn allow_descendants() -> Self {
        let pid = std::process::id() as libc::c_ulong;
        // SAFETY: PR_SET_PTRACER only reads its integer argument
        let rc = unsafe { libc::prctl(libc::PR_SET_PTRACER, pid, 0, 0, 0) };
        if rc != 0 {
            // EINVAL without Yama: nothing to grant
            debug!("PR_SET_PTRACER failed: {}", io::Error::last_os_error());
        }
        Self { active: rc == 0 }
    }

    #[cfg(not(target_os = "linux"))]
    fn allow_descendants() -> Self {
        Self { active: false }
    }
}

impl Drop for PtracerGrant {
    fn drop(&mut self) {
        #[cfg(target_os = "linux")]
        if self.active {
            // SAFETY: resetting the ptracer to none takes no pointers
            unsafe {
                libc::prctl(libc::PR_SET_PTRACER, 0 as libc::c_ulong, 0, 0, 0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_missing_tracer_is_recoverable() {
        let mut config = ProfilerConfig::default().without_delays();
        config.strace_path = PathBuf::from("/nonexistent/bin/strace");
        let backend = StraceBackend::new(config);

        let mut ran = false;
        let mut exec = |_: &str, _: &ExecContext<'_>| -> Result<(), crate::utils::BoxError> {
            ran = true;
            Ok(())
        };
        let err = backend.measure(&mut exec, "", false).unwrap_err();
        assert!(matches!(err, BackendError::TracerNotFound(_)));
        assert!(err.is_recoverable());
        assert!(!ran);
    }

    #[test]
    fn test_collect_missing_capture_yields_zeros() {
        let backend = StraceBackend::new(ProfilerConfig::default());
        let parsed = backend.collect(Path::new("/nonexistent/capture.txt"), true);
        assert_eq!(parsed.summary.total_ops(), 0);
        assert_eq!(parsed.operations, Some(Vec::new()));
    }
}
