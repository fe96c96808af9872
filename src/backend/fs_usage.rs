//! Privileged filesystem-event backend built on macOS `fs_usage`.
//!
//! `fs_usage` must run as root while the profiler stays unprivileged, so
//! a bash helper is started through `osascript ... with administrator
//! privileges` (one password prompt per run). The two sides talk through
//! sentinel files in a private temp directory:
//!
//! | file        | writer   | meaning                                  |
//! |-------------|----------|------------------------------------------|
//! | `control`   | profiler | `START` before launch, `STOP` after code |
//! | `ready`     | helper   | fs_usage is attached                     |
//! | `fs_usage.pid` | helper | pid of the root fs_usage, for cleanup   |
//!
//! Only one ktrace consumer may run system-wide; a second one fails with
//! "Resource busy", reported as `BackendError::ResourceBusy`.

use super::executor::{run_timed, ExecContext, Executor};
use super::process::ChildGuard;
use super::selector::BackendKind;
use super::Backend;
use crate::aggregator::{MeasurementResult, MeasurementScope};
use crate::parser::{parse_trace_lines, FsUsageParser, ParsedTrace};
use crate::utils::config::ProfilerConfig;
use crate::utils::error::BackendError;
use log::{debug, info, warn};
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

pub const FS_USAGE_METHOD: &str = "fs_usage (per-process)";

const BUSY_SIGNATURE: &str = "Resource busy";
const START: &str = "START";
const STOP: &str = "STOP";
const CLEANUP_TIMEOUT: Duration = Duration::from_secs(2);

/// Paths of one run's private sentinel files
#[derive(Debug)]
struct Session {
    dir: TempDir,
}

impl Session {
    fn create() -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("iops-fs-usage-").tempdir()?;
        Ok(Self { dir })
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn script(&self) -> PathBuf {
        self.path("helper.sh")
    }

    fn output(&self) -> PathBuf {
        self.path("output.txt")
    }

    fn errors(&self) -> PathBuf {
        self.path("output.err")
    }

    fn control(&self) -> PathBuf {
        self.path("control")
    }

    fn ready(&self) -> PathBuf {
        self.path("ready")
    }

    fn pid_file(&self) -> PathBuf {
        self.path("fs_usage.pid")
    }

    fn launcher_log(&self) -> PathBuf {
        self.path("osascript.err")
    }
}

/// fs_usage-based per-process backend
#[derive(Debug, Clone)]
pub struct FsUsageBackend {
    config: ProfilerConfig,
}

impl FsUsageBackend {
    pub fn new(config: ProfilerConfig) -> Self {
        Self { config }
    }

    /// **Private** - write the helper and pre-create files the helper writes
    ///
    /// Pre-creating keeps them owned by us, so the temp dir can always be
    /// removed even though root writes into them.
    fn prepare(&self, session: &Session, pid: u32) -> io::Result<()> {
        let script = helper_script(pid, &self.config.fs_usage_path, session);
        fs::write(session.script(), script)?;
        fs::write(session.control(), START)?;
        File::create(session.output())?;
        File::create(session.errors())?;
        Ok(())
    }

    /// **Private** - start the helper through an administrator prompt
    fn launch(&self, session: &Session) -> Result<ChildGuard, BackendError> {
        let applescript = format!(
            "do shell script \"bash \" & quoted form of \"{}\" with administrator privileges",
            session.script().display()
        );
        let log = File::create(session.launcher_log())?;

        let child = Command::new("osascript")
            .arg("-e")
            .arg(&applescript)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(log))
            .spawn()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => BackendError::TracerNotFound("osascript".to_string()),
                _ => BackendError::HelperFailed {
                    tool: "osascript".to_string(),
                    detail: e.to_string(),
                },
            })?;

        Ok(ChildGuard::new(
            child,
            "fs_usage helper",
            self.config.helper_stop_timeout(),
        ))
    }

    /// **Private** - poll for the ready sentinel with a bounded wait
    fn wait_ready(&self, session: &Session, helper: &mut ChildGuard) -> Result<(), BackendError> {
        let deadline = Instant::now() + self.config.helper_ready_timeout();

        loop {
            if session.ready().exists() {
                return Ok(());
            }
            if let Some(status) = helper.try_wait()? {
                return Err(self.startup_failure(session, &status.to_string()));
            }
            if Instant::now() >= deadline {
                return Err(BackendError::Timeout("fs_usage to start".to_string()));
            }
            thread::sleep(self.config.helper_poll_interval());
        }
    }

    /// **Private** - classify why the helper exited before signalling ready
    fn startup_failure(&self, session: &Session, status: &str) -> BackendError {
        let errors = fs::read_to_string(session.errors()).unwrap_or_default();
        let launcher = fs::read_to_string(session.launcher_log()).unwrap_or_default();

        if errors.contains(BUSY_SIGNATURE) || launcher.contains(BUSY_SIGNATURE) {
            return BackendError::ResourceBusy("ktrace".to_string());
        }

        let detail = [errors.trim(), launcher.trim()]
            .iter()
            .find(|text| !text.is_empty())
            .map(|text| text.to_string())
            .unwrap_or_else(|| format!("helper exited with {}", status));

        // osascript reports a cancelled password dialog as error -128
        if launcher.contains("-128") || launcher.contains("User canceled") {
            BackendError::AttachDenied {
                tool: "fs_usage".to_string(),
                detail,
            }
        } else {
            BackendError::HelperFailed {
                tool: "fs_usage".to_string(),
                detail,
            }
        }
    }

    /// **Private** - write STOP and give the helper time to exit
    fn stop(&self, session: &Session, helper: &mut ChildGuard) {
        if let Err(e) = fs::write(session.control(), STOP) {
            warn!("Could not signal fs_usage helper to stop: {}", e);
        }
        match helper.wait_timeout(self.config.helper_stop_timeout()) {
            Ok(Some(status)) => debug!("fs_usage helper exited with {}", status),
            Ok(None) => warn!("fs_usage helper did not exit after STOP"),
            Err(e) => warn!("Failed waiting for fs_usage helper: {}", e),
        }
    }

    fn collect(&self, session: &Session, detail: bool) -> ParsedTrace {
        let parsed = File::open(session.output())
            .and_then(|file| parse_trace_lines(BufReader::new(file), &FsUsageParser, detail));

        match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Could not read fs_usage capture: {}", e);
                ParsedTrace {
                    operations: detail.then(Vec::new),
                    ..ParsedTrace::default()
                }
            }
        }
    }
}

impl Backend for FsUsageBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::FsUsage
    }

    fn supports_detail(&self) -> bool {
        true
    }

    fn prompt(&self) -> Option<&'static str> {
        Some("⚠️  A password dialog will appear - please enter your password to enable I/O monitoring.")
    }

    fn measure(
        &self,
        executor: &mut dyn Executor,
        code: &str,
        detail: bool,
    ) -> Result<MeasurementResult, BackendError> {
        let session = Session::create()?;
        // Declared after the session so it runs before the temp dir is removed
        let _cleanup = TraceCleanup {
            control: session.control(),
            pid_file: session.pid_file(),
        };

        self.prepare(&session, std::process::id())?;
        let mut helper = self.launch(&session)?;
        self.wait_ready(&session, &mut helper)?;
        info!("fs_usage helper ready");

        let elapsed = run_timed(executor, code, &ExecContext::untracked())?;

        thread::sleep(self.config.capture_delay());
        self.stop(&session, &mut helper);
        drop(helper);

        let parsed = self.collect(&session, detail);
        info!(
            "fs_usage captured {} I/O events in {:.4}s",
            parsed.summary.total_ops(),
            elapsed
        );

        Ok(MeasurementResult::from_summary(
            parsed.summary,
            elapsed,
            FS_USAGE_METHOD,
            MeasurementScope::PerProcess,
        )
        .with_operations(parsed.operations))
    }
}

/// Stops the helper and kills our root-owned fs_usage if it outlived it
///
/// Runs on every exit path. Best effort: `sudo -n` never prompts, and
/// every failure is ignored.
struct TraceCleanup {
    control: PathBuf,
    pid_file: PathBuf,
}

impl Drop for TraceCleanup {
    fn drop(&mut self) {
        let _ = fs::write(&self.control, STOP);

        let Some(pid) = fs::read_to_string(&self.pid_file)
            .ok()
            .and_then(|text| text.trim().parse::<u32>().ok())
        else {
            return;
        };

        let spawned = Command::new("sudo")
            .args(["-n", "kill", "-9", &pid.to_string()])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        if let Ok(child) = spawned {
            let mut guard = ChildGuard::new(child, "sudo kill", CLEANUP_TIMEOUT);
            if let Ok(None) = guard.wait_timeout(CLEANUP_TIMEOUT) {
                debug!("fs_usage cleanup did not finish in time");
            }
        }
    }
}

/// **Private** - bash helper run as root
///
/// It never kills fs_usage processes it did not start; an existing trace
/// session makes our fs_usage fail with "Resource busy" instead. The STOP
/// wait also ends when the profiler process disappears.
fn helper_script(pid: u32, fs_usage: &Path, session: &Session) -> String {
    format!(
        r#"#!/bin/bash
PID={pid}
FS_USAGE="{fs_usage}"
OUTPUT_FILE="{output}"
ERROR_FILE="{errors}"
CONTROL_FILE="{control}"
READY_FILE="{ready}"
PID_FILE="{pid_file}"

"$FS_USAGE" -w -f filesys "$PID" > "$OUTPUT_FILE" 2> "$ERROR_FILE" &
FS_USAGE_PID=$!
trap 'kill -9 "$FS_USAGE_PID" 2>/dev/null' EXIT

sleep 1
if ! kill -0 "$FS_USAGE_PID" 2>/dev/null; then
    exit 1
fi

echo "$FS_USAGE_PID" > "$PID_FILE"
echo ready > "$READY_FILE"

while [ "$(cat "$CONTROL_FILE" 2>/dev/null)" != "{stop}" ]; do
    if ! kill -0 "$FS_USAGE_PID" 2>/dev/null; then
        exit 1
    fi
    if ! kill -0 "$PID" 2>/dev/null; then
        break
    fi
    sleep 0.1
done

kill -TERM "$FS_USAGE_PID" 2>/dev/null
sleep 0.5
exit 0
"#,
        pid = pid,
        fs_usage = fs_usage.display(),
        output = session.output().display(),
        errors = session.errors().display(),
        control = session.control().display(),
        ready = session.ready().display(),
        pid_file = session.pid_file().display(),
        stop = STOP,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helper_script_wiring() {
        let session = Session::create().unwrap();
        let script = helper_script(4242, Path::new("/usr/bin/fs_usage"), &session);

        assert!(script.starts_with("#!/bin/bash\nPID=4242\n"));
        assert!(script.contains("FS_USAGE=\"/usr/bin/fs_usage\""));
        assert!(script.contains(&session.ready().display().to_string()));
        assert!(script.contains("!= \"STOP\""));
        // never touches other fs_usage sessions
        assert!(!script.contains("killall"));
    }

    #[test]
    fn test_busy_signature_classified() {
        let session = Session::create().unwrap();
        fs::write(session.errors(), "fs_usage: ktrace_start: Resource busy\n").unwrap();

        let backend = FsUsageBackend::new(ProfilerConfig::default());
        let err = backend.startup_failure(&session, "exit status: 1");
        assert!(matches!(err, BackendError::ResourceBusy(_)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_cancelled_prompt_is_attach_denied() {
        let session = Session::create().unwrap();
        fs::write(
            session.launcher_log(),
            "execution error: User canceled. (-128)\n",
        )
        .unwrap();

        let backend = FsUsageBackend::new(ProfilerConfig::default());
        let err = backend.startup_failure(&session, "exit status: 1");
        assert!(matches!(err, BackendError::AttachDenied { .. }));
    }

    #[test]
    fn test_collect_parses_output() {
        let session = Session::create().unwrap();
        fs::write(
            session.output(),
            "12:34:56.000001  write  F=3  B=0x800  /tmp/f  python.1\n\
             12:34:56.000002  read   F=3  B=0x400  /tmp/f  python.1\n\
             12:34:56.000003  open   F=3  /tmp/f  python.1\n",
        )
        .unwrap();

        let backend = FsUsageBackend::new(ProfilerConfig::default());
        let parsed = backend.collect(&session, true);
        assert_eq!(parsed.summary.write_bytes, 2048);
        assert_eq!(parsed.summary.read_bytes, 1024);
        assert_eq!(parsed.operations.map(|ops| ops.len()), Some(2));
    }
}
