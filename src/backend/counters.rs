//! Counter-based backends: per-process `/proc/self/io` and the
//! system-wide `/proc/diskstats` fallback.
//!
//! Where procfs is missing (macOS, Windows) the same backends read
//! `sysinfo` process disk usage instead. Either way a cumulative snapshot
//! is taken before and after the user code and the difference reported.

use super::executor::{run_timed, ExecContext, Executor};
use super::intercept::IoTracker;
use super::selector::BackendKind;
use super::Backend;
use crate::aggregator::{IoCounters, MeasurementResult, MeasurementScope};
use crate::utils::config::{DISKSTATS_SECTOR_SIZE, PROC_DISKSTATS, PROC_SELF_IO};
use crate::utils::error::BackendError;
use log::{debug, info};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

pub const PROCESS_METHOD: &str = "proc-io (per-process)";
pub const SYSTEM_WIDE_METHOD: &str = "⚠️ SYSTEM-WIDE (includes all processes)";
pub const SYSINFO_PROCESS_METHOD: &str = "sysinfo disk usage (per-process, bytes only)";

/// A cumulative I/O counter snapshot provider
pub trait CounterSource {
    /// Read the current counters
    ///
    /// # Errors
    /// `BackendError::Unsupported` when the counter API is unavailable
    fn snapshot(&self) -> Result<IoCounters, BackendError>;

    /// Method label overriding the backend's default
    fn method_label(&self) -> Option<&'static str> {
        None
    }
}

impl CounterSource for Box<dyn CounterSource> {
    fn snapshot(&self) -> Result<IoCounters, BackendError> {
        (**self).snapshot()
    }

    fn method_label(&self) -> Option<&'static str> {
        (**self).method_label()
    }
}

/// `/proc/<pid>/io` at `path` when it exists, else `sysinfo`
pub fn process_source(path: &Path) -> Box<dyn CounterSource> {
    if path.exists() {
        Box::new(ProcSelfIo::new(path))
    } else {
        debug!("{} not found, using sysinfo process counters", path.display());
        Box::new(SysinfoProcess::current())
    }
}

/// `/proc/diskstats` at `path` when it exists, else `sysinfo`
pub fn system_source(path: &Path) -> Box<dyn CounterSource> {
    if path.exists() {
        Box::new(DiskStats::new(path))
    } else {
        debug!("{} not found, using sysinfo system counters", path.display());
        Box::new(SysinfoSystem)
    }
}

/// **Private** - read a procfs file, mapping "not there" to unsupported
fn read_counter_file(path: &Path) -> Result<String, BackendError> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
            BackendError::Unsupported(path.display().to_string())
        }
        _ => BackendError::Io(e),
    })
}

/// Per-process counters from `/proc/self/io`
///
/// Counts are syscall counts (`syscr`/`syscw`), bytes are storage-level
/// (`read_bytes`/`write_bytes`) so page-cache hits do not count as reads.
#[derive(Debug, Clone)]
pub struct ProcSelfIo {
    path: PathBuf,
}

impl Default for ProcSelfIo {
    fn default() -> Self {
        Self::new(PROC_SELF_IO)
    }
}

impl ProcSelfIo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CounterSource for ProcSelfIo {
    fn snapshot(&self) -> Result<IoCounters, BackendError> {
        let contents = read_counter_file(&self.path)?;
        parse_proc_io(&contents).ok_or_else(|| {
            BackendError::Unsupported(format!("{} (unexpected format)", self.path.display()))
        })
    }
}

/// Parse `key: value` lines of a `/proc/<pid>/io` file
pub fn parse_proc_io(contents: &str) -> Option<IoCounters> {
    let fields: HashMap<&str, u64> = contents
        .lines()
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            Some((key.trim(), value.trim().parse().ok()?))
        })
        .collect();

    Some(IoCounters {
        read_count: *fields.get("syscr")?,
        write_count: *fields.get("syscw")?,
        read_bytes: *fields.get("read_bytes")?,
        write_bytes: *fields.get("write_bytes")?,
    })
}

/// System-wide block device counters from `/proc/diskstats`
#[derive(Debug, Clone)]
pub struct DiskStats {
    path: PathBuf,
}

impl Default for DiskStats {
    fn default() -> Self {
        Self::new(PROC_DISKSTATS)
    }
}

impl DiskStats {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CounterSource for DiskStats {
    fn snapshot(&self) -> Result<IoCounters, BackendError> {
        let contents = read_counter_file(&self.path)?;
        Ok(parse_diskstats(&contents))
    }
}

/// Sum completed I/Os and sectors over whole physical disks
///
/// Virtual devices (loop, ram, zram, device-mapper) and partitions are
/// skipped so nothing is counted twice.
pub fn parse_diskstats(contents: &str) -> IoCounters {
    let mut total = IoCounters::default();

    for line in contents.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 10 {
            continue;
        }
        let name = parts[2];
        if is_virtual_device(name) || is_partition(name) {
            continue;
        }

        let field = |i: usize| parts[i].parse::<u64>().unwrap_or(0);
        total.read_count += field(3);
        total.read_bytes += field(5) * DISKSTATS_SECTOR_SIZE;
        total.write_count += field(7);
        total.write_bytes += field(9) * DISKSTATS_SECTOR_SIZE;
    }

    total
}

fn is_virtual_device(name: &str) -> bool {
    ["loop", "ram", "zram", "dm-", "md", "sr"]
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

/// **Private** - `sda1`, `vdb2`, `nvme0n1p1`, `mmcblk0p2` are partitions
fn is_partition(name: &str) -> bool {
    if name.starts_with("nvme") || name.starts_with("mmcblk") {
        return match name.rfind('p') {
            Some(idx) => {
                let suffix = &name[idx + 1..];
                idx > 0
                    && name.as_bytes()[idx - 1].is_ascii_digit()
                    && !suffix.is_empty()
                    && suffix.bytes().all(|b| b.is_ascii_digit())
            }
            None => false,
        };
    }
    name.bytes().last().is_some_and(|b| b.is_ascii_digit())
}

/// **Private** - fresh process table with only disk usage refreshed
fn refreshed_processes(which: ProcessesToUpdate<'_>) -> Result<System, BackendError> {
    if !sysinfo::IS_SUPPORTED_SYSTEM {
        return Err(BackendError::Unsupported(
            "sysinfo process counters on this OS".to_string(),
        ));
    }
    let mut system = System::new();
    system.refresh_processes_specifics(
        which,
        true,
        ProcessRefreshKind::nothing().with_disk_usage(),
    );
    Ok(system)
}

/// Per-process byte counters from `sysinfo`
///
/// The OS only reports bytes here, so read/write counts stay zero.
#[derive(Debug, Clone, Copy)]
pub struct SysinfoProcess {
    pid: Pid,
}

impl SysinfoProcess {
    pub fn current() -> Self {
        Self::for_pid(std::process::id())
    }

    pub fn for_pid(pid: u32) -> Self {
        Self {
            pid: Pid::from_u32(pid),
        }
    }
}

impl CounterSource for SysinfoProcess {
    fn snapshot(&self) -> Result<IoCounters, BackendError> {
        let system = refreshed_processes(ProcessesToUpdate::Some(&[self.pid]))?;
        let process = system.process(self.pid).ok_or_else(|| {
            BackendError::Unsupported(format!("sysinfo disk usage for pid {}", self.pid))
        })?;

        let usage = process.disk_usage();
        Ok(IoCounters {
            read_bytes: usage.total_read_bytes,
            write_bytes: usage.total_written_bytes,
            ..IoCounters::default()
        })
    }

    fn method_label(&self) -> Option<&'static str> {
        Some(SYSINFO_PROCESS_METHOD)
    }
}

/// Disk usage summed over every visible process, from `sysinfo`
///
/// Processes that exit between snapshots drop out of the sum, so deltas
/// can undercount; `IoCounters::delta` floors each field at zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct SysinfoSystem;

impl CounterSource for SysinfoSystem {
    fn snapshot(&self) -> Result<IoCounters, BackendError> {
        let system = refreshed_processes(ProcessesToUpdate::All)?;
        let total = system
            .processes()
            .values()
            .map(|process| process.disk_usage())
            .fold(IoCounters::default(), |mut acc, usage| {
                acc.read_bytes = acc.read_bytes.saturating_add(usage.total_read_bytes);
                acc.write_bytes = acc.write_bytes.saturating_add(usage.total_written_bytes);
                acc
            });
        debug!("sysinfo summed {} processes", system.processes().len());
        Ok(total)
    }
}

/// Counter-difference backend, per-process or system-wide
pub struct CounterBackend {
    kind: BackendKind,
    source: Box<dyn CounterSource>,
    intercept_io: bool,
}

impl CounterBackend {
    /// Per-process counters
    pub fn process(source: impl CounterSource + 'static, intercept_io: bool) -> Self {
        Self {
            kind: BackendKind::ProcessCounters,
            source: Box::new(source),
            intercept_io,
        }
    }

    /// System-wide counters; results are marked degraded
    pub fn system_wide(source: impl CounterSource + 'static) -> Self {
        Self {
            kind: BackendKind::SystemWide,
            source: Box::new(source),
            intercept_io: false,
        }
    }

    fn method(&self) -> &'static str {
        match (self.kind, self.source.method_label()) {
            (BackendKind::SystemWide, _) => SYSTEM_WIDE_METHOD,
            (_, Some(label)) => label,
            _ => PROCESS_METHOD,
        }
    }

    fn scope(&self) -> MeasurementScope {
        match self.kind {
            BackendKind::SystemWide => MeasurementScope::SystemWide,
            _ => MeasurementScope::PerProcess,
        }
    }
}

impl Backend for CounterBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn supports_detail(&self) -> bool {
        self.intercept_io
    }

    fn measure(
        &self,
        executor: &mut dyn Executor,
        code: &str,
        detail: bool,
    ) -> Result<MeasurementResult, BackendError> {
        let before = self.source.snapshot()?;

        // Only executors that open files through the context can be tracked
        let intercept = self.intercept_io && executor.uses_context();
        if self.intercept_io && !intercept {
            debug!("Executor does not route I/O through its context, nothing to intercept");
        }

        let tracker = IoTracker::new();
        let ctx = if intercept {
            ExecContext::tracked(&tracker)
        } else {
            ExecContext::untracked()
        };
        let elapsed = run_timed(executor, code, &ctx)?;

        // The code already ran: a failure here must not trigger a fallback
        let after = self.source.snapshot().map_err(|e| match e {
            BackendError::Io(io) => BackendError::Io(io),
            other => BackendError::Io(io::Error::other(other.to_string())),
        })?;

        let summary = before.delta(&after);
        debug!("{} counter delta: {:?}", self.kind, summary);

        let operations = (detail && intercept).then(|| tracker.into_events());
        if let Some(ops) = &operations {
            info!("Intercepted {} operations through the execution context", ops.len());
        }

        Ok(
            MeasurementResult::from_summary(summary, elapsed, self.method(), self.scope())
                .with_operations(operations),
        )
    }
}
