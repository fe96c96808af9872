//! Measurement backends and the fallback chain that picks one.
//!
//! This module handles:
//! - Running user code through an injected `Executor`
//! - Attaching strace / fs_usage to this process and collecting their output
//! - Counter snapshots (`/proc/self/io`, `/proc/diskstats`, or `sysinfo`)
//! - Falling back between backends when one is unavailable

pub mod counters;
pub mod executor;
pub mod fs_usage;
pub mod intercept;
pub mod process;
pub mod selector;
pub mod strace;

// Re-export main types
pub use counters::{
    process_source, system_source, CounterBackend, CounterSource, DiskStats, ProcSelfIo,
    SysinfoProcess, SysinfoSystem,
};
pub use executor::{run_timed, ExecContext, Executor, ShellExecutor};
pub use fs_usage::FsUsageBackend;
pub use intercept::{IoTracker, TrackedFile};
pub use selector::{build_backend, platform_chain, BackendKind, FallbackChain, Profiler};
pub use strace::StraceBackend;

use crate::aggregator::MeasurementResult;
use crate::utils::error::BackendError;

/// One trace source's attach / run / collect / detach lifecycle
///
/// Implementations release everything they acquired on every exit path,
/// and only return a recoverable error before the user code started.
pub trait Backend {
    fn kind(&self) -> BackendKind;

    /// Whether the result can carry per-operation events
    fn supports_detail(&self) -> bool;

    /// Notice shown right before measuring (e.g. a password prompt)
    fn prompt(&self) -> Option<&'static str> {
        None
    }

    /// Run `code` under this trace source
    ///
    /// # Errors
    /// * Recoverable `BackendError`s when the source could not be attached
    /// * `BackendError::Execution` when the code itself failed
    fn measure(
        &self,
        executor: &mut dyn Executor,
        code: &str,
        detail: bool,
    ) -> Result<MeasurementResult, BackendError>;
}
