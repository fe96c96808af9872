//! Platform-conditioned backend selection with graceful degradation.
//!
//! Each platform gets an ordered chain of backends. The chain tries them
//! in order; a recoverable failure emits a notice naming the fallback and
//! moves on, anything else ends the run.

use super::counters::{process_source, system_source, CounterBackend};
use super::executor::Executor;
use super::fs_usage::FsUsageBackend;
use super::strace::StraceBackend;
use super::Backend;
use crate::aggregator::MeasurementResult;
use crate::output::notice::NoticeSink;
use crate::utils::config::ProfilerConfig;
use crate::utils::error::BackendError;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Available measurement strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// strace attached to this process (Linux)
    Strace,
    /// fs_usage through a privileged helper (macOS)
    FsUsage,
    /// Per-process I/O counters
    ProcessCounters,
    /// System-wide disk counters, includes other processes
    SystemWide,
}

impl BackendKind {
    /// Name used in fallback notices
    pub fn label(&self) -> &'static str {
        match self {
            Self::Strace => "strace",
            Self::FsUsage => "fs_usage",
            Self::ProcessCounters => "per-process counter",
            Self::SystemWide => "system-wide",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Preferred backends for an OS family, best first
///
/// `os` is a `std::env::consts::OS` value. Unknown platforms only get the
/// system-wide fallback.
pub fn platform_chain(os: &str) -> Vec<BackendKind> {
    match os {
        "linux" | "android" => vec![
            BackendKind::Strace,
            BackendKind::ProcessCounters,
            BackendKind::SystemWide,
        ],
        "macos" => vec![BackendKind::FsUsage, BackendKind::SystemWide],
        "windows" => vec![BackendKind::ProcessCounters, BackendKind::SystemWide],
        _ => vec![BackendKind::SystemWide],
    }
}

fn is_supported_platform(os: &str) -> bool {
    matches!(os, "linux" | "android" | "macos" | "windows")
}

/// Instantiate one backend from the configuration
pub fn build_backend(kind: BackendKind, config: &ProfilerConfig) -> Box<dyn Backend> {
    match kind {
        BackendKind::Strace => Box::new(StraceBackend::new(config.clone())),
        BackendKind::FsUsage => Box::new(FsUsageBackend::new(config.clone())),
        BackendKind::ProcessCounters => Box::new(CounterBackend::process(
            process_source(&config.proc_io_path),
            config.intercept_io,
        )),
        BackendKind::SystemWide => Box::new(CounterBackend::system_wide(system_source(
            &config.diskstats_path,
        ))),
    }
}

/// Ordered list of backends tried in sequence
pub struct FallbackChain {
    backends: Vec<Box<dyn Backend>>,
}

impl FallbackChain {
    pub fn new(backends: Vec<Box<dyn Backend>>) -> Self {
        Self { backends }
    }

    pub fn from_kinds(kinds: &[BackendKind], config: &ProfilerConfig) -> Self {
        Self::new(kinds.iter().map(|&k| build_backend(k, config)).collect())
    }

    pub fn kinds(&self) -> Vec<BackendKind> {
        self.backends.iter().map(|b| b.kind()).collect()
    }

    /// Measure with the first backend that works
    ///
    /// **Public** - main entry point for a profiling run
    ///
    /// # Arguments
    /// * `executor` - Runs the user code
    /// * `code` - Code to execute
    /// * `detail` - Request per-operation events
    /// * `notices` - Receives fallback and prompt notices
    ///
    /// # Errors
    /// The last backend's recoverable error, or any unrecoverable error
    /// (including the user code's own failure) as soon as it happens.
    pub fn measure(
        &self,
        executor: &mut dyn Executor,
        code: &str,
        detail: bool,
        notices: &mut dyn NoticeSink,
    ) -> Result<MeasurementResult, BackendError> {
        let mut remaining = self.backends.iter().peekable();

        while let Some(backend) = remaining.next() {
            if detail && !backend.supports_detail() {
                debug!("{} cannot record individual operations", backend.kind());
            }
            if let Some(prompt) = backend.prompt() {
                notices.notice(prompt);
            }

            let err = match backend.measure(executor, code, detail) {
                Ok(result) => {
                    info!("Measured with {} ({})", backend.kind(), result.method);
                    if detail && result.operations.is_none() {
                        notices.notice(&format!(
                            "⚠️ Histograms not available for {} measurement mode.",
                            backend.kind()
                        ));
                    }
                    return Ok(result);
                }
                Err(err) => err,
            };

            let next = match remaining.peek() {
                Some(next) if err.is_recoverable() => next.kind(),
                _ => return Err(err),
            };

            warn!("{} backend failed ({:?}): {}", backend.kind(), err.category(), err);
            notices.notice(&fallback_notice(backend.kind(), next, &err));
        }

        Err(BackendError::Unsupported(
            "no measurement backend".to_string(),
        ))
    }
}

/// **Private** - explanation shown before switching backends
fn fallback_notice(failed: BackendKind, next: BackendKind, err: &BackendError) -> String {
    match err {
        BackendError::ResourceBusy(_) => format!(
            "⚠️ ktrace is busy. Falling back to {} measurement.\n\
             Tip: Try running 'sudo killall fs_usage' and retry.",
            next
        ),
        _ => format!(
            "⚠️ Could not use {}: {}\nFalling back to {} measurement.",
            failed, err, next
        ),
    }
}

/// Backend selection for one configuration
pub struct Profiler {
    chain: FallbackChain,
    platform_notice: Option<String>,
}

impl Profiler {
    /// Chain for the platform this binary runs on
    pub fn new(config: &ProfilerConfig) -> Self {
        Self::for_platform(std::env::consts::OS, config)
    }

    pub fn for_platform(os: &str, config: &ProfilerConfig) -> Self {
        let platform_notice = (!is_supported_platform(os)).then(|| {
            format!(
                "⚠️ Platform '{}' not fully supported.\n\
                 Attempting system-wide measurement as fallback.",
                os
            )
        });
        Self {
            chain: FallbackChain::from_kinds(&platform_chain(os), config),
            platform_notice,
        }
    }

    /// Use exactly one backend, no fallback
    pub fn with_backend(kind: BackendKind, config: &ProfilerConfig) -> Self {
        Self {
            chain: FallbackChain::from_kinds(&[kind], config),
            platform_notice: None,
        }
    }

    pub fn from_chain(chain: FallbackChain) -> Self {
        Self {
            chain,
            platform_notice: None,
        }
    }

    pub fn backends(&self) -> Vec<BackendKind> {
        self.chain.kinds()
    }

    /// Profile `code`, emitting notices as the run progresses
    ///
    /// # Errors
    /// See [`FallbackChain::measure`]
    pub fn profile(
        &self,
        executor: &mut dyn Executor,
        code: &str,
        detail: bool,
        notices: &mut dyn NoticeSink,
    ) -> Result<MeasurementResult, BackendError> {
        if let Some(notice) = &self.platform_notice {
            notices.notice(notice);
        }
        self.chain.measure(executor, code, detail, notices)
    }
}
