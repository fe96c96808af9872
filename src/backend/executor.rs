//! The "run this code" capability handed to every backend.

use super::intercept::{IoTracker, TrackedFile};
use crate::utils::error::{BackendError, BoxError};
use log::debug;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

/// Per-call context passed to an executor
///
/// Files opened through it are tracked when the backend enabled
/// interception for this call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecContext<'a> {
    tracker: Option<&'a IoTracker>,
}

impl<'a> ExecContext<'a> {
    pub fn untracked() -> Self {
        Self { tracker: None }
    }

    pub fn tracked(tracker: &'a IoTracker) -> Self {
        Self {
            tracker: Some(tracker),
        }
    }

    /// Open a file whose reads and writes count toward this call
    pub fn open(&self, path: impl AsRef<Path>, options: &OpenOptions) -> io::Result<TrackedFile<'a>> {
        let file = options.open(path)?;
        Ok(TrackedFile::new(file, self.tracker))
    }
}

/// Runs a block of user code synchronously
pub trait Executor {
    /// Execute `code` to completion
    ///
    /// # Errors
    /// Whatever the code itself failed with; it is never swallowed.
    fn execute(&mut self, code: &str, ctx: &ExecContext<'_>) -> Result<(), BoxError>;

    /// Whether the code does its file I/O through [`ExecContext::open`]
    ///
    /// Interception records nothing for executors that return false.
    fn uses_context(&self) -> bool {
        true
    }
}

impl<F> Executor for F
where
    F: FnMut(&str, &ExecContext<'_>) -> Result<(), BoxError>,
{
    fn execute(&mut self, code: &str, ctx: &ExecContext<'_>) -> Result<(), BoxError> {
        self(code, ctx)
    }
}

/// Executes code with `sh -c` as a child of this process
///
/// Children are covered by `strace -f` and reaped children's I/O is
/// folded into this process's counters.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    shell: PathBuf,
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self {
            shell: PathBuf::from("sh"),
        }
    }
}

impl ShellExecutor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Executor for ShellExecutor {
    fn execute(&mut self, code: &str, _ctx: &ExecContext<'_>) -> Result<(), BoxError> {
        debug!("Executing with {}: {}", self.shell.display(), code);
        let status = Command::new(&self.shell).arg("-c").arg(code).status()?;
        if !status.success() {
            return Err(format!("command exited with {}", status).into());
        }
        Ok(())
    }

    /// The shell's children open files on their own
    fn uses_context(&self) -> bool {
        false
    }
}

/// Run the executor and time only the user code
///
/// # Errors
/// `BackendError::Execution` wrapping the code's own error
pub fn run_timed<E>(executor: &mut E, code: &str, ctx: &ExecContext<'_>) -> Result<f64, BackendError>
where
    E: Executor + ?Sized,
{
    let start = Instant::now();
    executor
        .execute(code, ctx)
        .map_err(BackendError::Execution)?;
    Ok(start.elapsed().as_secs_f64())
}
