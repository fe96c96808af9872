//! Run command implementation.
//!
//! The run command:
//! 1. Loads configuration
//! 2. Picks the backend chain for this platform (or a forced backend)
//! 3. Executes the code under measurement
//! 4. Displays the table and, with `--histogram`, the charts
//! 5. Optionally saves the result as JSON

use crate::aggregator::MeasurementResult;
use crate::backend::{Executor, Profiler, ShellExecutor};
use crate::commands::models::RunArgs;
use crate::output::display::stdout_renderer;
use crate::output::{display_result, write_result, NoticeSink, Renderer, SavedResult, StderrNotices};
use crate::utils::config::{load_config, ProfilerConfig};
use anyhow::{bail, Context, Result};
use log::info;
use std::path::Path;

/// Execute the run command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Empty code
/// * Config file errors
/// * Profiling failures, including the code's own failure
/// * Output write errors
pub fn execute_run(args: RunArgs) -> Result<()> {
    validate_run_args(&args)?;
    let config = run_config(args.config.as_deref())?;

    let profiler = match args.backend {
        Some(kind) => Profiler::with_backend(kind, &config),
        None => Profiler::new(&config),
    };
    info!("Backend chain: {:?}", profiler.backends());

    let mut executor = ShellExecutor::new();
    let mut notices = StderrNotices;
    let mut renderer = stdout_renderer(args.display, &args.output_dir);

    profile_and_display(
        &args,
        &profiler,
        &mut executor,
        &mut notices,
        renderer.as_mut(),
    )?;
    Ok(())
}

/// Reject runs with nothing to profile
pub fn validate_run_args(args: &RunArgs) -> Result<()> {
    if args.code.trim().is_empty() {
        bail!(
            "No code provided to profile.\n   Usage: iops-profiler run [--histogram] -- <code>"
        );
    }
    Ok(())
}

/// Load the config file, or defaults when none was given
pub fn run_config(path: Option<&Path>) -> Result<ProfilerConfig> {
    match path {
        Some(path) => {
            load_config(path).with_context(|| format!("Failed to load config {}", path.display()))
        }
        None => Ok(ProfilerConfig::default()),
    }
}

/// Profile, display and optionally save one run
///
/// **Public** - the run pipeline with every collaborator injected
///
/// When profiling fails the user is told the code was not measured and
/// the error is returned; nothing is displayed.
pub fn profile_and_display(
    args: &RunArgs,
    profiler: &Profiler,
    executor: &mut dyn Executor,
    notices: &mut dyn NoticeSink,
    renderer: &mut dyn Renderer,
) -> Result<MeasurementResult> {
    let result = match profiler.profile(executor, &args.code, args.histogram, notices) {
        Ok(result) => result,
        Err(e) => {
            notices.notice(&format!("❌ Error during IOPS profiling: {}", e));
            notices.notice(
                "Your code was not measured. Please fix the profiling issue and try again.",
            );
            return Err(anyhow::Error::new(e).context("Profiling failed"));
        }
    };

    display_result(&result, renderer, notices).context("Failed to display result")?;

    if let Some(json_path) = &args.json {
        let saved = SavedResult::new(result.clone(), Some(args.code.clone()));
        write_result(&saved, json_path).context("Failed to write result JSON")?;
        info!("✓ Result written to: {}", json_path.display());
    }

    Ok(result)
}
