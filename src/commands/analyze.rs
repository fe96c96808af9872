//! Analyze command implementation.
//!
//! Re-parses a capture file written earlier by strace or fs_usage and
//! presents it exactly like a live run.

use crate::aggregator::{MeasurementResult, MeasurementScope};
use crate::binning::{format_duration, parse_timestamp};
use crate::commands::models::AnalyzeArgs;
use crate::commands::run::run_config;
use crate::output::display::stdout_renderer;
use crate::output::{display_result, write_result, NoticeSink, Renderer, SavedResult, StderrNotices};
use crate::parser::{
    parse_trace_lines, FsUsageParser, IoEvent, ParsedTrace, StraceParser, TraceFormat,
};
use crate::utils::config::ProfilerConfig;
use anyhow::{bail, Context, Result};
use log::{debug, info, warn};
use std::fs::File;
use std::io::BufReader;

/// Execute the analyze command
///
/// **Public** - main entry point called from main.rs
pub fn execute_analyze(args: AnalyzeArgs) -> Result<()> {
    let config = run_config(args.config.as_deref())?;
    let mut notices = StderrNotices;
    let mut renderer = stdout_renderer(args.display, &args.output_dir);

    analyze_capture(&args, &config, &mut notices, renderer.as_mut())?;
    Ok(())
}

/// Parse, display and optionally save one capture file
///
/// # Errors
/// * Capture file missing or unreadable
/// * Negative or non-finite `--elapsed`
/// * Output write errors
pub fn analyze_capture(
    args: &AnalyzeArgs,
    config: &ProfilerConfig,
    notices: &mut dyn NoticeSink,
    renderer: &mut dyn Renderer,
) -> Result<MeasurementResult> {
    if let Some(elapsed) = args.elapsed {
        if !elapsed.is_finite() || elapsed < 0.0 {
            bail!("Elapsed time must be a non-negative number of seconds, got {}", elapsed);
        }
    }

    info!("Analyzing capture: {}", args.input.display());
    let parsed = parse_capture(args, config)?;
    debug!(
        "Accepted {} of {} lines",
        parsed.accepted_lines, parsed.total_lines
    );
    if parsed.accepted_lines == 0 {
        warn!("No I/O operations found in {}", args.input.display());
    }

    // Events are always kept so the run time can be inferred
    let operations = parsed.operations.unwrap_or_default();
    let elapsed = args
        .elapsed
        .unwrap_or_else(|| timestamp_span(&operations));
    info!("Run time: {}", format_duration(elapsed));

    let result = MeasurementResult::from_summary(
        parsed.summary,
        elapsed,
        offline_method(args.format),
        MeasurementScope::PerProcess,
    )
    .with_operations(args.histogram.then_some(operations));

    display_result(&result, renderer, notices).context("Failed to display result")?;

    if let Some(json_path) = &args.json {
        write_result(&SavedResult::new(result.clone(), None), json_path)
            .context("Failed to write result JSON")?;
        info!("✓ Result written to: {}", json_path.display());
    }

    Ok(result)
}

/// **Private** - read the capture through the parser for its format
fn parse_capture(args: &AnalyzeArgs, config: &ProfilerConfig) -> Result<ParsedTrace> {
    let file = File::open(&args.input)
        .with_context(|| format!("Failed to open capture {}", args.input.display()))?;
    let reader = BufReader::new(file);

    let parsed = match args.format {
        TraceFormat::Strace => {
            let parser = StraceParser::with_syscalls(config.io_syscalls.clone());
            parse_trace_lines(reader, &parser, true)
        }
        TraceFormat::FsUsage => parse_trace_lines(reader, &FsUsageParser, true),
    };
    parsed.with_context(|| format!("Failed to read capture {}", args.input.display()))
}

/// Seconds between the first and last parseable timestamps, or 0
pub fn timestamp_span(events: &[IoEvent]) -> f64 {
    let mut times = events
        .iter()
        .filter_map(|e| e.timestamp.as_deref().and_then(parse_timestamp));

    let Some(first) = times.next() else {
        return 0.0;
    };
    let (lo, hi) = times.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t)));
    hi - lo
}

fn offline_method(format: TraceFormat) -> &'static str {
    match format {
        TraceFormat::Strace => "strace capture (offline)",
        TraceFormat::FsUsage => "fs_usage capture (offline)",
    }
}
