//! IOPS Profiler CLI
//!
//! Runs shell code under an I/O tracer (or counters) and reports
//! operations per second, with optional size histograms and heatmaps.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use iops_profiler::backend::BackendKind;
use iops_profiler::commands::{
    display_version, execute_analyze, execute_run, show_saved_result, validate_run_args,
    AnalyzeArgs, RunArgs,
};
use iops_profiler::output::DisplayMode;
use iops_profiler::parser::TraceFormat;

/// IOPS Profiler - I/O operations per second for a code snippet
#[derive(Parser, Debug)]
#[command(name = "iops-profiler")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Profile a code snippet
    Run {
        /// Collect per-operation events and draw size/time charts
        #[arg(long)]
        histogram: bool,

        /// Force a single backend instead of the platform fallback chain
        #[arg(short, long, value_enum)]
        backend: Option<BackendKind>,

        /// Output style; `auto` checks IOPS_PROFILER_DISPLAY and Jupyter
        #[arg(short, long, value_enum, default_value_t = DisplayMode::Auto)]
        display: DisplayMode,

        /// Directory for chart SVGs in plain-text mode
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// Save the result as JSON
        #[arg(long)]
        json: Option<PathBuf>,

        /// TOML configuration file
        #[arg(short, long, env = "IOPS_PROFILER_CONFIG")]
        config: Option<PathBuf>,

        /// Code to run with `sh -c`, after `--`
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        code: Vec<String>,
    },

    /// Analyze a capture file written by strace or fs_usage
    Analyze {
        /// Capture file
        #[arg(short, long)]
        input: PathBuf,

        /// Capture format
        #[arg(short, long, value_enum, default_value_t = TraceFormat::Strace)]
        format: TraceFormat,

        /// Run time in seconds (default: span of the capture's timestamps)
        #[arg(long)]
        elapsed: Option<f64>,

        /// Draw size/time charts
        #[arg(long)]
        histogram: bool,

        #[arg(short, long, value_enum, default_value_t = DisplayMode::Auto)]
        display: DisplayMode,

        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        #[arg(long)]
        json: Option<PathBuf>,

        #[arg(short, long, env = "IOPS_PROFILER_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Display a result saved with `run --json`
    Show {
        /// Path to result JSON file
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long, value_enum, default_value_t = DisplayMode::Auto)]
        display: DisplayMode,

        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Run {
            histogram,
            backend,
            display,
            output_dir,
            json,
            config,
            code,
        } => {
            let args = RunArgs {
                code: code.join(" "),
                histogram,
                backend,
                display,
                output_dir,
                json,
                config,
            };

            if let Err(e) = validate_run_args(&args) {
                eprintln!("❌ Error: {}", e);
                std::process::exit(2);
            }

            execute_run(args)?;
        }

        Commands::Analyze {
            input,
            format,
            elapsed,
            histogram,
            display,
            output_dir,
            json,
            config,
        } => {
            execute_analyze(AnalyzeArgs {
                input,
                format,
                elapsed,
                histogram,
                display,
                output_dir,
                json,
                config,
            })?;
        }

        Commands::Show {
            file,
            display,
            output_dir,
        } => {
            show_saved_result(&file, display, &output_dir)?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
