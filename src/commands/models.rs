use crate::backend::BackendKind;
use crate::output::DisplayMode;
use crate::parser::TraceFormat;
use std::path::PathBuf;

/// Arguments for the run command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct RunArgs {
    /// Code to execute with `sh -c`
    pub code: String,

    /// Collect per-operation events and draw charts
    pub histogram: bool,

    /// Force one backend instead of the platform chain
    pub backend: Option<BackendKind>,

    pub display: DisplayMode,

    /// Where chart files go in plain-text mode
    pub output_dir: PathBuf,

    /// Save the result as JSON
    pub json: Option<PathBuf>,

    /// TOML configuration file
    pub config: Option<PathBuf>,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            code: String::new(),
            histogram: false,
            backend: None,
            display: DisplayMode::Auto,
            output_dir: PathBuf::from("."),
            json: None,
            config: None,
        }
    }
}

/// Arguments for the analyze command
#[derive(Debug, Clone)]
pub struct AnalyzeArgs {
    /// Capture file written by strace or fs_usage
    pub input: PathBuf,

    pub format: TraceFormat,

    /// Run time in seconds; inferred from timestamps when absent
    pub elapsed: Option<f64>,

    pub histogram: bool,
    pub display: DisplayMode,
    pub output_dir: PathBuf,
    pub json: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

impl Default for AnalyzeArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            format: TraceFormat::Strace,
            elapsed: None,
            histogram: false,
            display: DisplayMode::Auto,
            output_dir: PathBuf::from("."),
            json: None,
            config: None,
        }
    }
}
