//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the library components to perform user tasks.

pub mod analyze;
pub mod models;
pub mod run;
pub mod utils;

// Re-export main command functions
pub use analyze::{analyze_capture, execute_analyze};
pub use models::{AnalyzeArgs, RunArgs};
pub use run::{execute_run, profile_and_display, validate_run_args};
pub use utils::{display_version, show_saved_result};
