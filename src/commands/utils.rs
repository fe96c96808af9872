use crate::output::display::stdout_renderer;
use crate::output::{display_result, read_result, DisplayMode, StderrNotices};
use crate::utils::config::SCHEMA_VERSION;
use anyhow::{Context, Result};
use std::path::Path;

/// Re-display a result saved with `--json`
pub fn show_saved_result(file_path: &Path, display: DisplayMode, output_dir: &Path) -> Result<()> {
    let saved = read_result(file_path)
        .with_context(|| format!("Failed to read result {}", file_path.display()))?;

    println!("Saved result: {}", file_path.display());
    println!("  Version: {}", saved.version);
    println!("  Generated: {}", saved.generated_at.to_rfc3339());
    if let Some(code) = &saved.code {
        println!("  Code: {}", code);
    }

    let mut renderer = stdout_renderer(display, output_dir);
    display_result(&saved.result, renderer.as_mut(), &mut StderrNotices)
        .context("Failed to display result")?;
    Ok(())
}

/// Display version information
pub fn display_version() {
    println!("IOPS Profiler v{}", env!("CARGO_PKG_VERSION"));
    println!("Result Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Measures read/write operations per second of shell code.");
}
