//! Output of measurement results.
//!
//! This module handles:
//! - User-facing notices
//! - Summary tables (plain text and HTML)
//! - SVG charts for the size histogram and time-series heatmap
//! - Choosing graphical or plain display
//! - Writing results (JSON) and charts (SVG) to disk

pub mod chart;
pub mod display;
pub mod json;
pub mod notice;
pub mod svg;
pub mod table;

// Re-export main functions
pub use display::{display_result, is_graphical_environment, DisplayMode, HtmlRenderer, Renderer, TerminalRenderer};
pub use json::{read_result, write_result, SavedResult};
pub use notice::{NoticeSink, StderrNotices};
pub use svg::write_svg;

use crate::utils::error::OutputError;
use log::debug;
use std::path::Path;

/// Common path validation for output files
pub fn validate_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.exists() && path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

/// Validate `path` and create its parent directories
pub(crate) fn prepare_output_path(path: &Path) -> Result<(), OutputError> {
    validate_path(path)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    Ok(())
}
