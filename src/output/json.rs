//! JSON result writer and reader.
//!
//! A saved result wraps the `MeasurementResult` with the schema version
//! and the time it was written, so `show` can re-display it later.

use crate::aggregator::MeasurementResult;
use crate::utils::config::SCHEMA_VERSION;
use crate::utils::error::OutputError;
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// A measurement as persisted on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedResult {
    pub version: String,
    pub generated_at: DateTime<Utc>,
    /// Code that was profiled, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub result: MeasurementResult,
}

impl SavedResult {
    pub fn new(result: MeasurementResult, code: Option<String>) -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            code,
            result,
        }
    }
}

/// Write a saved result to a JSON file
///
/// **Public** - main entry point for JSON output
///
/// # Arguments
/// * `saved` - Result to write
/// * `output_path` - Path to output JSON file
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
pub fn write_result(saved: &SavedResult, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing result to: {}", output_path.display());
    super::prepare_output_path(output_path)?;

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, saved).map_err(OutputError::SerializationFailed)?;

    info!(
        "Result written successfully ({} bytes)",
        calculate_file_size(output_path)
    );

    Ok(())
}

/// **Private** - internal utility
fn calculate_file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Read a saved result from a JSON file
///
/// # Errors
/// * `OutputError::WriteFailed` - File read error (reusing WriteFailed for I/O)
/// * `OutputError::SerializationFailed` - JSON parse error
pub fn read_result(input_path: impl AsRef<Path>) -> Result<SavedResult, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading result from: {}", input_path.display());

    let file = File::open(input_path).map_err(OutputError::WriteFailed)?;
    let saved: SavedResult = serde_json::from_reader(BufReader::new(file))
        .map_err(OutputError::SerializationFailed)?;

    debug!(
        "Result loaded: version {}, method {}",
        saved.version, saved.result.method
    );

    Ok(saved)
}
