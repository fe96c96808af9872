//! Aggregation of I/O events into measurement results.
//!
//! This module reduces:
//! - Parsed events (or `(kind, bytes)` pairs) into read/write counts and bytes
//! - Before/after counter snapshots into a non-negative delta
//! - Summaries into a `MeasurementResult` with derived rates

pub mod metrics;
pub mod summary;

// Re-export main types and functions
pub use metrics::{MeasurementResult, MeasurementScope};
pub use summary::{summarize_events, IoCounters, IoSummary};
