//! Measurement results and derived rates.
//!
//! A `MeasurementResult` is the contract between the backends and the
//! display layer. Totals and rates are derived on demand so a saved
//! result never carries stale numbers.

use super::summary::IoSummary;
use crate::parser::IoEvent;
use serde::{Deserialize, Serialize};

/// Marker prefixed to method labels of degraded measurements
pub const DEGRADED_MARKER: &str = "⚠️";

/// Whether the counters isolate the profiled process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementScope {
    PerProcess,
    /// Includes I/O from every process on the machine
    SystemWide,
}

/// Outcome of one profiling run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementResult {
    pub read_count: u64,
    pub write_count: u64,
    pub read_bytes: u64,
    pub write_bytes: u64,

    /// Seconds spent in the user code only (setup and teardown excluded)
    pub elapsed_time: f64,

    /// Which backend produced the numbers, e.g. `strace (per-process)`
    pub method: String,

    pub scope: MeasurementScope,

    /// Ordered per-operation events, only when detail was requested and
    /// the backend can supply them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operations: Option<Vec<IoEvent>>,
}

impl MeasurementResult {
    /// Build a result from an aggregated summary
    pub fn from_summary(
        summary: IoSummary,
        elapsed_time: f64,
        method: impl Into<String>,
        scope: MeasurementScope,
    ) -> Self {
        Self {
            read_count: summary.read_count,
            write_count: summary.write_count,
            read_bytes: summary.read_bytes,
            write_bytes: summary.write_bytes,
            elapsed_time,
            method: method.into(),
            scope,
            operations: None,
        }
    }

    pub fn with_operations(mut self, operations: Option<Vec<IoEvent>>) -> Self {
        self.operations = operations;
        self
    }

    pub fn total_ops(&self) -> u64 {
        self.read_count + self.write_count
    }

    pub fn total_bytes(&self) -> u64 {
        self.read_bytes.saturating_add(self.write_bytes)
    }

    /// Operations per second; 0 when no time elapsed
    pub fn iops(&self) -> f64 {
        per_second(self.total_ops() as f64, self.elapsed_time)
    }

    /// Bytes per second; 0 when no time elapsed
    pub fn throughput(&self) -> f64 {
        per_second(self.total_bytes() as f64, self.elapsed_time)
    }

    /// Whether the numbers include other processes' I/O
    pub fn is_degraded(&self) -> bool {
        self.scope == MeasurementScope::SystemWide || self.method.contains(DEGRADED_MARKER)
    }
}

fn per_second(amount: f64, elapsed: f64) -> f64 {
    // NaN elapsed falls through to 0 as well
    if elapsed > 0.0 {
        amount / elapsed
    } else {
        0.0
    }
}
