//! Size-only histogram of I/O operations on a log scale.

use super::units::ByteUnit;
use super::{bin_centers, bin_index, size_edges, NoChartData};
use crate::parser::{IoEvent, IoKind};
use crate::utils::config::HISTOGRAM_BINS;
use serde::Serialize;

/// Unweighted counts and byte-weighted sums per bin
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BinSeries {
    pub counts: Vec<u64>,
    pub bytes: Vec<u64>,
}

impl BinSeries {
    fn zeroed(bins: usize) -> Self {
        Self {
            counts: vec![0; bins],
            bytes: vec![0; bins],
        }
    }

    fn add(&mut self, edges: &[f64], size: u64) {
        if let Some(idx) = bin_index(edges, size as f64) {
            self.counts[idx] += 1;
            self.bytes[idx] = self.bytes[idx].saturating_add(size);
        }
    }

    pub fn total_count(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn max_bytes(&self) -> u64 {
        self.bytes.iter().copied().max().unwrap_or(0)
    }
}

/// Histogram over operation size
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeHistogram {
    /// Bin edges in bytes, ascending; `all.counts.len() + 1` entries
    pub edges: Vec<f64>,
    pub all: BinSeries,
    /// Present only when at least one non-zero read exists
    pub reads: Option<BinSeries>,
    pub writes: Option<BinSeries>,
    /// Unit for the byte panel, picked from the largest combined bin
    pub byte_unit: ByteUnit,
}

impl SizeHistogram {
    pub fn bin_count(&self) -> usize {
        self.edges.len().saturating_sub(1)
    }

    pub fn centers(&self) -> Vec<f64> {
        bin_centers(&self.edges)
    }
}

/// Bin events by size using the default bin count
///
/// **Public** - main entry point for the size histogram
///
/// # Errors
/// * `NoChartData::NoOperations` - empty event list
/// * `NoChartData::NoNonZeroBytes` - every event moved 0 bytes
pub fn compute_histogram(events: &[IoEvent]) -> Result<SizeHistogram, NoChartData> {
    compute_histogram_with_bins(events, HISTOGRAM_BINS)
}

/// Bin events by size into `bins` log-spaced bins
///
/// Zero-byte events are left out entirely.
pub fn compute_histogram_with_bins(
    events: &[IoEvent],
    bins: usize,
) -> Result<SizeHistogram, NoChartData> {
    if events.is_empty() {
        return Err(NoChartData::NoOperations);
    }

    let sized: Vec<&IoEvent> = events.iter().filter(|ev| ev.bytes > 0).collect();
    let (Some(min), Some(max)) = (
        sized.iter().map(|ev| ev.bytes).min(),
        sized.iter().map(|ev| ev.bytes).max(),
    ) else {
        return Err(NoChartData::NoNonZeroBytes);
    };

    let edges = size_edges(min, max, bins.max(1));
    let n = edges.len() - 1;

    let mut all = BinSeries::zeroed(n);
    let mut reads: Option<BinSeries> = None;
    let mut writes: Option<BinSeries> = None;

    for ev in &sized {
        all.add(&edges, ev.bytes);
        let series = match ev.kind {
            IoKind::Read => &mut reads,
            IoKind::Write => &mut writes,
        };
        series
            .get_or_insert_with(|| BinSeries::zeroed(n))
            .add(&edges, ev.bytes);
    }

    let byte_unit = ByteUnit::for_value(all.max_bytes() as f64);

    Ok(SizeHistogram {
        edges,
        all,
        reads,
        writes,
        byte_unit,
    })
}
