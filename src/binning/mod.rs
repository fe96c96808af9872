//! Histogram and time-series binning of I/O events.
//!
//! Bin lookup follows numpy's `histogram` convention: every bin is
//! half-open `[lo, hi)` except the last, which is closed, and values
//! outside the edge range are dropped.

pub mod histogram;
pub mod timeseries;
pub mod units;

pub use histogram::{compute_histogram, BinSeries, SizeHistogram};
pub use timeseries::{compute_timeseries, parse_timestamp, TimeSeriesBins};
pub use units::{format_bytes, format_duration, ByteUnit, TimeUnit};

use crate::utils::config::{SINGLE_VALUE_EXPANSION, SIZE_RANGE_PAD};
use thiserror::Error;

/// Why a chart could not be produced
///
/// Never fatal: the display layer turns it into a notice.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoChartData {
    #[error("No operations captured")]
    NoOperations,

    #[error("No operations with non-zero bytes")]
    NoNonZeroBytes,

    #[error("No operations with timestamps")]
    NoTimestamps,

    #[error("Could not parse timestamps")]
    UnparseableTimestamps,
}

impl NoChartData {
    /// User-facing notice for the named chart
    pub fn notice(&self, chart: &str) -> String {
        format!("⚠️ {} for {} generation.", self, chart)
    }
}

/// `n` points evenly spaced in log10 space from `start` to `stop`
///
/// Both ends must be positive. The endpoints are exact.
pub fn log_space(start: f64, stop: f64, n: usize) -> Vec<f64> {
    let (lo, hi) = (start.log10(), stop.log10());
    let mut points: Vec<f64> = lin_space(lo, hi, n)
        .into_iter()
        .map(|x| 10f64.powf(x))
        .collect();
    if let Some(first) = points.first_mut() {
        *first = start;
    }
    if n > 1 {
        if let Some(last) = points.last_mut() {
            *last = stop;
        }
    }
    points
}

/// `n` points evenly spaced from `start` to `stop`, inclusive
pub fn lin_space(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            let mut points: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            points[n - 1] = stop;
            points
        }
    }
}

/// Bin index of `value` for ascending `edges`
///
/// Returns `None` for values outside `[edges[0], edges[last]]`, for NaN,
/// and when fewer than two edges exist.
pub fn bin_index(edges: &[f64], value: f64) -> Option<usize> {
    let (&first, &last) = (edges.first()?, edges.last()?);
    if edges.len() < 2 || value.is_nan() || value < first || value > last {
        return None;
    }
    if value == last {
        return Some(edges.len() - 2);
    }
    // First edge strictly greater than value, minus one
    let upper = edges.partition_point(|&e| e <= value);
    Some(upper.saturating_sub(1).min(edges.len() - 2))
}

/// Log-spaced size edges for non-zero byte sizes
///
/// A single repeated size gets the two edges `[v*0.9, v*1.1]`; otherwise
/// `bins + 1` edges span `[min*0.99, max*1.01]`.
pub fn size_edges(min: u64, max: u64, bins: usize) -> Vec<f64> {
    let min = min.max(1) as f64;
    let max = max as f64;
    if min >= max {
        return vec![
            min * (1.0 - SINGLE_VALUE_EXPANSION),
            min * (1.0 + SINGLE_VALUE_EXPANSION),
        ];
    }
    log_space(
        min * (1.0 - SIZE_RANGE_PAD),
        max * (1.0 + SIZE_RANGE_PAD),
        bins + 1,
    )
}

/// Midpoints between consecutive edges
pub fn bin_centers(edges: &[f64]) -> Vec<f64> {
    edges.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lin_space_endpoints() {
        let pts = lin_space(0.0, 1.0, 5);
        assert_eq!(pts, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert!(lin_space(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_log_space_decades() {
        let pts = log_space(1.0, 1000.0, 4);
        assert_eq!(pts.len(), 4);
        assert_eq!(pts[0], 1.0);
        assert!((pts[1] - 10.0).abs() < 1e-9);
        assert!((pts[2] - 100.0).abs() < 1e-9);
        assert_eq!(pts[3], 1000.0);
    }

    #[test]
    fn test_bin_index_half_open_last_closed() {
        let edges = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(bin_index(&edges, 0.0), Some(0));
        assert_eq!(bin_index(&edges, 0.99), Some(0));
        assert_eq!(bin_index(&edges, 1.0), Some(1));
        assert_eq!(bin_index(&edges, 3.0), Some(2));
        assert_eq!(bin_index(&edges, 3.01), None);
        assert_eq!(bin_index(&edges, -0.1), None);
        assert_eq!(bin_index(&edges, f64::NAN), None);
        assert_eq!(bin_index(&[1.0], 1.0), None);
    }

    #[test]
    fn test_size_edges_single_value() {
        let edges = size_edges(4096, 4096, 200);
        assert_eq!(edges.len(), 2);
        assert!((edges[0] - 4096.0 * 0.9).abs() < 1e-9);
        assert!((edges[1] - 4096.0 * 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_size_edges_padded() {
        let edges = size_edges(10, 1000, 200);
        assert_eq!(edges.len(), 201);
        assert!((edges[0] - 9.9).abs() < 1e-9);
        assert!((edges[200] - 1010.0).abs() < 1e-9);
    }

    #[test]
    fn test_notice_text() {
        assert_eq!(
            NoChartData::NoOperations.notice("histogram"),
            "⚠️ No operations captured for histogram generation."
        );
    }
}
