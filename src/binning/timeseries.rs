//! Time × size binning for the I/O heatmap.
//!
//! Timestamps come in two encodings: decimal epoch seconds (strace
//! `-ttt`) and `HH:MM:SS.ffffff` clock time (fs_usage). Both are turned
//! into seconds since the first parseable timestamp.

use super::units::{ByteUnit, TimeUnit};
use super::{bin_index, lin_space, size_edges, NoChartData};
use crate::parser::IoEvent;
use crate::utils::config::{HEATMAP_SIZE_BINS, HEATMAP_TIME_BINS};
use log::debug;
use serde::Serialize;

/// Smallest time span used when every event shares one instant and no
/// elapsed time is known
const MIN_TIME_SPAN: f64 = 1e-9;

/// 2D bin grid, indexed `[time][size]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesBins {
    /// Seconds since the first event, ascending
    pub time_edges: Vec<f64>,
    /// Bytes, ascending (log-spaced)
    pub size_edges: Vec<f64>,
    pub counts: Vec<Vec<u64>>,
    pub bytes: Vec<Vec<u64>>,
    /// Unit for the time axis, from the largest relative time
    pub time_unit: TimeUnit,
    /// Unit for the byte panel, from the largest cell
    pub byte_unit: ByteUnit,
    /// Events left out: timestamp missing or unparseable, or before the origin
    pub skipped: usize,
}

impl TimeSeriesBins {
    pub fn time_bins(&self) -> usize {
        self.time_edges.len().saturating_sub(1)
    }

    pub fn size_bins(&self) -> usize {
        self.size_edges.len().saturating_sub(1)
    }

    pub fn max_count(&self) -> u64 {
        self.counts.iter().flatten().copied().max().unwrap_or(0)
    }

    pub fn max_bytes(&self) -> u64 {
        self.bytes.iter().flatten().copied().max().unwrap_or(0)
    }
}

/// Seconds represented by a timestamp string
///
/// Decimal text is read as-is; `H:M:S.frac` is converted to seconds of the
/// day. Anything else is `None`.
pub fn parse_timestamp(text: &str) -> Option<f64> {
    let text = text.trim();
    let value = if text.contains(':') {
        let mut parts = text.split(':');
        let (h, m, s) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() {
            return None;
        }
        let h: f64 = h.parse().ok()?;
        let m: f64 = m.parse().ok()?;
        let s: f64 = s.parse().ok()?;
        h * 3600.0 + m * 60.0 + s
    } else {
        text.parse().ok()?
    };
    value.is_finite().then_some(value)
}

/// Bin events over time and size using the default grid
///
/// **Public** - main entry point for the heatmap
///
/// # Arguments
/// * `events` - Events in trace order
/// * `elapsed_time` - Measured run time, used for the time axis when all
///   events share one instant
///
/// # Errors
/// A `NoChartData` variant when nothing can be charted
pub fn compute_timeseries(
    events: &[IoEvent],
    elapsed_time: f64,
) -> Result<TimeSeriesBins, NoChartData> {
    compute_timeseries_with_bins(events, elapsed_time, HEATMAP_TIME_BINS, HEATMAP_SIZE_BINS)
}

/// Bin events into a `time_bins` × `size_bins` grid
pub fn compute_timeseries_with_bins(
    events: &[IoEvent],
    elapsed_time: f64,
    time_bins: usize,
    size_bins: usize,
) -> Result<TimeSeriesBins, NoChartData> {
    if events.is_empty() {
        return Err(NoChartData::NoOperations);
    }

    let sized: Vec<&IoEvent> = events.iter().filter(|ev| ev.bytes > 0).collect();
    if sized.is_empty() {
        return Err(NoChartData::NoNonZeroBytes);
    }

    let stamped: Vec<(&str, u64)> = sized
        .iter()
        .filter_map(|ev| ev.timestamp.as_deref().map(|ts| (ts, ev.bytes)))
        .collect();
    if stamped.is_empty() {
        return Err(NoChartData::NoTimestamps);
    }

    // One shared origin: the first parseable timestamp in trace order
    let mut start: Option<f64> = None;
    let points: Vec<(f64, u64)> = stamped
        .iter()
        .filter_map(|&(ts, bytes)| {
            let t = parse_timestamp(ts)?;
            let origin = *start.get_or_insert(t);
            Some((t - origin, bytes))
        })
        .collect();
    if points.is_empty() {
        return Err(NoChartData::UnparseableTimestamps);
    }
    let mut skipped = sized.len() - points.len();

    let mut max_time = points.iter().map(|&(t, _)| t).fold(0.0_f64, f64::max);
    if max_time == 0.0 {
        max_time = elapsed_time;
    }
    if !(max_time > 0.0) {
        max_time = MIN_TIME_SPAN;
    }
    let time_unit = TimeUnit::for_seconds(max_time);
    let time_edges = lin_space(0.0, max_time, time_bins.max(1) + 1);

    let min_size = points.iter().map(|&(_, b)| b).min().unwrap_or(1);
    let max_size = points.iter().map(|&(_, b)| b).max().unwrap_or(1);
    let size_edges = size_edges(min_size, max_size, size_bins.max(1));

    let (nt, ns) = (time_edges.len() - 1, size_edges.len() - 1);
    let mut counts = vec![vec![0u64; ns]; nt];
    let mut bytes = vec![vec![0u64; ns]; nt];

    for &(t, b) in &points {
        // Earlier than the origin, e.g. a clock-format stamp past midnight
        let (Some(ti), Some(si)) = (bin_index(&time_edges, t), bin_index(&size_edges, b as f64))
        else {
            skipped += 1;
            continue;
        };
        counts[ti][si] += 1;
        bytes[ti][si] = bytes[ti][si].saturating_add(b);
    }

    let max_cell = bytes.iter().flatten().copied().max().unwrap_or(0);
    debug!(
        "Binned {} events into {}x{} grid over {:.6}s ({} skipped)",
        sized.len() - skipped,
        nt,
        ns,
        max_time,
        skipped
    );

    Ok(TimeSeriesBins {
        time_edges,
        size_edges,
        counts,
        bytes,
        time_unit,
        byte_unit: ByteUnit::for_value(max_cell as f64),
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::IoKind;

    #[test]
    fn test_parse_timestamp_formats() {
        assert_eq!(parse_timestamp("1700000000.25"), Some(1700000000.25));
        assert_eq!(parse_timestamp("01:02:03.5"), Some(3723.5));
        assert_eq!(parse_timestamp("12:34"), None);
        assert_eq!(parse_timestamp("1:2:3:4"), None);
        assert_eq!(parse_timestamp("abc"), None);
        assert_eq!(parse_timestamp("nan"), None);
    }

    #[test]
    fn test_single_instant_uses_elapsed_time() {
        let events = vec![
            IoEvent::new(IoKind::Write, 10).with_timestamp("5.0"),
            IoEvent::new(IoKind::Write, 20).with_timestamp("5.0"),
        ];
        let bins = compute_timeseries(&events, 0.002).unwrap();
        assert_eq!(*bins.time_edges.last().unwrap(), 0.002);
        assert_eq!(bins.time_unit, TimeUnit::Milliseconds);
        assert_eq!(bins.counts[0].iter().sum::<u64>(), 2);
    }

    #[test]
    fn test_single_instant_without_elapsed_time() {
        let events = vec![IoEvent::new(IoKind::Read, 10).with_timestamp("5.0")];
        let bins = compute_timeseries(&events, 0.0).unwrap();
        assert_eq!(bins.time_unit, TimeUnit::Nanoseconds);
        assert_eq!(bins.max_count(), 1);
    }

    #[test]
    fn test_events_before_origin_are_skipped() {
        let events = vec![
            IoEvent::new(IoKind::Read, 100).with_timestamp("23:59:59.5"),
            IoEvent::new(IoKind::Read, 100).with_timestamp("23:59:59.9"),
            // Clock wrapped past midnight
            IoEvent::new(IoKind::Write, 100).with_timestamp("00:00:00.2"),
            IoEvent::new(IoKind::Write, 100),
        ];
        let bins = compute_timeseries(&events, 1.0).unwrap();

        let binned: u64 = bins.counts.iter().flatten().sum();
        assert_eq!(binned, 2);
        assert_eq!(bins.skipped, 2);
        assert_eq!(binned as usize + bins.skipped, events.len());
    }
}
