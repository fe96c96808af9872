use iops_profiler::binning::histogram::compute_histogram_with_bins;
use iops_profiler::binning::timeseries::compute_timeseries_with_bins;
use iops_profiler::binning::{
    compute_histogram, compute_timeseries, ByteUnit, NoChartData, TimeUnit,
};
use iops_profiler::parser::{IoEvent, IoKind};

fn read(bytes: u64, ts: &str) -> IoEvent {
    IoEvent::new(IoKind::Read, bytes).with_timestamp(ts)
}

fn write(bytes: u64, ts: &str) -> IoEvent {
    IoEvent::new(IoKind::Write, bytes).with_timestamp(ts)
}

#[test]
fn test_histogram_counts_every_nonzero_event() {
    let events = vec![
        read(4096, "1.0"),
        read(4096, "1.1"),
        write(512, "1.2"),
        write(0, "1.3"),
        read(1_048_576, "1.4"),
    ];
    let hist = compute_histogram(&events).unwrap();

    assert_eq!(hist.bin_count(), 200);
    assert_eq!(hist.all.total_count(), 4);
    assert_eq!(hist.reads.as_ref().unwrap().total_count(), 3);
    assert_eq!(hist.writes.as_ref().unwrap().total_count(), 1);
    assert_eq!(hist.all.bytes.iter().sum::<u64>(), 4096 * 2 + 512 + 1_048_576);
}

#[test]
fn test_histogram_single_size_uses_expanded_range() {
    let events = vec![read(1000, "0.1"), read(1000, "0.2")];
    let hist = compute_histogram(&events).unwrap();

    assert_eq!(hist.edges.len(), 2);
    assert!((hist.edges[0] - 900.0).abs() < 1e-9);
    assert!((hist.edges[1] - 1100.0).abs() < 1e-9);
    assert_eq!(hist.all.counts, vec![2]);
    assert!(hist.writes.is_none());
}

#[test]
fn test_histogram_edges_are_padded_log_space() {
    let events = vec![read(10, "0"), read(1000, "0")];
    let hist = compute_histogram_with_bins(&events, 2).unwrap();

    assert_eq!(hist.edges.len(), 3);
    assert!((hist.edges[0] - 9.9).abs() < 1e-9);
    assert!((hist.edges[2] - 1010.0).abs() < 1e-9);
    assert_eq!(hist.all.counts, vec![1, 1]);
}

#[test]
fn test_histogram_without_data() {
    assert_eq!(compute_histogram(&[]).unwrap_err(), NoChartData::NoOperations);
    assert_eq!(
        compute_histogram(&[read(0, "1.0")]).unwrap_err(),
        NoChartData::NoNonZeroBytes
    );
    assert_eq!(
        NoChartData::NoNonZeroBytes.notice("histogram"),
        "⚠️ No operations with non-zero bytes for histogram generation."
    );
}

#[test]
fn test_histogram_byte_unit_follows_largest_bin() {
    let events = vec![read(3 * 1024 * 1024, "0"), read(10, "0")];
    let hist = compute_histogram(&events).unwrap();
    assert_eq!(hist.byte_unit, ByteUnit::MB);
}

#[test]
fn test_timeseries_grid_shape_and_totals() {
    let events = vec![
        read(4096, "100.000"),
        write(8192, "100.250"),
        read(4096, "100.500"),
        write(16, "101.000"),
    ];
    let bins = compute_timeseries(&events, 1.0).unwrap();

    assert_eq!(bins.time_edges.len(), 50);
    assert_eq!(bins.size_edges.len(), 30);
    assert_eq!(bins.time_bins(), 49);
    assert_eq!(bins.size_bins(), 29);
    assert_eq!(bins.time_unit, TimeUnit::Seconds);

    let total: u64 = bins.counts.iter().flatten().sum();
    assert_eq!(total, 4);
    let bytes: u64 = bins.bytes.iter().flatten().sum();
    assert_eq!(bytes, 4096 * 2 + 8192 + 16);
    assert_eq!(bins.skipped, 0);
}

#[test]
fn test_timeseries_clock_timestamps() {
    let events = vec![read(10, "12:00:00.000"), read(20, "12:00:00.004")];
    let bins = compute_timeseries_with_bins(&events, 0.0, 4, 2).unwrap();

    assert_eq!(bins.time_unit, TimeUnit::Milliseconds);
    assert!((bins.time_edges[4] - 0.004).abs() < 1e-9);
    assert_eq!(bins.counts[0].iter().sum::<u64>(), 1);
    assert_eq!(bins.counts[3].iter().sum::<u64>(), 1);
}

#[test]
fn test_timeseries_same_instant_uses_elapsed() {
    let events = vec![read(10, "5.0"), write(20, "5.0")];
    let bins = compute_timeseries(&events, 2.0).unwrap();
    assert_eq!(bins.time_edges.last().copied(), Some(2.0));
    assert_eq!(bins.counts[0].iter().sum::<u64>(), 2);
}

#[test]
fn test_timeseries_skips_unparseable_timestamps() {
    let events = vec![read(10, "1.0"), read(10, "later"), read(10, "1.5")];
    let bins = compute_timeseries(&events, 1.0).unwrap();
    assert_eq!(bins.skipped, 1);
    assert_eq!(bins.counts.iter().flatten().sum::<u64>(), 2);
}

#[test]
fn test_timeseries_without_data() {
    assert_eq!(compute_timeseries(&[], 1.0).unwrap_err(), NoChartData::NoOperations);
    assert_eq!(
        compute_timeseries(&[read(0, "1.0")], 1.0).unwrap_err(),
        NoChartData::NoNonZeroBytes
    );
    assert_eq!(
        compute_timeseries(&[IoEvent::new(IoKind::Read, 5)], 1.0).unwrap_err(),
        NoChartData::NoTimestamps
    );
    assert_eq!(
        compute_timeseries(&[read(5, "soon")], 1.0).unwrap_err(),
        NoChartData::UnparseableTimestamps
    );
}
