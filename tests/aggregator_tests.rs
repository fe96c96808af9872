use iops_profiler::aggregator::{summarize_events, IoSummary, MeasurementResult, MeasurementScope};
use iops_profiler::binning::format_bytes;
use iops_profiler::parser::{IoEvent, IoKind};
use pretty_assertions::assert_eq;

fn sample_events() -> Vec<IoEvent> {
    let mut events = Vec::new();
    for i in 0..10 {
        events.push(IoEvent::new(IoKind::Read, 1024).with_timestamp(format!("{}.0", i)));
    }
    for i in 0..5 {
        events.push(IoEvent::new(IoKind::Write, 1024).with_timestamp(format!("{}.5", i)));
    }
    events
}

#[test]
fn test_summary_totals() {
    let summary = summarize_events(&sample_events());
    assert_eq!(
        summary,
        IoSummary {
            read_count: 10,
            write_count: 5,
            read_bytes: 10240,
            write_bytes: 5120,
        }
    );
    assert_eq!(summary.total_ops(), 15);
    assert_eq!(summary.total_bytes(), 15360);
}

#[test]
fn test_summary_ignores_event_order() {
    let events = sample_events();
    let mut shuffled = events.clone();
    shuffled.reverse();
    shuffled.swap(2, 11);
    assert_eq!(summarize_events(&events), summarize_events(&shuffled));
}

#[test]
fn test_summary_from_pairs() {
    let summary: IoSummary = vec![(IoKind::Read, 3), (IoKind::Read, 0), (IoKind::Write, 7)]
        .into_iter()
        .collect();
    assert_eq!(summary.read_count, 2);
    assert_eq!(summary.read_bytes, 3);
    assert_eq!(summary.write_bytes, 7);
}

#[test]
fn test_rates_for_one_second_run() {
    let result = MeasurementResult::from_summary(
        summarize_events(&sample_events()),
        1.0,
        "strace (per-process)",
        MeasurementScope::PerProcess,
    );
    assert_eq!(result.iops(), 15.0);
    assert_eq!(format_bytes(result.throughput()), "15.00 KB");
    assert!(!result.is_degraded());
}

#[test]
fn test_zero_elapsed_gives_zero_rates() {
    let result = MeasurementResult::from_summary(
        summarize_events(&sample_events()),
        0.0,
        "strace (per-process)",
        MeasurementScope::PerProcess,
    );
    assert_eq!(result.iops(), 0.0);
    assert_eq!(result.throughput(), 0.0);
    assert_eq!(result.total_ops(), 15);
}

#[test]
fn test_system_wide_is_degraded() {
    let result = MeasurementResult::from_summary(
        IoSummary::default(),
        1.0,
        "⚠️ SYSTEM-WIDE (includes all processes)",
        MeasurementScope::SystemWide,
    );
    assert!(result.is_degraded());
}
