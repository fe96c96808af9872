use iops_profiler::aggregator::{IoSummary, MeasurementResult, MeasurementScope};
use iops_profiler::output::table::{html_table, text_table};
use iops_profiler::output::{
    display_result, read_result, validate_path, write_result, write_svg, HtmlRenderer,
    SavedResult, TerminalRenderer,
};
use iops_profiler::parser::{IoEvent, IoKind};
use pretty_assertions::assert_eq;
use std::path::Path;
use tempfile::tempdir;

fn sample_result() -> MeasurementResult {
    MeasurementResult::from_summary(
        IoSummary {
            read_count: 10,
            write_count: 5,
            read_bytes: 10240,
            write_bytes: 5120,
        },
        1.0,
        "strace (per-process)",
        MeasurementScope::PerProcess,
    )
}

fn detailed_result() -> MeasurementResult {
    let ops = vec![
        IoEvent::new(IoKind::Read, 4096).with_timestamp("1700000000.000000"),
        IoEvent::new(IoKind::Write, 512).with_timestamp("1700000000.250000"),
        IoEvent::new(IoKind::Read, 65536).with_timestamp("1700000000.500000"),
    ];
    sample_result().with_operations(Some(ops))
}

#[test]
fn test_text_table_rows() {
    let table = text_table(&sample_result());

    assert!(table.contains("IOPS Profile Results (strace (per-process))"));
    assert!(table.contains(&"=".repeat(70)));
    assert!(table.contains("Execution Time:"));
    assert!(table.contains("1.0000 seconds"));
    assert!(table.contains("15,360 bytes"));
    assert!(table.contains("15.00 operations/second"));
    assert!(table.contains("15.00 KB/second"));
    assert!(!table.contains("Warning"));
}

#[test]
fn test_text_table_warns_for_system_wide() {
    let result = MeasurementResult {
        method: "⚠️ SYSTEM-WIDE (includes all processes)".to_string(),
        scope: MeasurementScope::SystemWide,
        ..sample_result()
    };
    let table = text_table(&result);
    assert!(table.contains("System-wide measurement includes I/O from all processes"));
}

#[test]
fn test_html_table_escapes_method() {
    let result = MeasurementResult {
        method: "<odd & method>".to_string(),
        ..sample_result()
    };
    let html = html_table(&result);
    assert!(html.contains("&lt;odd &amp; method&gt;"));
    assert!(html.contains("class=\"iops-table\""));
    assert!(html.contains("<strong>IOPS</strong>"));
    assert!(!html.contains("iops-warning\">"));
}

#[test]
fn test_terminal_display_saves_both_charts() {
    let dir = tempdir().unwrap();
    let mut renderer = TerminalRenderer::new(Vec::new(), dir.path());
    let mut notices: Vec<String> = Vec::new();

    display_result(&detailed_result(), &mut renderer, &mut notices).unwrap();

    let out = String::from_utf8(renderer.into_inner()).unwrap();
    assert!(out.contains("IOPS Profile Results"));
    assert!(out.contains("📊 Histogram saved to:"));
    assert!(out.contains("📊 Heatmap saved to:"));
    assert!(notices.is_empty());

    let hist = std::fs::read_to_string(dir.path().join("iops_histogram.svg")).unwrap();
    assert!(hist.starts_with("<svg"));
    assert!(dir.path().join("iops_heatmap.svg").exists());
}

#[test]
fn test_display_without_operations_draws_no_charts() {
    let dir = tempdir().unwrap();
    let mut renderer = TerminalRenderer::new(Vec::new(), dir.path());
    let mut notices: Vec<String> = Vec::new();

    display_result(&sample_result(), &mut renderer, &mut notices).unwrap();

    assert!(notices.is_empty());
    assert!(!dir.path().join("iops_histogram.svg").exists());
}

#[test]
fn test_display_with_empty_operations_emits_notices() {
    let mut renderer = HtmlRenderer::new(Vec::new());
    let mut notices: Vec<String> = Vec::new();
    let result = sample_result().with_operations(Some(Vec::new()));

    display_result(&result, &mut renderer, &mut notices).unwrap();

    assert_eq!(
        notices,
        vec![
            "⚠️ No operations captured for histogram generation.".to_string(),
            "⚠️ No operations captured for heatmap generation.".to_string(),
        ]
    );
}

#[test]
fn test_html_display_inlines_charts() {
    let mut renderer = HtmlRenderer::new(Vec::new());
    let mut notices: Vec<String> = Vec::new();

    display_result(&detailed_result(), &mut renderer, &mut notices).unwrap();

    let html = String::from_utf8(renderer.into_inner()).unwrap();
    assert!(html.contains("<table class=\"iops-table\">"));
    assert_eq!(html.matches("<div class=\"iops-chart\">").count(), 2);
}

#[test]
fn test_display_without_timestamps_skips_heatmap() {
    let mut renderer = HtmlRenderer::new(Vec::new());
    let mut notices: Vec<String> = Vec::new();
    let result = sample_result().with_operations(Some(vec![IoEvent::new(IoKind::Read, 10)]));

    display_result(&result, &mut renderer, &mut notices).unwrap();

    assert_eq!(
        notices,
        vec!["⚠️ No operations with timestamps for heatmap generation.".to_string()]
    );
}

#[test]
fn test_saved_result_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("result.json");
    let saved = SavedResult::new(detailed_result(), Some("dd if=/dev/zero".to_string()));

    write_result(&saved, &path).unwrap();
    let loaded = read_result(&path).unwrap();

    assert_eq!(loaded, saved);
    assert_eq!(loaded.version, "1.0.0");
}

#[test]
fn test_saved_result_omits_missing_operations() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("result.json");
    write_result(&SavedResult::new(sample_result(), None), &path).unwrap();

    let json = std::fs::read_to_string(&path).unwrap();
    assert!(!json.contains("operations"));
    assert!(!json.contains("\"code\""));
    assert!(json.contains("\"scope\": \"per_process\""));
}

#[test]
fn test_write_svg_rejects_directory() {
    let dir = tempdir().unwrap();
    assert!(write_svg("<svg/>", dir.path()).is_err());
    assert!(validate_path(Path::new("")).is_err());
}
