//! Summary tables for a measurement result.

use crate::aggregator::MeasurementResult;
use crate::binning::format_bytes;
use std::fmt::Write;

const RULE_WIDTH: usize = 70;
const LABEL_WIDTH: usize = 30;

const DEGRADED_WARNING: &str = "⚠️  Warning: System-wide measurement includes I/O from all processes.";
const DEGRADED_DETAIL: &str = "Results may not accurately reflect your code's I/O activity.";

/// Integer with `,` thousands separators
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// **Private** - label/value rows shared by both table formats
fn rows(result: &MeasurementResult) -> Vec<(&'static str, String)> {
    let bytes = |n: u64| format!("{} ({} bytes)", format_bytes(n as f64), thousands(n));
    vec![
        (
            "Execution Time",
            format!("{:.4} seconds", result.elapsed_time),
        ),
        ("Read Operations", thousands(result.read_count)),
        ("Write Operations", thousands(result.write_count)),
        ("Total Operations", thousands(result.total_ops())),
        ("Bytes Read", bytes(result.read_bytes)),
        ("Bytes Written", bytes(result.write_bytes)),
        ("Total Bytes", bytes(result.total_bytes())),
    ]
}

fn rate_rows(result: &MeasurementResult) -> [(&'static str, String); 2] {
    [
        ("IOPS", format!("{:.2} operations/second", result.iops())),
        (
            "Throughput",
            format!("{}/second", format_bytes(result.throughput())),
        ),
    ]
}

/// Render the 70-column plain-text table
pub fn text_table(result: &MeasurementResult) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "\n{}", heavy);
    let _ = writeln!(out, "IOPS Profile Results ({})", result.method);
    let _ = writeln!(out, "{}", heavy);
    for (label, value) in rows(result) {
        let _ = writeln!(out, "{:<width$} {}", format!("{}:", label), value, width = LABEL_WIDTH);
    }
    let _ = writeln!(out, "{}", light);
    for (label, value) in rate_rows(result) {
        let _ = writeln!(out, "{:<width$} {}", format!("{}:", label), value, width = LABEL_WIDTH);
    }
    let _ = writeln!(out, "{}", heavy);

    if result.is_degraded() {
        let _ = writeln!(out, "\n{}", DEGRADED_WARNING);
        let _ = writeln!(out, "   {}", DEGRADED_DETAIL);
    }

    out
}

/// Escape text for HTML element content
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the HTML table with its inline style
pub fn html_table(result: &MeasurementResult) -> String {
    let mut out = String::from(
        r#"<style>
  .iops-table { border-collapse: collapse; margin: 10px 0; font-family: monospace; font-size: 14px; }
  .iops-table td { padding: 6px 12px; border: 1px solid #ddd; }
  .iops-table tr:first-child td { background-color: #f5f5f5; font-weight: bold; }
  .iops-warning { color: #ff6600; font-size: 12px; margin-top: 5px; }
</style>
<div>
<table class="iops-table">
"#,
    );

    let _ = writeln!(
        out,
        r#"  <tr><td colspan="2">IOPS Profile Results ({})</td></tr>"#,
        escape_html(&result.method)
    );
    for (label, value) in rows(result) {
        let _ = writeln!(out, "  <tr><td>{}</td><td>{}</td></tr>", label, value);
    }
    for (label, value) in rate_rows(result) {
        let _ = writeln!(
            out,
            "  <tr><td><strong>{}</strong></td><td><strong>{}</strong></td></tr>",
            label, value
        );
    }
    out.push_str("</table>\n");

    if result.is_degraded() {
        let _ = writeln!(
            out,
            r#"<div class="iops-warning">{} {}</div>"#,
            escape_html(DEGRADED_WARNING),
            escape_html(DEGRADED_DETAIL)
        );
    }

    out.push_str("</div>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a<b> & \"c\""), "a&lt;b&gt; &amp; &quot;c&quot;");
    }
}
