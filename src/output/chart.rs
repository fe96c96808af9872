//! Self-contained SVG charts.
//!
//! Two figures, each made of two side-by-side panels:
//! - size histogram: operation count and total bytes per size bin
//!   (log x axis, series All / Reads / Writes)
//! - heatmap: count and bytes per (time, size) cell (log size axis)

use super::table::escape_html;
use crate::binning::{bin_centers, SizeHistogram, TimeSeriesBins};
use log::debug;
use std::fmt::Write;

const PANEL_WIDTH: f64 = 600.0;
const PANEL_HEIGHT: f64 = 380.0;
const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 55.0;
const Y_TICKS: usize = 5;

const SERIES_ALL: &str = "rgb(31, 119, 180)";
const SERIES_READS: &str = "rgb(255, 127, 14)";
const SERIES_WRITES: &str = "rgb(44, 160, 44)";

/// Viridis control points, low to high
const VIRIDIS: [(u8, u8, u8); 5] = [
    (68, 1, 84),
    (59, 82, 139),
    (33, 145, 140),
    (94, 201, 98),
    (253, 231, 37),
];

/// Plot area of one panel in figure coordinates
#[derive(Debug, Clone, Copy)]
struct Panel {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

impl Panel {
    fn at(index: usize) -> Self {
        Self {
            left: index as f64 * PANEL_WIDTH + MARGIN_LEFT,
            top: MARGIN_TOP,
            width: PANEL_WIDTH - MARGIN_LEFT - MARGIN_RIGHT,
            height: PANEL_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM,
        }
    }

    fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// x for a fraction of the width
    fn x(&self, frac: f64) -> f64 {
        self.left + frac.clamp(0.0, 1.0) * self.width
    }

    /// y for a fraction of the height, 0 at the bottom
    fn y(&self, frac: f64) -> f64 {
        self.bottom() - frac.clamp(0.0, 1.0) * self.height
    }
}

/// Position of `v` between `lo` and `hi` on a log10 scale
fn log_frac(v: f64, lo: f64, hi: f64) -> f64 {
    let (lo, hi) = (lo.log10(), hi.log10());
    if hi <= lo {
        return 0.5;
    }
    (v.log10() - lo) / (hi - lo)
}

fn lin_frac(v: f64, lo: f64, hi: f64) -> f64 {
    if hi <= lo {
        return 0.0;
    }
    (v - lo) / (hi - lo)
}

fn svg_open(out: &mut String, width: f64, height: f64) {
    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif">"#,
        w = width,
        h = height
    );
    out.push_str(r#"<rect width="100%" height="100%" fill="white"/>"#);
}

fn panel_frame(out: &mut String, panel: &Panel, title: &str, x_label: &str, y_label: &str) {
    let _ = write!(
        out,
        r##"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="none" stroke="#333"/>"##,
        panel.left, panel.top, panel.width, panel.height
    );
    let _ = write!(
        out,
        r#"<text x="{:.1}" y="{:.1}" font-size="14" font-weight="bold" text-anchor="middle">{}</text>"#,
        panel.left + panel.width / 2.0,
        panel.top - 14.0,
        escape_html(title)
    );
    let _ = write!(
        out,
        r#"<text x="{:.1}" y="{:.1}" font-size="12" text-anchor="middle">{}</text>"#,
        panel.left + panel.width / 2.0,
        panel.bottom() + 42.0,
        escape_html(x_label)
    );
    let (yx, yy) = (panel.left - 60.0, panel.top + panel.height / 2.0);
    let _ = write!(
        out,
        r#"<text x="{:.1}" y="{:.1}" font-size="12" text-anchor="middle" transform="rotate(-90 {:.1} {:.1})">{}</text>"#,
        yx,
        yy,
        yx,
        yy,
        escape_html(y_label)
    );
}

/// Decade ticks (`10^k`) along a log axis
fn log_ticks_x(out: &mut String, panel: &Panel, lo: f64, hi: f64) {
    for k in decades(lo, hi) {
        let x = panel.x(log_frac(10f64.powi(k), lo, hi));
        tick_x(out, panel, x, &format!(r#"10<tspan dy="-6" font-size="8">{}</tspan>"#, k));
    }
}

fn log_ticks_y(out: &mut String, panel: &Panel, lo: f64, hi: f64) {
    for k in decades(lo, hi) {
        let y = panel.y(log_frac(10f64.powi(k), lo, hi));
        tick_y(out, panel, y, &format!(r#"10<tspan dy="-6" font-size="8">{}</tspan>"#, k));
    }
}

/// Integer powers of ten inside `[lo, hi]`
fn decades(lo: f64, hi: f64) -> Vec<i32> {
    if !(lo > 0.0 && hi >= lo) {
        return Vec::new();
    }
    let (first, last) = (lo.log10().ceil() as i32, hi.log10().floor() as i32);
    (first..=last).collect()
}

fn tick_x(out: &mut String, panel: &Panel, x: f64, label: &str) {
    let _ = write!(
        out,
        r##"<line x1="{x:.1}" y1="{b:.1}" x2="{x:.1}" y2="{t:.1}" stroke="#333"/><text x="{x:.1}" y="{ly:.1}" font-size="11" text-anchor="middle">{label}</text>"##,
        x = x,
        b = panel.bottom(),
        t = panel.bottom() + 5.0,
        ly = panel.bottom() + 20.0,
        label = label
    );
}

fn tick_y(out: &mut String, panel: &Panel, y: f64, label: &str) {
    let _ = write!(
        out,
        r##"<line x1="{l:.1}" y1="{y:.1}" x2="{r:.1}" y2="{y:.1}" stroke="#333"/><text x="{lx:.1}" y="{ty:.1}" font-size="11" text-anchor="end">{label}</text>"##,
        l = panel.left - 5.0,
        r = panel.left,
        y = y,
        lx = panel.left - 8.0,
        ty = y + 4.0,
        label = label
    );
}

/// Linear value ticks with light grid lines
fn linear_ticks_y(out: &mut String, panel: &Panel, max: f64, decimals: usize) {
    for i in 0..=Y_TICKS {
        let frac = i as f64 / Y_TICKS as f64;
        let y = panel.y(frac);
        let _ = write!(
            out,
            r##"<line x1="{:.1}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="#ddd"/>"##,
            panel.left,
            panel.left + panel.width,
            y = y
        );
        tick_y(out, panel, y, &format!("{:.*}", decimals, max * frac));
    }
}

fn series_line(out: &mut String, panel: &Panel, points: &[(f64, f64)], color: &str) {
    let coords: Vec<String> = points
        .iter()
        .map(|&(x, y)| format!("{:.1},{:.1}", panel.x(x), panel.y(y)))
        .collect();
    let _ = write!(
        out,
        r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="2" stroke-opacity="0.8"/>"#,
        coords.join(" "),
        color
    );
    // Markers keep single-bin histograms visible
    if points.len() == 1 {
        let (x, y) = points[0];
        let _ = write!(
            out,
            r#"<circle cx="{:.1}" cy="{:.1}" r="4" fill="{}"/>"#,
            panel.x(x),
            panel.y(y),
            color
        );
    }
}

fn legend(out: &mut String, panel: &Panel, entries: &[(&str, &str)]) {
    for (i, (label, color)) in entries.iter().enumerate() {
        let y = panel.top + 14.0 + i as f64 * 16.0;
        let x = panel.left + panel.width - 120.0;
        let _ = write!(
            out,
            r#"<line x1="{:.1}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="{}" stroke-width="2"/><text x="{:.1}" y="{:.1}" font-size="11">{}</text>"#,
            x,
            x + 18.0,
            color,
            x + 24.0,
            y + 4.0,
            label,
            y = y
        );
    }
}

/// Render the size histogram
///
/// **Public** - main entry point for the histogram figure
///
/// Left panel: operation count per bin. Right panel: total bytes per bin
/// in the histogram's auto-selected unit.
pub fn histogram_svg(hist: &SizeHistogram) -> String {
    let mut out = String::new();
    svg_open(&mut out, PANEL_WIDTH * 2.0, PANEL_HEIGHT);

    let (lo, hi) = match (hist.edges.first(), hist.edges.last()) {
        (Some(&lo), Some(&hi)) => (lo, hi),
        _ => (1.0, 10.0),
    };
    let centers = bin_centers(&hist.edges);
    let x_fracs: Vec<f64> = centers.iter().map(|&c| log_frac(c, lo, hi)).collect();

    let mut series: Vec<(&str, &str, &crate::binning::BinSeries)> =
        vec![("All Operations", SERIES_ALL, &hist.all)];
    if let Some(reads) = &hist.reads {
        series.push(("Reads", SERIES_READS, reads));
    }
    if let Some(writes) = &hist.writes {
        series.push(("Writes", SERIES_WRITES, writes));
    }
    let entries: Vec<(&str, &str)> = series.iter().map(|(l, c, _)| (*l, *c)).collect();

    // Count panel
    let panel = Panel::at(0);
    let max_count = hist.all.counts.iter().copied().max().unwrap_or(0).max(1) as f64;
    panel_frame(
        &mut out,
        &panel,
        "I/O Operation Count Distribution",
        "Bytes per Operation (log scale)",
        "Count of Operations",
    );
    linear_ticks_y(&mut out, &panel, max_count, 0);
    log_ticks_x(&mut out, &panel, lo, hi);
    for (_, color, s) in &series {
        let points: Vec<(f64, f64)> = x_fracs
            .iter()
            .zip(&s.counts)
            .map(|(&x, &c)| (x, c as f64 / max_count))
            .collect();
        series_line(&mut out, &panel, &points, color);
    }
    legend(&mut out, &panel, &entries);

    // Byte panel
    let panel = Panel::at(1);
    let unit = hist.byte_unit;
    let max_bytes = unit.scale(hist.all.max_bytes().max(1) as f64);
    panel_frame(
        &mut out,
        &panel,
        "I/O Total Bytes Distribution",
        "Bytes per Operation (log scale)",
        &format!("Total Bytes ({})", unit),
    );
    linear_ticks_y(&mut out, &panel, max_bytes, 1);
    log_ticks_x(&mut out, &panel, lo, hi);
    for (_, color, s) in &series {
        let points: Vec<(f64, f64)> = x_fracs
            .iter()
            .zip(&s.bytes)
            .map(|(&x, &b)| (x, unit.scale(b as f64) / max_bytes))
            .collect();
        series_line(&mut out, &panel, &points, color);
    }
    legend(&mut out, &panel, &entries);

    out.push_str("</svg>");
    debug!("Histogram SVG generated ({} bytes)", out.len());
    out
}

/// Color for a cell at `frac` of the panel maximum
fn viridis(frac: f64) -> String {
    let frac = if frac.is_finite() { frac.clamp(0.0, 1.0) } else { 0.0 };
    let scaled = frac * (VIRIDIS.len() - 1) as f64;
    let i = (scaled.floor() as usize).min(VIRIDIS.len() - 2);
    let t = scaled - i as f64;
    let (a, b) = (VIRIDIS[i], VIRIDIS[i + 1]);
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
    format!("rgb({}, {}, {})", mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

/// One heatmap panel over the shared grid
fn heatmap_panel(
    out: &mut String,
    panel: &Panel,
    bins: &TimeSeriesBins,
    cells: &[Vec<u64>],
    scale: f64,
    title: &str,
    value_label: &str,
) {
    let (t_hi, s_lo, s_hi) = (
        bins.time_edges.last().copied().unwrap_or(1.0),
        bins.size_edges.first().copied().unwrap_or(1.0),
        bins.size_edges.last().copied().unwrap_or(10.0),
    );
    let max = cells.iter().flatten().copied().max().unwrap_or(0).max(1) as f64;

    for (ti, row) in cells.iter().enumerate() {
        let x0 = panel.x(lin_frac(bins.time_edges[ti], 0.0, t_hi));
        let x1 = panel.x(lin_frac(bins.time_edges[ti + 1], 0.0, t_hi));
        for (si, &value) in row.iter().enumerate() {
            let y0 = panel.y(log_frac(bins.size_edges[si + 1], s_lo, s_hi));
            let y1 = panel.y(log_frac(bins.size_edges[si], s_lo, s_hi));
            let _ = write!(
                out,
                r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}"><title>{}</title></rect>"#,
                x0,
                y0,
                (x1 - x0).max(0.5),
                (y1 - y0).max(0.5),
                viridis(value as f64 / max),
                value as f64 / scale
            );
        }
    }

    let unit = bins.time_unit;
    panel_frame(
        out,
        panel,
        title,
        &format!("Time ({})", unit),
        "Bytes per Operation (log scale)",
    );
    for i in 0..=Y_TICKS {
        let seconds = t_hi * i as f64 / Y_TICKS as f64;
        let label = format!("{:.*}", unit.decimals(), unit.scale(seconds));
        tick_x(out, panel, panel.x(i as f64 / Y_TICKS as f64), &label);
    }
    log_ticks_y(out, panel, s_lo, s_hi);

    // Color bar
    let bar_x = panel.left + panel.width + 6.0;
    for step in 0..20 {
        let frac = step as f64 / 19.0;
        let _ = write!(
            out,
            r#"<rect x="{:.1}" y="{:.1}" width="10" height="{:.1}" fill="{}"/>"#,
            bar_x,
            panel.y((step + 1) as f64 / 20.0),
            panel.height / 20.0 + 0.5,
            viridis(frac)
        );
    }
    let _ = write!(
        out,
        r#"<text x="{:.1}" y="{:.1}" font-size="10" text-anchor="end">max {:.1} {}</text>"#,
        panel.left + panel.width,
        panel.top - 2.0,
        max / scale,
        escape_html(value_label)
    );
}

/// Render the time-series heatmap
///
/// **Public** - main entry point for the heatmap figure
pub fn heatmap_svg(bins: &TimeSeriesBins) -> String {
    let mut out = String::new();
    svg_open(&mut out, PANEL_WIDTH * 2.0, PANEL_HEIGHT);

    heatmap_panel(
        &mut out,
        &Panel::at(0),
        bins,
        &bins.counts,
        1.0,
        "I/O Operations Over Time",
        "ops",
    );

    let unit = bins.byte_unit;
    heatmap_panel(
        &mut out,
        &Panel::at(1),
        bins,
        &bins.bytes,
        unit.divisor(),
        "I/O Bytes Over Time",
        unit.label(),
    );

    out.push_str("</svg>");
    debug!("Heatmap SVG generated ({} bytes)", out.len());
    out
}
