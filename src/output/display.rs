//! Graphical vs plain-text presentation of a result.
//!
//! The decision is made on every display call, never cached. Graphical
//! output is one HTML fragment (table plus inline SVG charts) on stdout.
//! Plain output is the text table, with charts saved as SVG files.

use super::chart::{heatmap_svg, histogram_svg};
use super::notice::NoticeSink;
use super::svg::write_svg;
use super::table::{html_table, text_table};
use crate::aggregator::MeasurementResult;
use crate::binning::{compute_histogram, compute_timeseries, SizeHistogram, TimeSeriesBins};
use crate::utils::config::{DISPLAY_ENV_VAR, HEATMAP_FILE_NAME, HISTOGRAM_FILE_NAME};
use crate::utils::error::OutputError;
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Requested presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DisplayMode {
    /// Decide from the environment
    #[default]
    Auto,
    Html,
    Plain,
}

impl DisplayMode {
    pub fn is_graphical(&self) -> bool {
        match self {
            Self::Auto => is_graphical_environment(),
            Self::Html => true,
            Self::Plain => false,
        }
    }
}

/// Whether output should be rich HTML
///
/// `IOPS_PROFILER_DISPLAY=html|plain` wins; otherwise a Jupyter kernel
/// (`JPY_PARENT_PID`) counts as graphical and everything else as plain.
pub fn is_graphical_environment() -> bool {
    match env::var(DISPLAY_ENV_VAR) {
        Ok(mode) if mode.eq_ignore_ascii_case("html") => true,
        Ok(mode) if mode.eq_ignore_ascii_case("plain") => false,
        _ => env::var_os("JPY_PARENT_PID").is_some(),
    }
}

/// Presentation capabilities used by `display_result`
pub trait Renderer {
    fn render_table(&mut self, result: &MeasurementResult) -> Result<(), OutputError>;
    fn render_histogram(&mut self, hist: &SizeHistogram) -> Result<(), OutputError>;
    fn render_heatmap(&mut self, bins: &TimeSeriesBins) -> Result<(), OutputError>;
}

/// Plain text table; charts go to SVG files in `output_dir`
pub struct TerminalRenderer<W: Write> {
    out: W,
    output_dir: PathBuf,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            out,
            output_dir: output_dir.into(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn save(&mut self, svg: &str, file_name: &str, what: &str) -> Result<(), OutputError> {
        // Fixed names: repeated runs overwrite
        let path = self.output_dir.join(file_name);
        write_svg(svg, &path)?;
        writeln!(self.out, "📊 {} saved to: {}", what, path.display())?;
        Ok(())
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn render_table(&mut self, result: &MeasurementResult) -> Result<(), OutputError> {
        write!(self.out, "{}", text_table(result))?;
        Ok(())
    }

    fn render_histogram(&mut self, hist: &SizeHistogram) -> Result<(), OutputError> {
        self.save(&histogram_svg(hist), HISTOGRAM_FILE_NAME, "Histogram")
    }

    fn render_heatmap(&mut self, bins: &TimeSeriesBins) -> Result<(), OutputError> {
        self.save(&heatmap_svg(bins), HEATMAP_FILE_NAME, "Heatmap")
    }
}

/// HTML fragment with inline SVG charts
pub struct HtmlRenderer<W: Write> {
    out: W,
}

impl<W: Write> HtmlRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn figure(&mut self, svg: &str) -> Result<(), OutputError> {
        writeln!(self.out, "<div class=\"iops-chart\">\n{}\n</div>", svg)?;
        Ok(())
    }
}

impl<W: Write> Renderer for HtmlRenderer<W> {
    fn render_table(&mut self, result: &MeasurementResult) -> Result<(), OutputError> {
        write!(self.out, "{}", html_table(result))?;
        Ok(())
    }

    fn render_histogram(&mut self, hist: &SizeHistogram) -> Result<(), OutputError> {
        self.figure(&histogram_svg(hist))
    }

    fn render_heatmap(&mut self, bins: &TimeSeriesBins) -> Result<(), OutputError> {
        self.figure(&heatmap_svg(bins))
    }
}

/// Show a result: the table, then charts when per-operation events exist
///
/// **Public** - main entry point for presenting a measurement
///
/// A chart that cannot be drawn (no events, only zero-byte events, no
/// usable timestamps) becomes a notice; it never fails the display.
///
/// # Errors
/// Only write failures from the renderer.
pub fn display_result(
    result: &MeasurementResult,
    renderer: &mut dyn Renderer,
    notices: &mut dyn NoticeSink,
) -> Result<(), OutputError> {
    renderer.render_table(result)?;

    let Some(operations) = &result.operations else {
        return Ok(());
    };

    match compute_histogram(operations) {
        Ok(hist) => renderer.render_histogram(&hist)?,
        Err(no_data) => notices.notice(&no_data.notice("histogram")),
    }

    match compute_timeseries(operations, result.elapsed_time) {
        Ok(bins) => renderer.render_heatmap(&bins)?,
        Err(no_data) => notices.notice(&no_data.notice("heatmap")),
    }

    Ok(())
}

/// Renderer for the chosen mode writing to stdout
pub fn stdout_renderer(mode: DisplayMode, output_dir: &Path) -> Box<dyn Renderer> {
    if mode.is_graphical() {
        Box::new(HtmlRenderer::new(std::io::stdout()))
    } else {
        Box::new(TerminalRenderer::new(std::io::stdout(), output_dir))
    }
}
