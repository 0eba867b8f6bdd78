//! Chart drawing shared by the SVG writer and the terminal viewer.
//!
//! Every chart is a plain function over any Plotters `DrawingBackend`, so the
//! same code renders into an SVG file and into a Ratatui buffer. Only the
//! [`ChartTheme`] differs between the two.

use std::fs;
use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::error::AppError;

pub mod forecast;
pub mod overview;

pub use forecast::*;
pub use overview::*;

/// Pixel size of every SVG file.
pub const SVG_SIZE: (u32, u32) = (1400, 900);

/// Colors and sizes for one rendering target.
#[derive(Debug, Clone, Copy)]
pub struct ChartTheme {
    /// Background fill (`None` leaves the target untouched).
    pub background: Option<RGBColor>,
    pub text: RGBColor,
    pub axis: RGBColor,
    pub history: RGBColor,
    pub forecast: RGBColor,
    pub band: RGBColor,
    pub bar: RGBColor,
    pub font_size: u32,
    pub caption_size: u32,
    pub margin: u32,
    pub x_label_area: u32,
    pub y_label_area: u32,
    /// Left label area for horizontal bar charts (category names).
    pub bar_label_area: u32,
    /// Draw observations as circles; otherwise single pixels.
    pub markers: bool,
    pub mesh: bool,
}

impl ChartTheme {
    /// Light theme for SVG files.
    pub const PAPER: ChartTheme = ChartTheme {
        background: Some(RGBColor(255, 255, 255)),
        text: RGBColor(30, 30, 30),
        axis: RGBColor(90, 90, 90),
        history: RGBColor(40, 40, 40),
        forecast: RGBColor(0, 114, 178),
        band: RGBColor(86, 180, 233),
        bar: RGBColor(0, 158, 115),
        font_size: 14,
        caption_size: 20,
        margin: 16,
        x_label_area: 40,
        y_label_area: 70,
        bar_label_area: 170,
        markers: true,
        mesh: true,
    };

    /// High-contrast theme for terminal cells.
    ///
    /// Circles are avoided: the terminal backend scales circle radii
    /// incorrectly, so observations are drawn as pixels.
    pub const TERMINAL: ChartTheme = ChartTheme {
        background: None,
        text: RGBColor(255, 255, 255),
        axis: RGBColor(255, 255, 255),
        history: RGBColor(255, 255, 255),
        forecast: RGBColor(0, 255, 255),
        band: RGBColor(0, 110, 160),
        bar: RGBColor(0, 255, 0),
        font_size: 10,
        caption_size: 10,
        margin: 1,
        x_label_area: 3,
        y_label_area: 6,
        bar_label_area: 14,
        markers: false,
        mesh: false,
    };
}

/// Value range of `values` with 5% padding, falling back to `[0, 1]`.
pub fn padded_bounds(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for v in values.into_iter().filter(|v| v.is_finite()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if hi <= lo {
        let pad = lo.abs().max(1.0) * 0.05;
        return (lo - pad, hi + pad);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

/// Compact tick label for sales counts (`1.2M`, `35k`, `120`).
pub fn format_count(v: f64) -> String {
    let a = v.abs();
    if a >= 1e6 {
        format!("{:.1}M", v / 1e6)
    } else if a >= 1e4 {
        format!("{:.0}k", v / 1e3)
    } else {
        format!("{v:.0}")
    }
}

pub(crate) fn font(theme: &ChartTheme, size: u32) -> TextStyle<'static> {
    ("sans-serif", size).into_font().color(&theme.text)
}

/// Render one SVG file with `draw`, creating the parent directory if needed.
pub fn render_svg<F>(path: &Path, draw: F) -> Result<(), AppError>
where
    F: FnOnce(&DrawingArea<SVGBackend<'_>, Shift>) -> Result<(), DrawingAreaErrorKind<std::io::Error>>,
{
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::new(4, format!("Failed to create directory {}: {e}", parent.display()))
            })?;
        }
    }

    let root = SVGBackend::new(path, SVG_SIZE).into_drawing_area();
    draw(&root).map_err(|e| AppError::new(4, format!("Failed to render {}: {e}", path.display())))?;
    root.present()
        .map_err(|e| AppError::new(4, format!("Failed to write {}: {e}", path.display())))?;
    tracing::debug!(path = %path.display(), "wrote chart");
    Ok(())
}
