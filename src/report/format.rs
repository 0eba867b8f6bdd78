//! Formatted terminal output.
//!
//! Everything printed to stdout is built here so output changes stay local.

use std::path::PathBuf;

use crate::domain::{DatasetStats, SegmentKey};
use crate::fit::ForecastError;
use crate::segment::SegmentIndex;

/// Outcome counts for one pass of the forecasting loop.
#[derive(Debug, Clone, Default)]
pub struct ForecastRunSummary {
    pub forecast: Vec<SegmentKey>,
    /// Segments whose data could not be fitted, with the reason.
    pub skipped: Vec<(SegmentKey, ForecastError)>,
    pub files: Vec<PathBuf>,
}

/// `label: ['a' 'b' 'c']` listing of distinct values.
pub fn format_unique_values(label: &str, values: &[String]) -> String {
    let quoted: Vec<String> = values.iter().map(|v| format!("'{v}'")).collect();
    format!("{label}: [{}]", quoted.join(" "))
}

/// One line per segment key, in iteration order.
pub fn format_segment_keys(index: &SegmentIndex, with_counts: bool) -> String {
    let mut out = format!("Segments ({}):", index.len());
    for seg in &index.segments {
        if with_counts {
            out.push_str(&format!("\n  {} rows={}", seg.key, seg.rows.len()));
        } else {
            out.push_str(&format!("\n  {}", seg.key));
        }
    }
    out
}

pub fn format_dataset_stats(stats: &DatasetStats) -> String {
    format!(
        "Rows: n={} | missing num_sold={} | dates=[{}, {}]",
        stats.n_rows, stats.n_missing, stats.date_min, stats.date_max
    )
}

/// Message printed when a segment is skipped.
pub fn format_segment_error(err: &ForecastError) -> String {
    format!("Error: {err}")
}

pub fn format_run_summary(summary: &ForecastRunSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Forecast {} segment(s), skipped {}.",
        summary.forecast.len(),
        summary.skipped.len()
    ));
    for (key, err) in &summary.skipped {
        out.push_str(&format!("\n  skipped {key}: {err}"));
    }
    if !summary.files.is_empty() {
        out.push_str(&format!("\nWrote {} file(s).", summary.files.len()));
    }
    out
}
