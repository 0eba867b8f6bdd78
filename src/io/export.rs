//! Export per-segment forecasts to CSV.
//!
//! One file per segment, one row per predicted date, meant to be easy to open
//! in spreadsheets or downstream scripts.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{Forecast, SegmentKey};
use crate::error::AppError;

/// Write `forecast` to `<dir>/<segment slug>_forecast.csv` and return the path.
pub fn write_forecast_csv(dir: &Path, key: &SegmentKey, forecast: &Forecast) -> Result<PathBuf, AppError> {
    fs::create_dir_all(dir)
        .map_err(|e| AppError::new(4, format!("Failed to create export dir '{}': {e}", dir.display())))?;
    let path = dir.join(format!("{}_forecast.csv", key.slug()));

    let mut writer = csv::Writer::from_path(&path)
        .map_err(|e| AppError::new(4, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    for row in &forecast.rows {
        writer
            .serialize(row)
            .map_err(|e| AppError::new(4, format!("Failed to write export CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(4, format!("Failed to flush export CSV: {e}")))?;

    Ok(path)
}
