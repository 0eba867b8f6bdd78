//! Shared domain types.
//!
//! These types are kept small and plain so they can be:
//!
//! - built once from the CSV and shared read-only by every stage
//! - exported to CSV (`ForecastRow`)
//! - rendered by both the SVG writer and the terminal viewer

use std::fmt;
use std::path::PathBuf;

use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Default forecast horizon: three years of daily points.
pub const DEFAULT_HORIZON_DAYS: usize = 365 * 3;

/// One row of the sales table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub country: String,
    pub store: String,
    pub product: String,
    /// Units sold. `None` when the CSV cell is empty.
    pub num_sold: Option<u64>,
}

impl SalesRecord {
    pub fn segment_key(&self) -> SegmentKey {
        SegmentKey {
            country: self.country.clone(),
            store: self.store.clone(),
            product: self.product.clone(),
        }
    }

    pub fn month(&self) -> MonthKey {
        MonthKey::of(self.date)
    }
}

/// `(country, store, product)` identity of a segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentKey {
    pub country: String,
    pub store: String,
    pub product: String,
}

impl SegmentKey {
    pub fn new(country: impl Into<String>, store: impl Into<String>, product: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            store: store.into(),
            product: product.into(),
        }
    }

    /// File-name friendly form, e.g. `canada_discount_stickers_holographic_goose`.
    pub fn slug(&self) -> String {
        [&self.country, &self.store, &self.product]
            .iter()
            .map(|part| slugify(part))
            .collect::<Vec<_>>()
            .join("_")
    }
}

impl fmt::Display for SegmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.country, self.store, self.product)
    }
}

fn slugify(part: &str) -> String {
    let mut out = String::with_capacity(part.len());
    let mut last_sep = true;
    for ch in part.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_sep = false;
        } else if !last_sep {
            out.push('-');
            last_sep = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() { "x".to_string() } else { out }
}

/// Calendar month used by the monthly aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// One point of a forecast input series.
///
/// `(date, num_sold)` renamed to the generic `(ds, y)` pair the forecaster
/// works with. Missing sales stay missing (`y = None`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub ds: NaiveDate,
    pub y: Option<f64>,
}

impl Observation {
    pub fn from_sales_pair(date: NaiveDate, num_sold: Option<u64>) -> Self {
        Self {
            ds: date,
            y: num_sold.map(|v| v as f64),
        }
    }

    /// Inverse of [`Observation::from_sales_pair`].
    pub fn into_sales_pair(self) -> (NaiveDate, Option<u64>) {
        (self.ds, self.y.map(|v| v.round().max(0.0) as u64))
    }
}

/// Summary stats about the loaded table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetStats {
    pub n_rows: usize,
    pub n_missing: usize,
    pub date_min: NaiveDate,
    pub date_max: NaiveDate,
}

/// Trend shape of the forecasting model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Growth {
    /// Piecewise-linear trend with changepoints.
    Linear,
    /// Constant level.
    Flat,
}

/// Whether a seasonal component is fitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalityToggle {
    /// Decide from the history length and spacing.
    Auto,
    On,
    Off,
}

/// Forecasting model settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProphetConfig {
    pub growth: Growth,
    pub yearly: SeasonalityToggle,
    pub weekly: SeasonalityToggle,
    /// Maximum number of potential trend changepoints.
    pub n_changepoints: usize,
    /// Fraction of the history in which changepoints may be placed.
    pub changepoint_range: f64,
    /// Prior scale of changepoint magnitudes (larger = more flexible trend).
    pub changepoint_prior_scale: f64,
    /// Prior scale of the Fourier coefficients.
    pub seasonality_prior_scale: f64,
    /// Width of the prediction interval (0.8 = 10%..90% quantiles).
    pub interval_width: f64,
    /// Simulations used for the prediction interval; 0 disables it.
    pub uncertainty_samples: usize,
    pub seed: u64,
}

impl Default for ProphetConfig {
    fn default() -> Self {
        Self {
            growth: Growth::Linear,
            yearly: SeasonalityToggle::Auto,
            weekly: SeasonalityToggle::Auto,
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            interval_width: 0.8,
            uncertainty_samples: 1000,
            seed: 42,
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// Derived from CLI flags (plus environment / `.env` defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub data_path: PathBuf,
    pub out_dir: PathBuf,
    /// Future daily points appended past the last observed date.
    pub horizon: usize,
    /// Render per-segment forecast/components SVGs.
    pub plots: bool,
    /// Directory for per-segment forecast CSVs.
    pub export_dir: Option<PathBuf>,
    /// Only forecast the first N segments.
    pub limit: Option<usize>,
    pub model: ProphetConfig,
}

/// One predicted date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastRow {
    pub ds: NaiveDate,
    pub trend: f64,
    pub yearly: f64,
    pub weekly: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
    pub yhat: f64,
}

/// Predictions over the historical range plus the horizon, ordered by date.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub rows: Vec<ForecastRow>,
}

impl Forecast {
    /// Rows strictly after `last_history_date`.
    pub fn future(&self, last_history_date: NaiveDate) -> &[ForecastRow] {
        let start = self.rows.partition_point(|r| r.ds <= last_history_date);
        &self.rows[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn observation_round_trips_sales_pair() {
        let pairs = [(d(2010, 1, 1), Some(973)), (d(2010, 1, 2), None), (d(2010, 1, 3), Some(0))];
        for (date, n) in pairs {
            let obs = Observation::from_sales_pair(date, n);
            assert_eq!(obs.into_sales_pair(), (date, n));
        }
    }

    #[test]
    fn slug_is_filesystem_friendly() {
        let key = SegmentKey::new("Canada", "Discount Stickers", "Holographic Goose");
        assert_eq!(key.slug(), "canada_discount-stickers_holographic-goose");
        assert_eq!(key.to_string(), "(Canada, Discount Stickers, Holographic Goose)");

        let odd = SegmentKey::new("  ", "Kaggle/Store", "X");
        assert_eq!(odd.slug(), "x_kaggle-store_x");
    }

    #[test]
    fn month_key_orders_chronologically() {
        let a = MonthKey::of(d(2010, 12, 31));
        let b = MonthKey::of(d(2011, 1, 1));
        assert!(a < b);
        assert_eq!(a.to_string(), "2010-12");
    }

    #[test]
    fn forecast_future_starts_after_history() {
        let rows = (1..=5)
            .map(|day| ForecastRow {
                ds: d(2020, 1, day),
                trend: 0.0,
                yearly: 0.0,
                weekly: 0.0,
                yhat_lower: 0.0,
                yhat_upper: 0.0,
                yhat: 0.0,
            })
            .collect();
        let forecast = Forecast { rows };
        let future = forecast.future(d(2020, 1, 3));
        assert_eq!(future.len(), 2);
        assert_eq!(future[0].ds, d(2020, 1, 4));
    }
}
