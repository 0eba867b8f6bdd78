//! Changepoint placement and horizon date grids.
//!
//! Both grids are deterministic given the same history:
//! - potential changepoints sit on evenly spaced observation indices inside the
//!   first `changepoint_range` fraction of the history
//! - the future frame is every history date followed by `periods` consecutive days

use chrono::{Days, NaiveDate};

use crate::fit::ForecastError;

/// `n` evenly spaced points between `start` and `end` (inclusive).
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n as f64 - 1.0);
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Observation indices (into a date-sorted history of `n_rows`) used as changepoints.
///
/// With `hist_size = floor(n_rows * range)`, at most `hist_size - 1` changepoints
/// are placed at `round(linspace(0, hist_size - 1, n_cp + 1))`, dropping the first.
pub fn changepoint_indices(n_rows: usize, n_changepoints: usize, changepoint_range: f64) -> Vec<usize> {
    let hist_size = (n_rows as f64 * changepoint_range).floor() as usize;
    let n_cp = n_changepoints.min(hist_size.saturating_sub(1));
    if n_cp == 0 {
        return Vec::new();
    }
    linspace(0.0, (hist_size - 1) as f64, n_cp + 1)
        .into_iter()
        .skip(1)
        .map(|x| x.round_ties_even() as usize)
        .collect()
}

/// History dates followed by `periods` daily dates after the last one.
///
/// `history` must be sorted ascending and free of duplicates.
pub fn future_dates(history: &[NaiveDate], periods: usize) -> Result<Vec<NaiveDate>, ForecastError> {
    let Some(&last) = history.last() else {
        return Err(ForecastError::InvalidParameter(
            "cannot extend an empty history".to_string(),
        ));
    };

    last.checked_add_days(Days::new(periods as u64)).ok_or_else(|| {
        ForecastError::InvalidParameter(format!("horizon of {periods} days overflows the calendar"))
    })?;

    let mut out = Vec::with_capacity(history.len() + periods);
    out.extend_from_slice(history);
    out.extend((1..=periods as u64).filter_map(|i| last.checked_add_days(Days::new(i))));
    Ok(out)
}
