//! Basis functions for the additive forecasting model.
//!
//! - Fourier terms for a seasonality of period `P` (days) and order `N`:
//!   `sin(2π·1·d/P), cos(2π·1·d/P), …, sin(2π·N·d/P), cos(2π·N·d/P)`
//!   where `d` is the day number since the Unix epoch.
//! - Hinge terms for the piecewise-linear trend: `(t - s)₊`.

use std::f64::consts::PI;

use chrono::{Datelike, NaiveDate};

/// `num_days_from_ce()` of 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Day number since 1970-01-01 (the seasonal clock).
pub fn epoch_days(date: NaiveDate) -> f64 {
    (date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE) as f64
}

/// Fill `out` (length `2 * order`) with interleaved sin/cos Fourier terms.
///
/// # Panics
/// Panics if `out.len() != 2 * order`.
pub fn fourier_terms(day: f64, period: f64, order: usize, out: &mut [f64]) {
    assert_eq!(out.len(), 2 * order, "fourier buffer must hold 2*order terms");
    for i in 0..order {
        let x = 2.0 * PI * (i + 1) as f64 * day / period;
        out[2 * i] = x.sin();
        out[2 * i + 1] = x.cos();
    }
}

/// Ramp that is zero before the changepoint `s` and grows with slope 1 after it.
pub fn hinge(t: f64, s: f64) -> f64 {
    (t - s).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_days_counts_from_1970() {
        assert_eq!(epoch_days(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()), 0.0);
        assert_eq!(epoch_days(NaiveDate::from_ymd_opt(1970, 1, 8).unwrap()), 7.0);
    }

    #[test]
    fn fourier_terms_repeat_every_period() {
        let mut a = vec![0.0; 6];
        let mut b = vec![0.0; 6];
        fourier_terms(3.0, 7.0, 3, &mut a);
        fourier_terms(3.0 + 7.0 * 40.0, 7.0, 3, &mut b);
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-9);
        }
        // cos(0) = 1 at day 0.
        fourier_terms(0.0, 365.25, 3, &mut a);
        assert!((a[1] - 1.0).abs() < 1e-12);
        assert!(a[0].abs() < 1e-12);
    }

    #[test]
    fn hinge_is_zero_before_changepoint() {
        assert_eq!(hinge(0.2, 0.5), 0.0);
        assert!((hinge(0.75, 0.5) - 0.25).abs() < 1e-12);
    }
}
