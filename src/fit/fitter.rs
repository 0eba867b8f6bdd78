//! Fitting the additive trend + seasonality model for one series.
//!
//! Given a date-sorted series of `(ds, y)` observations we:
//! - scale time to `[0, 1]` over the history and `y` by its maximum absolute value
//! - place potential changepoints and choose seasonalities
//! - solve a ridge-penalized least squares problem for all parameters
//!
//! The penalties encode the model's priors: changepoint rate adjustments are
//! shrunk with scale `changepoint_prior_scale`, Fourier coefficients with
//! `seasonality_prior_scale`, and the base rate/offset with a weak scale of 5.
//! Each penalty is relative to the noise level `σ`, which is unknown up front:
//! a first pass uses `σ = 1`, the second pass uses the residual spread of the first.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use nalgebra::{DMatrix, DVector};

use crate::domain::{Forecast, ForecastRow, Growth, Observation, ProphetConfig, SeasonalityToggle};
use crate::fit::changepoints::{changepoint_indices, future_dates};
use crate::fit::uncertainty::predictive_intervals;
use crate::fit::ForecastError;
use crate::math::{epoch_days, solve_penalized};
use crate::models::{seasonal, trend, ModelLayout, ModelParams, Seasonality, SeasonalityKind};

/// Minimum number of extra observations beyond the unpenalized parameter count.
pub const MIN_N_BUFFER: usize = 5;

/// Prior scale of the base growth rate and offset.
const RATE_PRIOR_SCALE: f64 = 5.0;

/// Lower bound on the scaled noise level.
const SIGMA_FLOOR: f64 = 1e-3;

/// History span (days) from which yearly seasonality is fitted automatically.
const YEARLY_AUTO_MIN_SPAN: i64 = 730;

/// History span (days) from which weekly seasonality is fitted automatically.
const WEEKLY_AUTO_MIN_SPAN: i64 = 14;

/// Reference year for the weekly and yearly component profiles.
const PROFILE_YEAR: i32 = 2017;

/// Linear maps between calendar/units and the scaled problem.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaling {
    /// First usable history date (`t = 0`).
    pub start: NaiveDate,
    /// History span in days (`t = 1` at the last usable date).
    pub t_scale_days: f64,
    /// Maximum absolute observed value.
    pub y_scale: f64,
}

impl Scaling {
    pub fn t(&self, date: NaiveDate) -> f64 {
        (date - self.start).num_days() as f64 / self.t_scale_days
    }
}

/// A model fitted to one series.
#[derive(Debug, Clone)]
pub struct FittedModel {
    pub config: ProphetConfig,
    pub layout: ModelLayout,
    pub params: ModelParams,
    pub scaling: Scaling,
    /// Residual standard deviation on the scaled problem.
    pub sigma: f64,
    /// In-sample root mean squared error in original units.
    pub rmse: f64,
    /// Usable (non-missing) observations, sorted by date.
    pub history: Vec<Observation>,
    /// Every distinct history date, including dates whose value is missing.
    pub history_dates: Vec<NaiveDate>,
}

impl ProphetConfig {
    /// Reject settings outside their meaningful range.
    pub fn validate(&self) -> Result<(), ForecastError> {
        if !(self.changepoint_range.is_finite() && self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "changepoint_range must be in (0, 1], got {}",
                self.changepoint_range
            )));
        }
        if !(self.changepoint_prior_scale.is_finite() && self.changepoint_prior_scale > 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "changepoint_prior_scale must be > 0, got {}",
                self.changepoint_prior_scale
            )));
        }
        if !(self.seasonality_prior_scale.is_finite() && self.seasonality_prior_scale > 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "seasonality_prior_scale must be > 0, got {}",
                self.seasonality_prior_scale
            )));
        }
        if !(self.interval_width.is_finite() && self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "interval_width must be in (0, 1), got {}",
                self.interval_width
            )));
        }
        Ok(())
    }
}

/// Minimum usable rows for a growth mode.
pub fn min_observations(growth: Growth) -> usize {
    let unpenalized = match growth {
        Growth::Linear => 2,
        Growth::Flat => 1,
    };
    unpenalized + MIN_N_BUFFER
}

/// Fit a model to `series`.
///
/// Rows with a missing (or non-finite) `y` are not fitted, but their dates remain
/// part of the history range used by [`FittedModel::make_future_dates`].
pub fn fit(series: &[Observation], config: &ProphetConfig) -> Result<FittedModel, ForecastError> {
    config.validate()?;

    let mut history_dates: Vec<NaiveDate> = series.iter().map(|o| o.ds).collect();
    history_dates.sort();
    history_dates.dedup();

    let mut history: Vec<Observation> = series
        .iter()
        .filter(|o| o.y.is_some_and(f64::is_finite))
        .copied()
        .collect();
    history.sort_by_key(|o| o.ds);

    let needed = min_observations(config.growth);
    if history.len() < needed {
        return Err(ForecastError::InsufficientData {
            needed,
            got: history.len(),
        });
    }

    let y: Vec<f64> = history.iter().map(|o| o.y.unwrap_or(0.0)).collect();
    let start = history[0].ds;
    let end = history[history.len() - 1].ds;
    if start == end {
        return Err(ForecastError::SingleDate { date: start });
    }
    if y.iter().all(|&v| v == y[0]) {
        return Err(ForecastError::ConstantSeries { value: y[0] });
    }

    let y_scale = y.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let scaling = Scaling {
        start,
        t_scale_days: (end - start).num_days() as f64,
        y_scale,
    };

    let t: Vec<f64> = history.iter().map(|o| scaling.t(o.ds)).collect();
    let days: Vec<f64> = history.iter().map(|o| epoch_days(o.ds)).collect();
    let y_scaled: Vec<f64> = y.iter().map(|v| v / y_scale).collect();

    let changepoints = match config.growth {
        Growth::Linear => changepoint_indices(history.len(), config.n_changepoints, config.changepoint_range)
            .into_iter()
            .map(|i| t[i])
            .collect(),
        Growth::Flat => Vec::new(),
    };
    let layout = ModelLayout {
        growth: config.growth,
        changepoints,
        seasonalities: resolve_seasonalities(config, &history),
    };

    let n = history.len();
    let p = layout.param_len();
    let mut x = DMatrix::<f64>::zeros(n, p);
    let mut row = vec![0.0; p];
    for i in 0..n {
        layout.fill_design_row(t[i], days[i], &mut row);
        for j in 0..p {
            x[(i, j)] = row[j];
        }
    }
    let yv = DVector::from_vec(y_scaled);

    // Pass 1 with unit noise, pass 2 with the residual noise of pass 1.
    let mut sigma = 1.0;
    let mut theta = DVector::<f64>::zeros(p);
    for _ in 0..2 {
        let penalties = penalty_weights(&layout, config, sigma);
        theta = solve_penalized(&x, &yv, &penalties).ok_or_else(|| {
            ForecastError::Computation("penalized least squares system could not be solved".to_string())
        })?;
        sigma = residual_std(&x, &yv, &theta).max(SIGMA_FLOOR);
    }

    let sse_scaled = {
        let r = &yv - &x * &theta;
        r.dot(&r)
    };
    if !sse_scaled.is_finite() {
        return Err(ForecastError::Computation("non-finite residuals after fitting".to_string()));
    }

    let params = ModelParams::from_theta(&layout, theta.as_slice());
    let rmse = (sse_scaled / n as f64).sqrt() * y_scale;

    Ok(FittedModel {
        config: config.clone(),
        layout,
        params,
        scaling,
        sigma,
        rmse,
        history,
        history_dates,
    })
}

fn penalty_weights(layout: &ModelLayout, config: &ProphetConfig, sigma: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(layout.param_len());
    for _ in 0..layout.unpenalized_len() {
        out.push(sigma / RATE_PRIOR_SCALE);
    }
    for _ in 0..layout.changepoints.len() {
        out.push(sigma / config.changepoint_prior_scale);
    }
    for _ in 0..layout.seasonal_len() {
        out.push(sigma / config.seasonality_prior_scale);
    }
    out
}

fn residual_std(x: &DMatrix<f64>, y: &DVector<f64>, theta: &DVector<f64>) -> f64 {
    let r = y - x * theta;
    (r.dot(&r) / y.len() as f64).sqrt()
}

fn resolve_seasonalities(config: &ProphetConfig, history: &[Observation]) -> Vec<Seasonality> {
    let first = history[0].ds;
    let last = history[history.len() - 1].ds;
    let span = (last - first).num_days();
    let min_spacing = history
        .windows(2)
        .map(|w| (w[1].ds - w[0].ds).num_days())
        .filter(|&d| d > 0)
        .min()
        .unwrap_or(i64::MAX);

    let yearly = match config.yearly {
        SeasonalityToggle::On => true,
        SeasonalityToggle::Off => false,
        SeasonalityToggle::Auto => span >= YEARLY_AUTO_MIN_SPAN,
    };
    let weekly = match config.weekly {
        SeasonalityToggle::On => true,
        SeasonalityToggle::Off => false,
        SeasonalityToggle::Auto => span >= WEEKLY_AUTO_MIN_SPAN && min_spacing < 7,
    };

    let mut out = Vec::new();
    if yearly {
        out.push(Seasonality::new(SeasonalityKind::Yearly));
    }
    if weekly {
        out.push(Seasonality::new(SeasonalityKind::Weekly));
    }
    out
}

impl FittedModel {
    pub fn last_history_date(&self) -> NaiveDate {
        // `fit` guarantees at least one usable row, hence one history date.
        self.history_dates
            .last()
            .copied()
            .unwrap_or(self.scaling.start)
    }

    /// History dates extended by `periods` daily dates.
    pub fn make_future_dates(&self, periods: usize) -> Result<Vec<NaiveDate>, ForecastError> {
        future_dates(&self.history_dates, periods)
    }

    /// Unscaled trend at `date`.
    pub fn trend_at(&self, date: NaiveDate) -> f64 {
        trend(&self.layout, &self.params, self.scaling.t(date)) * self.scaling.y_scale
    }

    /// Unscaled seasonal component at `date` (0 if the model has none of that kind).
    pub fn seasonal_at(&self, kind: SeasonalityKind, date: NaiveDate) -> f64 {
        seasonal(&self.layout, &self.params, kind, epoch_days(date)) * self.scaling.y_scale
    }

    /// Predict every date in `dates`, with intervals when enabled.
    pub fn predict(&self, dates: &[NaiveDate]) -> Result<Forecast, ForecastError> {
        let y_scale = self.scaling.y_scale;
        let t: Vec<f64> = dates.iter().map(|&d| self.scaling.t(d)).collect();

        let mut rows = Vec::with_capacity(dates.len());
        let mut seasonal_scaled = Vec::with_capacity(dates.len());
        for (&ds, &ti) in dates.iter().zip(t.iter()) {
            let day = epoch_days(ds);
            let trend_s = trend(&self.layout, &self.params, ti);
            let yearly_s = seasonal(&self.layout, &self.params, SeasonalityKind::Yearly, day);
            let weekly_s = seasonal(&self.layout, &self.params, SeasonalityKind::Weekly, day);
            let yhat = (trend_s + yearly_s + weekly_s) * y_scale;
            if !yhat.is_finite() {
                return Err(ForecastError::Computation(format!("non-finite prediction at {ds}")));
            }
            seasonal_scaled.push(yearly_s + weekly_s);
            rows.push(ForecastRow {
                ds,
                trend: trend_s * y_scale,
                yearly: yearly_s * y_scale,
                weekly: weekly_s * y_scale,
                yhat_lower: yhat,
                yhat_upper: yhat,
                yhat,
            });
        }

        if self.config.uncertainty_samples > 0 {
            let bounds = predictive_intervals(self, &t, &seasonal_scaled)?;
            for (row, (lo, hi)) in rows.iter_mut().zip(bounds) {
                row.yhat_lower = lo;
                row.yhat_upper = hi;
            }
        }

        Ok(Forecast { rows })
    }

    /// Weekly component over one reference week, Sunday first.
    pub fn weekly_profile(&self) -> Option<Vec<(Weekday, f64)>> {
        if !self.layout.has(SeasonalityKind::Weekly) {
            return None;
        }
        // 2017-01-01 is a Sunday.
        let sunday = NaiveDate::from_ymd_opt(PROFILE_YEAR, 1, 1)?;
        Some(
            (0..7)
                .filter_map(|i| sunday.checked_add_days(Days::new(i)))
                .map(|d| (d.weekday(), self.seasonal_at(SeasonalityKind::Weekly, d)))
                .collect(),
        )
    }

    /// Yearly component for every day of one reference (non-leap) year.
    pub fn yearly_profile(&self) -> Option<Vec<(NaiveDate, f64)>> {
        if !self.layout.has(SeasonalityKind::Yearly) {
            return None;
        }
        let jan1 = NaiveDate::from_ymd_opt(PROFILE_YEAR, 1, 1)?;
        Some(
            (0..365)
                .filter_map(|i| jan1.checked_add_days(Days::new(i)))
                .map(|d| (d, self.seasonal_at(SeasonalityKind::Yearly, d)))
                .collect(),
        )
    }
}
