//! Simulated prediction intervals.
//!
//! Each sample draws:
//! - new trend changepoints past the end of the history (linear growth only), at the
//!   same average rate as the fitted ones, with Laplace magnitudes scaled like them
//! - Gaussian observation noise with the fitted `σ`
//!
//! Interval bounds are empirical quantiles of the sampled `yhat` per date.
//! The generator is seeded from the model settings, so intervals are reproducible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal, Poisson};

use crate::domain::Growth;
use crate::fit::fitter::FittedModel;
use crate::fit::ForecastError;
use crate::math::{hinge, quantile_sorted};
use crate::models::trend;

/// Added to the Laplace scale so a model without trend changes still samples.
const LAPLACE_SCALE_EPS: f64 = 1e-8;

/// Draw from `Laplace(0, scale)` by inverting its CDF.
fn sample_laplace<R: Rng>(rng: &mut R, scale: f64) -> f64 {
    let u: f64 = rng.gen_range(-0.5..0.5);
    let tail = (1.0 - 2.0 * u.abs()).max(f64::MIN_POSITIVE);
    -scale * u.signum() * tail.ln()
}

/// Future trend changes for one simulated path: `(location, rate change)` in scaled time.
fn sample_future_changes<R: Rng>(
    rng: &mut R,
    rate: f64,
    t_max: f64,
    laplace_scale: f64,
) -> Result<Vec<(f64, f64)>, ForecastError> {
    if t_max <= 1.0 || rate <= 0.0 {
        return Ok(Vec::new());
    }
    let lambda = rate * (t_max - 1.0);
    let poisson = Poisson::new(lambda)
        .map_err(|e| ForecastError::Computation(format!("changepoint rate {lambda}: {e}")))?;
    let n_changes = poisson.sample(rng) as usize;
    Ok((0..n_changes)
        .map(|_| {
            let at = 1.0 + rng.gen_range(0.0..1.0) * (t_max - 1.0);
            (at, sample_laplace(rng, laplace_scale))
        })
        .collect())
}

/// `(lower, upper)` bounds for every scaled time in `t`, in original units.
///
/// `seasonal_scaled[i]` is the combined scaled seasonal component at `t[i]`.
pub fn predictive_intervals(
    model: &FittedModel,
    t: &[f64],
    seasonal_scaled: &[f64],
) -> Result<Vec<(f64, f64)>, ForecastError> {
    if t.len() != seasonal_scaled.len() {
        return Err(ForecastError::Computation(
            "time and seasonal component lengths differ".to_string(),
        ));
    }
    let config = &model.config;
    let n_samples = config.uncertainty_samples;
    if n_samples == 0 || t.is_empty() {
        return Ok(Vec::new());
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let noise = Normal::new(0.0, model.sigma)
        .map_err(|e| ForecastError::Computation(format!("noise distribution: {e}")))?;

    let t_max = t.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let deltas = &model.params.deltas;
    let rate = match model.layout.growth {
        Growth::Linear => model.layout.changepoints.len() as f64,
        Growth::Flat => 0.0,
    };
    let laplace_scale = if deltas.is_empty() {
        LAPLACE_SCALE_EPS
    } else {
        deltas.iter().map(|d| d.abs()).sum::<f64>() / deltas.len() as f64 + LAPLACE_SCALE_EPS
    };

    let base: Vec<f64> = t
        .iter()
        .zip(seasonal_scaled)
        .map(|(&ti, &s)| trend(&model.layout, &model.params, ti) + s)
        .collect();

    // samples[i * n_samples + s]
    let cells = t.len().checked_mul(n_samples).ok_or_else(|| {
        ForecastError::InvalidParameter(format!(
            "{n_samples} uncertainty samples over {} dates overflows the sample buffer",
            t.len()
        ))
    })?;
    let mut samples: Vec<f64> = Vec::new();
    samples.try_reserve_exact(cells).map_err(|e| {
        ForecastError::InvalidParameter(format!(
            "cannot allocate {n_samples} uncertainty samples over {} dates: {e}",
            t.len()
        ))
    })?;
    samples.resize(cells, 0.0);
    for s in 0..n_samples {
        let changes = sample_future_changes(&mut rng, rate, t_max, laplace_scale)?;
        for (i, &ti) in t.iter().enumerate() {
            let extra: f64 = changes.iter().map(|&(at, d)| d * hinge(ti, at)).sum();
            samples[i * n_samples + s] = (base[i] + extra + noise.sample(&mut rng)) * model.scaling.y_scale;
        }
    }

    let lower_q = (1.0 - config.interval_width) / 2.0;
    let upper_q = 1.0 - lower_q;
    let mut out = Vec::with_capacity(t.len());
    for chunk in samples.chunks_mut(n_samples) {
        chunk.sort_by(f64::total_cmp);
        let lo = quantile_sorted(chunk, lower_q);
        let hi = quantile_sorted(chunk, upper_q);
        match (lo, hi) {
            (Some(lo), Some(hi)) if lo.is_finite() && hi.is_finite() => out.push((lo, hi)),
            _ => {
                return Err(ForecastError::Computation(
                    "non-finite prediction interval".to_string(),
                ));
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Observation, ProphetConfig};
    use crate::fit::fit;
    use chrono::{Days, NaiveDate};

    #[test]
    fn laplace_samples_are_symmetric_with_expected_spread() {
        let mut rng = StdRng::seed_from_u64(7);
        let draws: Vec<f64> = (0..20_000).map(|_| sample_laplace(&mut rng, 2.0)).collect();
        let mean = draws.iter().sum::<f64>() / draws.len() as f64;
        let mean_abs = draws.iter().map(|d| d.abs()).sum::<f64>() / draws.len() as f64;
        assert!(mean.abs() < 0.1, "mean={mean}");
        // E|X| = scale for a Laplace distribution.
        assert!((mean_abs - 2.0).abs() < 0.1, "mean_abs={mean_abs}");
        assert!(draws.iter().all(|d| d.is_finite()));
    }

    #[test]
    fn no_future_changes_inside_history() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(sample_future_changes(&mut rng, 25.0, 1.0, 0.1).unwrap().is_empty());
        assert!(sample_future_changes(&mut rng, 0.0, 3.0, 0.1).unwrap().is_empty());

        for _ in 0..50 {
            for (at, _) in sample_future_changes(&mut rng, 25.0, 1.5, 0.1).unwrap() {
                assert!((1.0..=1.5).contains(&at));
            }
        }
    }

    #[test]
    fn oversized_sample_buffer_is_rejected() {
        let start = NaiveDate::from_ymd_opt(2012, 1, 1).unwrap();
        let series: Vec<Observation> = (0..60)
            .map(|i| Observation {
                ds: start + Days::new(i),
                y: Some(5.0 + i as f64),
            })
            .collect();
        let config = ProphetConfig {
            uncertainty_samples: 0,
            ..ProphetConfig::default()
        };
        let mut model = fit(&series, &config).unwrap();

        model.config.uncertainty_samples = usize::MAX;
        let err = predictive_intervals(&model, &[0.5, 1.0], &[0.0, 0.0]).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidParameter(_)), "{err:?}");
        assert!(!err.is_value_error());

        model.config.uncertainty_samples = usize::MAX / 2;
        let err = predictive_intervals(&model, &[1.0], &[0.0]).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidParameter(_)), "{err:?}");
    }
}
