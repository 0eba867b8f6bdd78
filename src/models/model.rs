//! Additive trend + seasonality model evaluation.
//!
//! The fitter relies on two primitive operations:
//! - build a design row for a given scaled time `t` and seasonal day number (for least squares)
//! - evaluate trend / seasonal components given fitted parameters (for predictions and plots)
//!
//! Parameter vector layout:
//! - linear growth: `[k, m, δ_1..δ_C, β_1..β_F]`
//! - flat growth:   `[m, β_1..β_F]`
//!
//! where `δ` are changepoint slope adjustments and `β` the Fourier coefficients
//! of every seasonality in order.

use serde::{Deserialize, Serialize};

use crate::domain::Growth;
use crate::math::{fourier_terms, hinge};

/// Seasonal components supported by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalityKind {
    Yearly,
    Weekly,
}

impl SeasonalityKind {
    pub fn period_days(self) -> f64 {
        match self {
            SeasonalityKind::Yearly => 365.25,
            SeasonalityKind::Weekly => 7.0,
        }
    }

    pub fn default_order(self) -> usize {
        match self {
            SeasonalityKind::Yearly => 10,
            SeasonalityKind::Weekly => 3,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            SeasonalityKind::Yearly => "yearly",
            SeasonalityKind::Weekly => "weekly",
        }
    }
}

/// A fitted Fourier seasonality.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Seasonality {
    pub kind: SeasonalityKind,
    pub period: f64,
    pub order: usize,
}

impl Seasonality {
    pub fn new(kind: SeasonalityKind) -> Self {
        Self {
            kind,
            period: kind.period_days(),
            order: kind.default_order(),
        }
    }

    pub fn len(&self) -> usize {
        2 * self.order
    }

    pub fn is_empty(&self) -> bool {
        self.order == 0
    }
}

/// Shape of the model: growth, changepoint locations (scaled time) and seasonalities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelLayout {
    pub growth: Growth,
    pub changepoints: Vec<f64>,
    pub seasonalities: Vec<Seasonality>,
}

impl ModelLayout {
    /// Number of trend parameters (`k, m, δ…` or just `m`).
    pub fn trend_len(&self) -> usize {
        match self.growth {
            Growth::Linear => 2 + self.changepoints.len(),
            Growth::Flat => 1,
        }
    }

    /// Trend parameters that carry no shrinkage prior beyond a weak one.
    pub fn unpenalized_len(&self) -> usize {
        match self.growth {
            Growth::Linear => 2,
            Growth::Flat => 1,
        }
    }

    pub fn seasonal_len(&self) -> usize {
        self.seasonalities.iter().map(Seasonality::len).sum()
    }

    pub fn param_len(&self) -> usize {
        self.trend_len() + self.seasonal_len()
    }

    /// `(offset into β, length)` of a seasonality, if present.
    pub fn seasonal_range(&self, kind: SeasonalityKind) -> Option<(usize, usize)> {
        let mut offset = 0;
        for s in &self.seasonalities {
            if s.kind == kind {
                return Some((offset, s.len()));
            }
            offset += s.len();
        }
        None
    }

    pub fn has(&self, kind: SeasonalityKind) -> bool {
        self.seasonal_range(kind).is_some()
    }

    /// Fill a design row for scaled time `t` and seasonal day number `day`.
    ///
    /// # Panics
    /// Panics if `out.len() != self.param_len()`.
    pub fn fill_design_row(&self, t: f64, day: f64, out: &mut [f64]) {
        assert_eq!(out.len(), self.param_len(), "design row length mismatch");
        let mut j = 0;
        match self.growth {
            Growth::Linear => {
                out[0] = t;
                out[1] = 1.0;
                j = 2;
                for &s in &self.changepoints {
                    out[j] = hinge(t, s);
                    j += 1;
                }
            }
            Growth::Flat => {
                out[0] = 1.0;
                j += 1;
            }
        }
        for s in &self.seasonalities {
            fourier_terms(day, s.period, s.order, &mut out[j..j + s.len()]);
            j += s.len();
        }
    }
}

/// Fitted parameters on the scaled problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    /// Base growth rate (0 for flat growth).
    pub k: f64,
    /// Offset.
    pub m: f64,
    /// Rate adjustments at each changepoint.
    pub deltas: Vec<f64>,
    /// Fourier coefficients of all seasonalities.
    pub betas: Vec<f64>,
}

impl ModelParams {
    /// Split a solved parameter vector according to `layout`.
    ///
    /// # Panics
    /// Panics if `theta.len() != layout.param_len()`.
    pub fn from_theta(layout: &ModelLayout, theta: &[f64]) -> Self {
        assert_eq!(theta.len(), layout.param_len(), "parameter vector length mismatch");
        let trend_len = layout.trend_len();
        let (k, m, deltas) = match layout.growth {
            Growth::Linear => (theta[0], theta[1], theta[2..trend_len].to_vec()),
            Growth::Flat => (0.0, theta[0], Vec::new()),
        };
        Self {
            k,
            m,
            deltas,
            betas: theta[trend_len..].to_vec(),
        }
    }
}

/// Piecewise-linear trend `k·t + m + Σ δ_j (t - s_j)₊` on scaled values.
pub fn piecewise_linear(t: f64, k: f64, m: f64, changepoints: &[f64], deltas: &[f64]) -> f64 {
    let mut y = k * t + m;
    for (&s, &d) in changepoints.iter().zip(deltas.iter()) {
        y += d * hinge(t, s);
    }
    y
}

/// Scaled trend value at `t`.
pub fn trend(layout: &ModelLayout, params: &ModelParams, t: f64) -> f64 {
    match layout.growth {
        Growth::Linear => piecewise_linear(t, params.k, params.m, &layout.changepoints, &params.deltas),
        Growth::Flat => params.m,
    }
}

/// Scaled contribution of one seasonality at seasonal day `day` (0 if absent).
pub fn seasonal(layout: &ModelLayout, params: &ModelParams, kind: SeasonalityKind, day: f64) -> f64 {
    let Some((offset, len)) = layout.seasonal_range(kind) else {
        return 0.0;
    };
    let Some(s) = layout.seasonalities.iter().find(|s| s.kind == kind) else {
        return 0.0;
    };
    let mut terms = vec![0.0; len];
    fourier_terms(day, s.period, s.order, &mut terms);
    terms
        .iter()
        .zip(params.betas[offset..offset + len].iter())
        .map(|(x, b)| x * b)
        .sum()
}
