//! Forecast model fitting.
//!
//! Responsibilities:
//!
//! - place changepoints and build the future date grid
//! - fit the additive trend + seasonality model by penalized least squares
//! - simulate prediction intervals
//!
//! Errors come in two classes. Value errors (`ForecastError::is_value_error`)
//! describe a series that cannot be fitted and are recoverable per segment;
//! everything else is a genuine failure.

use thiserror::Error;

pub mod changepoints;
pub mod fitter;
pub mod uncertainty;

pub use changepoints::*;
pub use fitter::*;
pub use uncertainty::*;

/// Errors raised by the forecasting model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Too few usable (non-missing) observations.
    #[error("insufficient data: need at least {needed} non-missing rows, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Every usable observation has the same value.
    #[error("series is constant (every value is {value}); nothing to fit")]
    ConstantSeries { value: f64 },

    /// All usable observations share one date, so time cannot be scaled.
    #[error("all observations fall on a single date ({date})")]
    SingleDate { date: chrono::NaiveDate },

    /// Invalid model setting.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Numerical failure (e.g. the least squares system could not be solved).
    #[error("computation error: {0}")]
    Computation(String),
}

impl ForecastError {
    /// True for failures caused by the segment's data rather than the model.
    pub fn is_value_error(&self) -> bool {
        matches!(
            self,
            ForecastError::InsufficientData { .. }
                | ForecastError::ConstantSeries { .. }
                | ForecastError::SingleDate { .. }
        )
    }
}
