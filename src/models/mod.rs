//! Additive forecasting model: layout, parameters and component evaluation.
//!
//! Models are implemented as small, pure functions so that the fitter and the
//! uncertainty simulation can stay generic.

pub mod model;

pub use model::*;
