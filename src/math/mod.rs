//! Mathematical utilities: basis functions, penalized least squares, quantiles.

pub mod basis;
pub mod ols;
pub mod quantile;

pub use basis::*;
pub use ols::*;
pub use quantile::*;
