//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - input rows (`SalesRecord`) and grouping keys (`SegmentKey`, `MonthKey`)
//! - the forecaster's input/output shapes (`Observation`, `Forecast`)
//! - run and model configuration (`RunConfig`, `ProphetConfig`)

pub mod types;

pub use types::*;
