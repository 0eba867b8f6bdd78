//! Input/output helpers.
//!
//! - sales CSV ingest (`ingest`)
//! - per-segment forecast CSV export (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
