//! Input/output helpers.
//!
//! - light-curve CSV and catalog JSON ingest (`ingest`)
//! - report JSON and spectrum/light-curve CSV exports (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
