//! Domain types used throughout the pipeline.
//!
//! - light curves and spectra (`types`)
//! - uncertainty-carrying values (`measurement`)
//! - catalog stellar parameters (`stellar`)
//! - engine configuration (`config`)

pub mod config;
pub mod measurement;
pub mod stellar;
pub mod types;

pub use config::*;
pub use measurement::*;
pub use stellar::*;
pub use types::*;
