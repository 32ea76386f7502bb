//! Light-curve preparation and synthetic data.
//!
//! - cleaning raw columns into a [`crate::domain::TimeSeries`] (`prepare`)
//! - seeded synthetic light curves and spectra (`synthetic`)

pub mod prepare;
pub mod synthetic;

pub use prepare::*;
pub use synthetic::*;
