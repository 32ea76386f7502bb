//! Numerical building blocks shared by the spectral estimator and the proxies.
//!
//! - descriptive statistics (`stats`)
//! - moving-median filtering (`filter`)
//! - Simpson quadrature (`integrate`)
//! - Levenberg–Marquardt curve fitting (`lm`)

pub mod filter;
pub mod integrate;
pub mod lm;
pub mod stats;

pub use filter::*;
pub use integrate::*;
pub use lm::*;
pub use stats::*;
