//! `numax-proxies` library crate.
//!
//! Estimates νmax, the frequency of maximum oscillation power, from a star's
//! light curve with four independent proxies and collects them into one
//! estimate set. The binary (`numax`) is a thin wrapper around this library so
//! that:
//!
//! - the pipeline is testable without spawning processes
//! - the proxies are reusable on pre-built spectra
//! - front-end concerns (CLI, files) stay out of the numerics

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod ensemble;
pub mod error;
pub mod io;
pub mod math;
pub mod proxies;
pub mod report;
pub mod spectrum;
