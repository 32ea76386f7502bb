//! Command-line parsing for the `numax` estimator.
//!
//! Argument parsing and command dispatch stay separate from the numerical code;
//! `app` turns these structs into an [`EngineConfig`](crate::domain::EngineConfig).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::Mission;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "numax", version, about = "Multi-proxy νmax estimation for solar-like oscillators")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Estimate νmax from a light-curve CSV and print the estimate set.
    Run(RunArgs),
    /// Write a seeded synthetic light curve to CSV.
    Synth(SynthArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    /// Light-curve CSV with `time,flux[,flux_err]` columns (time in days).
    #[arg(value_name = "CSV")]
    pub input: PathBuf,

    /// Target identifier (`KIC ...` implies Kepler unless `--mission` is given).
    #[arg(long, default_value = "unknown")]
    pub target: String,

    /// Origin instrument for the FliPer mission feature.
    #[arg(long, value_enum)]
    pub mission: Option<Mission>,

    /// Flux is already in ppm; skip normalization.
    #[arg(long)]
    pub ppm: bool,

    /// Gaps longer than this (days) are closed.
    #[arg(long, default_value_t = 3.0)]
    pub gap_days: f64,

    /// Sigma-clip flux outliers at this many standard deviations.
    #[arg(long, default_value_t = 5.0)]
    pub clip_sigma: f64,

    /// Keep every finite sample (no sigma clipping).
    #[arg(long)]
    pub no_clip: bool,

    /// Add Gaussian white noise of this standard deviation (ppm) after preparation.
    #[arg(long, value_name = "PPM")]
    pub noise_std: Option<f64>,

    /// Seed for `--noise-std`.
    #[arg(long, default_value_t = 0)]
    pub noise_seed: u64,

    /// Spectral-window oversampling.
    #[arg(long, default_value_t = 5.0)]
    pub oversampling: f64,

    /// Use the chunk-averaged spectrum for the 2D ACF on long short-cadence data.
    #[arg(long)]
    pub average: bool,

    /// Chunk length (days) for the averaged spectrum.
    #[arg(long, default_value_t = 90.0)]
    pub chunk_days: f64,

    /// FliPer regression model (JSON); FliPer is skipped without one.
    #[arg(long, value_name = "JSON")]
    pub model: Option<PathBuf>,

    /// Disable the FliPer apodization correction.
    #[arg(long)]
    pub no_apodize: bool,

    /// Catalog record (JSON object of named columns) for the scaling relations.
    #[arg(long, value_name = "JSON")]
    pub catalog: Option<PathBuf>,

    /// Surface gravity (dex), used where the catalog has none.
    #[arg(long)]
    pub logg: Option<f64>,
    #[arg(long, default_value_t = 0.0)]
    pub logg_err: f64,

    /// Effective temperature (K).
    #[arg(long)]
    pub teff: Option<f64>,
    #[arg(long, default_value_t = 0.0)]
    pub teff_err: f64,

    /// Luminosity (L☉).
    #[arg(long)]
    pub luminosity: Option<f64>,
    #[arg(long, default_value_t = 0.0)]
    pub luminosity_err: f64,

    /// Mass (M☉).
    #[arg(long)]
    pub mass: Option<f64>,
    #[arg(long, default_value_t = 0.0)]
    pub mass_err: f64,

    /// Radius (R☉).
    #[arg(long)]
    pub radius: Option<f64>,
    #[arg(long, default_value_t = 0.0)]
    pub radius_err: f64,

    /// Export the estimate report to JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,

    /// Export the power spectrum to CSV.
    #[arg(long = "export-spectrum", value_name = "CSV")]
    pub export_spectrum: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct SynthArgs {
    /// Output CSV path.
    #[arg(value_name = "CSV")]
    pub output: PathBuf,

    #[arg(long, default_value_t = 100.0)]
    pub numax: f64,

    #[arg(long, default_value_t = 30.0)]
    pub days: f64,

    #[arg(long, default_value_t = 1800.0)]
    pub cadence: f64,

    /// Peak mode amplitude (ppm).
    #[arg(long, default_value_t = 50.0)]
    pub amplitude: f64,

    /// White-noise level (ppm).
    #[arg(long, default_value_t = 20.0)]
    pub noise: f64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}
