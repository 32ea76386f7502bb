//! Seeded synthetic light curves and oscillation spectra.
//!
//! Both generators place a comb of modes (radial orders spaced by `Δν`, with a
//! dipole comb offset by `Δν / 2`) under a Gaussian envelope centered on
//! `ν_max`. The spectrum generator works directly in the frequency domain and
//! multiplies the limit spectrum by χ²₂ noise; the light-curve generator sums
//! sinusoids with random phases and adds white noise.
//!
//! Every generator takes an explicit seed, so tests are reproducible.

use std::f64::consts::PI;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Exp1, Normal};

use crate::domain::{DAY_SECONDS, Spectrum, TimeSeries};
use crate::error::NumaxError;
use crate::spectrum::frequency_grid;

/// Empirical large separation `Δν ≈ 0.263 ν_max^0.772` (μHz).
pub fn delta_nu_from_numax(numax_uhz: f64) -> f64 {
    0.263 * numax_uhz.powf(0.772)
}

/// Envelope FWHM `0.66 ν_max^0.88` (μHz).
pub fn envelope_fwhm(numax_uhz: f64) -> f64 {
    0.66 * numax_uhz.powf(0.88)
}

#[derive(Debug, Clone)]
pub struct SyntheticSpectrum {
    pub numax_uhz: f64,
    /// Defaults to the empirical relation when `None`.
    pub delta_nu_uhz: Option<f64>,
    pub spacing_uhz: f64,
    pub max_frequency_uhz: f64,
    pub linewidth_uhz: f64,
    /// Peak mode height relative to a unit background.
    pub height: f64,
    /// Background level (flat).
    pub background: f64,
    /// Multiply by χ²₂ noise.
    pub noisy: bool,
    pub seed: u64,
}

impl Default for SyntheticSpectrum {
    fn default() -> Self {
        Self {
            numax_uhz: 100.0,
            delta_nu_uhz: None,
            spacing_uhz: 0.05,
            max_frequency_uhz: 283.0,
            linewidth_uhz: 0.15,
            height: 30.0,
            background: 1.0,
            noisy: true,
            seed: 42,
        }
    }
}

/// `(frequency, relative height)` of radial/dipole pairs within ±3σ of `ν_max`.
fn mode_comb(numax: f64, delta_nu: f64) -> Vec<(f64, f64)> {
    let sigma = envelope_fwhm(numax) / (8.0 * 2f64.ln()).sqrt();
    let lo = ((numax - 3.0 * sigma) / delta_nu).floor().max(1.0) as i64;
    let hi = ((numax + 3.0 * sigma) / delta_nu).ceil() as i64;
    let envelope = |nu: f64| (-(nu - numax).powi(2) / (2.0 * sigma * sigma)).exp();

    let mut modes = Vec::new();
    for n in lo..=hi {
        // ε ≈ 1.3 places radial modes off the integer grid, as in real stars.
        let radial = delta_nu * (n as f64 + 1.3);
        let dipole = radial + 0.5 * delta_nu;
        modes.push((radial, envelope(radial)));
        modes.push((dipole, 1.5 * envelope(dipole)));
    }
    modes
}

/// Limit spectrum (optionally χ²₂-noisy) with a Lorentzian mode comb.
pub fn synthetic_spectrum(cfg: &SyntheticSpectrum) -> Result<Spectrum, NumaxError> {
    if !(cfg.numax_uhz > 0.0 && cfg.spacing_uhz > 0.0 && cfg.max_frequency_uhz > cfg.spacing_uhz) {
        return Err(NumaxError::invalid_config("synthetic spectrum needs positive numax, spacing and range"));
    }
    let delta_nu = cfg.delta_nu_uhz.unwrap_or_else(|| delta_nu_from_numax(cfg.numax_uhz));
    let modes = mode_comb(cfg.numax_uhz, delta_nu);
    let half_width = 0.5 * cfg.linewidth_uhz;

    let frequency = frequency_grid(cfg.spacing_uhz, cfg.spacing_uhz, cfg.max_frequency_uhz);
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let power = frequency
        .iter()
        .map(|&f| {
            let modes: f64 = modes
                .iter()
                .map(|&(nu, h)| h / (1.0 + ((f - nu) / half_width).powi(2)))
                .sum();
            let limit = cfg.background + cfg.height * modes;
            if cfg.noisy {
                let chi2: f64 = rng.sample(Exp1);
                limit * chi2
            } else {
                limit
            }
        })
        .collect();

    Spectrum::new(frequency, power)
}

#[derive(Debug, Clone)]
pub struct SyntheticLightCurve {
    pub days: f64,
    pub cadence_seconds: f64,
    pub numax_uhz: f64,
    /// Peak mode amplitude, ppm.
    pub amplitude_ppm: f64,
    pub white_noise_ppm: f64,
    pub seed: u64,
}

impl Default for SyntheticLightCurve {
    fn default() -> Self {
        Self {
            days: 30.0,
            cadence_seconds: 1800.0,
            numax_uhz: 100.0,
            amplitude_ppm: 50.0,
            white_noise_ppm: 20.0,
            seed: 42,
        }
    }
}

/// A regularly sampled light curve in ppm (time in days, starting at 0).
pub fn synthetic_light_curve(cfg: &SyntheticLightCurve) -> Result<TimeSeries, NumaxError> {
    if !(cfg.days > 0.0 && cfg.cadence_seconds > 0.0) {
        return Err(NumaxError::invalid_config("synthetic light curve needs positive length and cadence"));
    }
    let dt = cfg.cadence_seconds / DAY_SECONDS;
    let n = (cfg.days / dt).floor() as usize;
    let time: Vec<f64> = (0..n).map(|i| i as f64 * dt).collect();

    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let modes: Vec<(f64, f64, f64)> = mode_comb(cfg.numax_uhz, delta_nu_from_numax(cfg.numax_uhz))
        .into_iter()
        .map(|(nu, rel)| (nu * 1e-6, cfg.amplitude_ppm * rel.sqrt(), rng.gen_range(0.0..2.0 * PI)))
        .collect();
    let noise = white_noise(cfg.white_noise_ppm)?;

    let flux: Vec<f64> = time
        .iter()
        .map(|&t| {
            let ts = t * DAY_SECONDS;
            let signal: f64 = modes.iter().map(|&(f, a, phi)| a * (2.0 * PI * f * ts + phi).sin()).sum();
            signal + noise.sample(&mut rng)
        })
        .collect();

    let flux_err = vec![cfg.white_noise_ppm.max(1e-3); n];
    TimeSeries::new(time, flux, Some(flux_err))
}

/// A copy of `ts` with Gaussian white noise of `std_ppm` added to the flux.
pub fn add_white_noise(ts: &TimeSeries, std_ppm: f64, seed: u64) -> Result<TimeSeries, NumaxError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = white_noise(std_ppm)?;
    let flux = ts.flux().iter().map(|f| f + noise.sample(&mut rng)).collect();
    ts.with_flux(flux)
}

fn white_noise(std: f64) -> Result<Normal<f64>, NumaxError> {
    Normal::new(0.0, std).map_err(|e| NumaxError::invalid_config(format!("noise distribution error: {e}")))
}
