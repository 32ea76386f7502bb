//! Spectral estimation and normalization.
//!
//! - [`compute_spectrum`]: least-squares periodogram on a window-derived grid
//! - [`averaged_spectrum`]: chunk-averaged periodogram for long, dense series
//! - [`relative_power`]: moving-median flattening used by the ACF proxy

pub mod averaged;
pub mod lomb_scargle;
pub mod normalize;
pub mod window;

pub use averaged::*;
pub use lomb_scargle::*;
pub use normalize::*;
pub use window::*;

use crate::domain::{Spectrum, SpectrumConfig, TimeSeries};
use crate::error::NumaxError;

/// Power spectrum of a cleaned series, from the effective resolution up to
/// (but excluding) the Nyquist frequency.
///
/// Frequencies are in μHz; power is PSD in flux² units.
pub fn compute_spectrum(ts: &TimeSeries, cfg: &SpectrumConfig) -> Result<Spectrum, NumaxError> {
    let nyquist = ts.nyquist_uhz();
    let spacing = frequency_spacing(ts, cfg)?;
    let frequency = frequency_grid(spacing, spacing, nyquist);
    if frequency.is_empty() {
        return Err(NumaxError::invalid_input(format!(
            "series too short: resolution {spacing:.4} μHz is not below Nyquist {nyquist:.4} μHz"
        )));
    }

    let ls = LombScargle::new(&ts.time_seconds(), ts.flux(), Some(ts.flux_err()));
    let power = ls.power_uniform(spacing * 1e-6, spacing * 1e-6, frequency.len());
    log::debug!(
        "spectrum: {} bins, {:.4}–{:.4} μHz",
        frequency.len(),
        frequency[0],
        frequency[frequency.len() - 1]
    );

    Spectrum::new(frequency, power)
}

/// `start + k · step` for `k = 0, 1, …` while strictly below `limit`.
pub fn frequency_grid(start: f64, step: f64, limit: f64) -> Vec<f64> {
    if !(start.is_finite() && step.is_finite() && step > 0.0 && limit.is_finite()) {
        return Vec::new();
    }
    (0..)
        .map(|k| start + step * k as f64)
        .take_while(|f| *f < limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synthetic_light_curve;
    use crate::data::SyntheticLightCurve;

    #[test]
    fn grid_stops_below_limit() {
        let g = frequency_grid(0.5, 0.5, 2.0);
        assert_eq!(g, vec![0.5, 1.0, 1.5]);
        assert!(frequency_grid(1.0, 0.0, 2.0).is_empty());
        assert!(frequency_grid(3.0, 1.0, 2.0).is_empty());
    }

    #[test]
    fn frequencies_increase_within_nyquist() {
        let ts = synthetic_light_curve(&SyntheticLightCurve {
            days: 20.0,
            cadence_seconds: 1800.0,
            ..SyntheticLightCurve::default()
        })
        .unwrap();
        let spec = compute_spectrum(&ts, &SpectrumConfig::default()).unwrap();
        let nyq = ts.nyquist_uhz();

        assert!(spec.frequency().windows(2).all(|w| w[1] > w[0]));
        assert!(spec.min_frequency() > 0.0);
        assert!(spec.max_frequency() <= nyq);
        assert!(spec.power().iter().all(|p| p.is_finite() && *p >= 0.0));
    }

    #[test]
    fn repeated_runs_are_bit_identical() {
        let ts = synthetic_light_curve(&SyntheticLightCurve {
            days: 10.0,
            cadence_seconds: 1800.0,
            seed: 7,
            ..SyntheticLightCurve::default()
        })
        .unwrap();
        let cfg = SpectrumConfig::default();
        let a = compute_spectrum(&ts, &cfg).unwrap();
        let b = compute_spectrum(&ts, &cfg).unwrap();

        let bits = |v: &[f64]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(a.frequency()), bits(b.frequency()));
        assert_eq!(bits(a.power()), bits(b.power()));
    }

    #[test]
    fn two_samples_cannot_resolve_anything() {
        let ts = TimeSeries::new(vec![0.0, 0.01], vec![1.0, -1.0], None).unwrap();
        assert!(compute_spectrum(&ts, &SpectrumConfig::default()).is_err());
    }
}
