//! Core data types shared by the spectral estimator and the proxies.
//!
//! - [`TimeSeries`]: a cleaned light curve (time in days, flux in ppm)
//! - [`Spectrum`]: a power spectrum (frequency in μHz)
//! - [`Mission`]: origin instrument, used as a regression feature

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::NumaxError;
use crate::math::{mean, median};

/// Seconds per day.
pub const DAY_SECONDS: f64 = 86_400.0;

/// A cleaned, time-ordered light curve.
///
/// Invariants (checked by [`TimeSeries::new`]):
/// - at least two samples
/// - `time`, `flux` and `flux_err` have equal length
/// - time and flux are finite, time strictly increasing
///
/// Missing or unusable uncertainties are stored as `NaN`; the spectral estimator
/// falls back to uniform weights for them.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    time: Vec<f64>,
    flux: Vec<f64>,
    flux_err: Vec<f64>,
}

impl TimeSeries {
    pub fn new(time: Vec<f64>, flux: Vec<f64>, flux_err: Option<Vec<f64>>) -> Result<Self, NumaxError> {
        if time.len() < 2 {
            return Err(NumaxError::invalid_input(format!(
                "time series needs at least 2 samples, got {}",
                time.len()
            )));
        }
        if flux.len() != time.len() {
            return Err(NumaxError::invalid_input(format!(
                "flux length {} does not match time length {}",
                flux.len(),
                time.len()
            )));
        }
        let flux_err = match flux_err {
            Some(err) if err.len() != time.len() => {
                return Err(NumaxError::invalid_input(format!(
                    "flux_err length {} does not match time length {}",
                    err.len(),
                    time.len()
                )));
            }
            Some(err) => err,
            None => vec![f64::NAN; time.len()],
        };
        if let Some(i) = time.iter().position(|t| !t.is_finite()) {
            return Err(NumaxError::invalid_input(format!("non-finite time at index {i}")));
        }
        if let Some(i) = flux.iter().position(|f| !f.is_finite()) {
            return Err(NumaxError::invalid_input(format!("non-finite flux at index {i}")));
        }
        if let Some(i) = time.windows(2).position(|w| w[1] <= w[0]) {
            return Err(NumaxError::invalid_input(format!(
                "time must be strictly increasing (t[{}]={} >= t[{}]={})",
                i,
                time[i],
                i + 1,
                time[i + 1]
            )));
        }

        Ok(Self { time, flux, flux_err })
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn flux(&self) -> &[f64] {
        &self.flux
    }

    pub fn flux_err(&self) -> &[f64] {
        &self.flux_err
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Time in seconds, as stored (no re-zeroing).
    pub fn time_seconds(&self) -> Vec<f64> {
        self.time.iter().map(|t| t * DAY_SECONDS).collect()
    }

    /// Total time span in days.
    pub fn baseline_days(&self) -> f64 {
        self.time[self.time.len() - 1] - self.time[0]
    }

    /// Mean sampling interval in seconds.
    pub fn mean_cadence_seconds(&self) -> f64 {
        self.baseline_days() * DAY_SECONDS / (self.time.len() - 1) as f64
    }

    /// Median sampling interval in days.
    pub fn median_cadence_days(&self) -> f64 {
        let diffs: Vec<f64> = self.time.windows(2).map(|w| w[1] - w[0]).collect();
        median(&diffs).unwrap_or(f64::NAN)
    }

    /// Nyquist frequency `1 / (2 <dt>)` in μHz.
    pub fn nyquist_uhz(&self) -> f64 {
        1e6 / (2.0 * self.mean_cadence_seconds())
    }

    /// A contiguous sub-series `[start, end)`.
    pub fn slice(&self, start: usize, end: usize) -> Result<TimeSeries, NumaxError> {
        if start >= end || end > self.len() {
            return Err(NumaxError::invalid_input(format!(
                "invalid slice {start}..{end} of series with {} samples",
                self.len()
            )));
        }
        TimeSeries::new(
            self.time[start..end].to_vec(),
            self.flux[start..end].to_vec(),
            Some(self.flux_err[start..end].to_vec()),
        )
    }

    /// Same sampling with a replaced flux vector.
    pub fn with_flux(&self, flux: Vec<f64>) -> Result<TimeSeries, NumaxError> {
        TimeSeries::new(self.time.clone(), flux, Some(self.flux_err.clone()))
    }
}

/// A power spectrum on a strictly increasing frequency grid (μHz).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    frequency: Vec<f64>,
    power: Vec<f64>,
    /// Optional smoothed baseline, for diagnostics only.
    filter: Option<Vec<f64>>,
}

impl Spectrum {
    pub fn new(frequency: Vec<f64>, power: Vec<f64>) -> Result<Self, NumaxError> {
        if frequency.is_empty() {
            return Err(NumaxError::invalid_input("spectrum is empty"));
        }
        if frequency.len() != power.len() {
            return Err(NumaxError::invalid_input(format!(
                "spectrum frequency length {} does not match power length {}",
                frequency.len(),
                power.len()
            )));
        }
        if frequency.iter().any(|f| !f.is_finite()) {
            return Err(NumaxError::invalid_input("spectrum frequencies must be finite"));
        }
        if frequency.windows(2).any(|w| w[1] <= w[0]) {
            return Err(NumaxError::invalid_input("spectrum frequencies must be strictly increasing"));
        }
        Ok(Self {
            frequency,
            power,
            filter: None,
        })
    }

    /// Attach a diagnostic filter sequence (must match the grid length).
    pub fn with_filter(mut self, filter: Vec<f64>) -> Result<Self, NumaxError> {
        if filter.len() != self.frequency.len() {
            return Err(NumaxError::invalid_input(format!(
                "filter length {} does not match spectrum length {}",
                filter.len(),
                self.frequency.len()
            )));
        }
        self.filter = Some(filter);
        Ok(self)
    }

    pub fn frequency(&self) -> &[f64] {
        &self.frequency
    }

    pub fn power(&self) -> &[f64] {
        &self.power
    }

    pub fn filter(&self) -> Option<&[f64]> {
        self.filter.as_deref()
    }

    pub fn len(&self) -> usize {
        self.frequency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequency.is_empty()
    }

    pub fn min_frequency(&self) -> f64 {
        self.frequency[0]
    }

    pub fn max_frequency(&self) -> f64 {
        self.frequency[self.frequency.len() - 1]
    }

    /// Median bin spacing; `NaN` for a single-bin spectrum.
    pub fn median_spacing(&self) -> f64 {
        let diffs: Vec<f64> = self.frequency.windows(2).map(|w| w[1] - w[0]).collect();
        median(&diffs).unwrap_or(f64::NAN)
    }

    /// Mean bin spacing; `NaN` for a single-bin spectrum.
    pub fn mean_spacing(&self) -> f64 {
        let diffs: Vec<f64> = self.frequency.windows(2).map(|w| w[1] - w[0]).collect();
        mean(&diffs).unwrap_or(f64::NAN)
    }

    /// Sampling attenuation `sinc(ν / 2ν_Nyq)` per bin (normalized sinc).
    pub fn attenuation(&self, nyquist_uhz: f64) -> Vec<f64> {
        self.frequency
            .iter()
            .map(|&f| normalized_sinc(0.5 * f / nyquist_uhz))
            .collect()
    }
}

fn normalized_sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        let px = std::f64::consts::PI * x;
        px.sin() / px
    }
}

/// Origin instrument of the light curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mission {
    Kepler,
    Tess,
}

impl Mission {
    /// Numeric indicator used as a regression feature.
    pub fn flag(self) -> f64 {
        match self {
            Mission::Kepler => 0.0,
            Mission::Tess => 1.0,
        }
    }

    /// Kepler for `KIC` identifiers, TESS for everything else.
    pub fn from_target_id(id: &str) -> Self {
        if id.to_ascii_uppercase().contains("KIC") {
            Mission::Kepler
        } else {
            Mission::Tess
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Mission::Kepler => "Kepler",
            Mission::Tess => "TESS",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_series_rejects_bad_input() {
        assert!(TimeSeries::new(vec![0.0], vec![1.0], None).is_err());
        assert!(TimeSeries::new(vec![0.0, 1.0], vec![1.0], None).is_err());
        assert!(TimeSeries::new(vec![0.0, 0.0], vec![1.0, 2.0], None).is_err());
        assert!(TimeSeries::new(vec![1.0, 0.5], vec![1.0, 2.0], None).is_err());
        assert!(TimeSeries::new(vec![0.0, 1.0], vec![1.0, f64::NAN], None).is_err());
        assert!(TimeSeries::new(vec![0.0, 1.0], vec![1.0, 2.0], Some(vec![1.0])).is_err());
    }

    #[test]
    fn cadence_and_nyquist() {
        // 30-minute cadence -> Nyquist ~277.78 μHz.
        let dt = 1800.0 / DAY_SECONDS;
        let time: Vec<f64> = (0..100).map(|i| i as f64 * dt).collect();
        let ts = TimeSeries::new(time, vec![0.0; 100], None).unwrap();
        assert!((ts.mean_cadence_seconds() - 1800.0).abs() < 1e-6);
        assert!((ts.nyquist_uhz() - 1e6 / 3600.0).abs() < 1e-6);
        assert!(ts.flux_err().iter().all(|e| e.is_nan()));
    }

    #[test]
    fn spectrum_requires_increasing_grid() {
        assert!(Spectrum::new(vec![], vec![]).is_err());
        assert!(Spectrum::new(vec![1.0, 1.0], vec![1.0, 1.0]).is_err());
        let s = Spectrum::new(vec![1.0, 2.0, 4.0], vec![1.0, 1.0, 1.0]).unwrap();
        assert_eq!(s.median_spacing(), 1.5);
        assert!(s.clone().with_filter(vec![0.0]).is_err());
        assert!(s.with_filter(vec![0.0; 3]).unwrap().filter().is_some());
    }

    #[test]
    fn mission_from_identifier() {
        assert_eq!(Mission::from_target_id("KIC 12008916"), Mission::Kepler);
        assert_eq!(Mission::from_target_id("kic6116048"), Mission::Kepler);
        assert_eq!(Mission::from_target_id("TIC 100"), Mission::Tess);
        assert_eq!(Mission::Kepler.flag(), 0.0);
        assert_eq!(Mission::Tess.flag(), 1.0);
    }
}
