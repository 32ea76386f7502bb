//! Engine configuration.
//!
//! Every tunable constant of the pipeline lives here with its default. The
//! `numax` binary derives an [`EngineConfig`] from CLI flags; library users
//! usually start from `EngineConfig::default()`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::Mission;
use crate::error::NumaxError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub prepare: PrepareConfig,
    pub spectrum: SpectrumConfig,
    pub normalizer: NormalizerConfig,
    pub acf: AcfConfig,
    pub cov: CovConfig,
    pub fliper: FliperConfig,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), NumaxError> {
        self.prepare.validate()?;
        self.spectrum.validate()?;
        self.normalizer.validate()?;
        self.acf.validate()?;
        self.cov.validate()?;
        self.fliper.validate()
    }
}

/// Light-curve preparation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepareConfig {
    /// Convert flux to ppm around its median.
    pub normalize_to_ppm: bool,
    /// Gaps longer than this (days) are closed.
    pub gap_threshold_days: f64,
    /// Sigma-clip flux outliers at this many standard deviations; `None` keeps every sample.
    pub outlier_sigma: Option<f64>,
    pub outlier_max_iters: usize,
    /// Gaussian white noise (ppm) added to the prepared flux.
    pub noise_std_ppm: Option<f64>,
    pub noise_seed: u64,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self {
            normalize_to_ppm: true,
            gap_threshold_days: 3.0,
            outlier_sigma: Some(5.0),
            outlier_max_iters: 5,
            noise_std_ppm: None,
            noise_seed: 0,
        }
    }
}

impl PrepareConfig {
    fn validate(&self) -> Result<(), NumaxError> {
        if !(self.gap_threshold_days.is_finite() && self.gap_threshold_days > 0.0) {
            return Err(NumaxError::invalid_config("gap_threshold_days must be > 0"));
        }
        if let Some(sigma) = self.outlier_sigma {
            if !(sigma.is_finite() && sigma > 0.0) {
                return Err(NumaxError::invalid_config("outlier_sigma must be > 0"));
            }
        }
        if let Some(std) = self.noise_std_ppm {
            if !(std.is_finite() && std >= 0.0) {
                return Err(NumaxError::invalid_config("noise_std_ppm must be >= 0"));
            }
        }
        Ok(())
    }
}

/// Spectral estimator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumConfig {
    /// Oversampling of the spectral window grid.
    pub oversampling: f64,
    /// Window integration half-width, in units of `1 / baseline`.
    pub window_width_factor: f64,
    /// Compute the chunk-averaged spectrum when the series qualifies.
    pub average: bool,
    pub chunk_days: f64,
    /// Averaging requires a baseline longer than this...
    pub average_min_baseline_days: f64,
    /// ...and a mean cadence shorter than this.
    pub average_max_cadence_seconds: f64,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            oversampling: 5.0,
            window_width_factor: 100.0,
            average: false,
            chunk_days: 90.0,
            average_min_baseline_days: 365.0,
            average_max_cadence_seconds: 120.0,
        }
    }
}

impl SpectrumConfig {
    fn validate(&self) -> Result<(), NumaxError> {
        if !(self.oversampling.is_finite() && self.oversampling >= 1.0) {
            return Err(NumaxError::invalid_config("spectrum oversampling must be >= 1"));
        }
        if !(self.window_width_factor.is_finite() && self.window_width_factor > 0.0) {
            return Err(NumaxError::invalid_config("window_width_factor must be > 0"));
        }
        if !(self.chunk_days.is_finite() && self.chunk_days > 0.0) {
            return Err(NumaxError::invalid_config("chunk_days must be > 0"));
        }
        Ok(())
    }
}

/// Relative-power normalizer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// Spectra extending past this frequency use the wide window.
    pub regime_threshold_uhz: f64,
    pub wide_window_uhz: f64,
    pub narrow_window_uhz: f64,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            regime_threshold_uhz: 300.0,
            wide_window_uhz: 100.0,
            narrow_window_uhz: 10.0,
        }
    }
}

impl NormalizerConfig {
    fn validate(&self) -> Result<(), NumaxError> {
        if !(self.wide_window_uhz > 0.0 && self.narrow_window_uhz > 0.0) {
            return Err(NumaxError::invalid_config("normalizer windows must be > 0"));
        }
        Ok(())
    }
}

/// Two-dimensional autocorrelation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcfConfig {
    /// Above this extent: wide windows and FFT autocorrelation.
    pub regime_threshold_uhz: f64,
    pub wide_window_uhz: f64,
    pub wide_overlap_uhz: f64,
    pub narrow_window_uhz: f64,
    pub narrow_overlap_uhz: f64,
    /// Step used when the computed step rounds to zero bins.
    pub failsafe_step_bins: usize,
    /// Levenberg–Marquardt iteration cap for the Gaussian fit.
    pub max_fit_iterations: usize,
}

impl Default for AcfConfig {
    fn default() -> Self {
        Self {
            regime_threshold_uhz: 500.0,
            wide_window_uhz: 250.0,
            wide_overlap_uhz: 249.0,
            narrow_window_uhz: 50.0,
            narrow_overlap_uhz: 45.0,
            failsafe_step_bins: 10,
            max_fit_iterations: 800,
        }
    }
}

impl AcfConfig {
    fn validate(&self) -> Result<(), NumaxError> {
        if !(self.wide_overlap_uhz < self.wide_window_uhz && self.narrow_overlap_uhz < self.narrow_window_uhz) {
            return Err(NumaxError::invalid_config("ACF overlap must be smaller than the window"));
        }
        if self.failsafe_step_bins == 0 {
            return Err(NumaxError::invalid_config("failsafe_step_bins must be > 0"));
        }
        Ok(())
    }
}

/// Coefficient-of-variation settings (empirical mode-density relations).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CovConfig {
    pub start_uhz: f64,
    /// Bin width `a · ν^b`.
    pub width_coeff: f64,
    pub width_exponent: f64,
    /// Bin centers advance by `width / step_divisor`.
    pub step_divisor: f64,
    /// Smoothing half-width `c · ν^d`.
    pub smooth_coeff: f64,
    pub smooth_exponent: f64,
}

impl Default for CovConfig {
    fn default() -> Self {
        Self {
            start_uhz: 1.0,
            width_coeff: 0.267,
            width_exponent: 0.764,
            step_divisor: 6.0,
            smooth_coeff: 0.33,
            smooth_exponent: 0.88,
        }
    }
}

impl CovConfig {
    fn validate(&self) -> Result<(), NumaxError> {
        // Bin centers must advance, or binning never reaches the top of the spectrum.
        if !(self.start_uhz > 0.0 && self.width_coeff > 0.0 && self.step_divisor > 0.0) {
            return Err(NumaxError::invalid_config("CoV start, width and step divisor must be > 0"));
        }
        if !(self.smooth_coeff > 0.0) {
            return Err(NumaxError::invalid_config("CoV smoothing coefficient must be > 0"));
        }
        Ok(())
    }
}

/// High-pass aggregate-power ("FliPer") settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FliperConfig {
    /// Number of top-frequency bins whose median is the noise floor.
    pub noise_bins: usize,
    pub short_cutoff_days: f64,
    pub long_cutoff_days: f64,
    /// Bins per group in the per-band error estimate.
    pub rebin: usize,
    /// Divide filtered power by `sinc²(ν / 2ν_max)` before aggregating.
    pub apodize: bool,
    /// Origin instrument; inferred from the target id when `None`.
    pub mission: Option<Mission>,
    /// Path to a regression artifact; the proxy is skipped without one.
    pub model_path: Option<PathBuf>,
}

impl Default for FliperConfig {
    fn default() -> Self {
        Self {
            noise_bins: 100,
            short_cutoff_days: 20.0,
            long_cutoff_days: 80.0,
            rebin: 50,
            apodize: true,
            mission: None,
            model_path: None,
        }
    }
}

impl FliperConfig {
    fn validate(&self) -> Result<(), NumaxError> {
        if self.noise_bins == 0 || self.rebin == 0 {
            return Err(NumaxError::invalid_config("noise_bins and rebin must be > 0"));
        }
        if !(self.short_cutoff_days > 0.0 && self.long_cutoff_days > 0.0) {
            return Err(NumaxError::invalid_config("high-pass cutoffs must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn overlap_must_be_below_window() {
        let mut cfg = EngineConfig::default();
        cfg.acf.narrow_overlap_uhz = 60.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn preparation_knobs_are_checked() {
        let mut cfg = EngineConfig::default();
        cfg.prepare.outlier_sigma = Some(0.0);
        assert!(cfg.validate().is_err());

        cfg.prepare.outlier_sigma = None;
        cfg.prepare.noise_std_ppm = Some(-1.0);
        assert!(cfg.validate().is_err());

        cfg.prepare.noise_std_ppm = Some(50.0);
        cfg.validate().unwrap();
    }
}
