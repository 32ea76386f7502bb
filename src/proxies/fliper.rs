//! High-pass aggregate-power ("FliPer") proxy.
//!
//! FliPer values are the mean power of a high-pass filtered spectrum above a
//! band start, minus the noise floor. Together with the noise level, the
//! cadence and the mission they form an 8-feature vector that a pre-trained
//! regression maps to `log₁₀ νmax`.
//!
//! The regression is injected through [`NumaxRegressor`]; without one the
//! proxy still computes its features and reports a `Skipped` outcome.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{DAY_SECONDS, FliperConfig, Measurement, Mission, Spectrum};
use crate::error::NumaxError;
use crate::math::{mean, median, median_filter, odd_window_len};
use crate::proxies::{EstimateValue, ProxyEstimate, ProxyOutcome};

pub const FLIPER_TAG: &str = "numax_FliPer";

/// Feature order expected by every regressor.
pub const FEATURE_NAMES: [&str; 8] = ["Fp02", "Fp07", "Fp7", "Fp20", "Fp50", "noise", "cadence", "mission"];

/// Which high-pass filter a band is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterCutoff {
    Short,
    Long,
}

/// `(label, band start in μHz, filter)` for the five FliPer bands.
pub const BANDS: [(&str, f64, FilterCutoff); 5] = [
    ("Fp02", 0.2, FilterCutoff::Long),
    ("Fp07", 0.7, FilterCutoff::Short),
    ("Fp7", 7.0, FilterCutoff::Short),
    ("Fp20", 20.0, FilterCutoff::Short),
    ("Fp50", 50.0, FilterCutoff::Short),
];

#[derive(Debug, Clone, Serialize)]
pub struct BandPower {
    pub label: &'static str,
    pub start_uhz: f64,
    pub filter: FilterCutoff,
    /// Aggregate power minus noise, with its counting error.
    pub fp: Measurement,
}

/// The ordered regression input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FliperFeatures {
    pub fp02: f64,
    pub fp07: f64,
    pub fp7: f64,
    pub fp20: f64,
    pub fp50: f64,
    pub noise: f64,
    pub cadence_seconds: f64,
    pub mission_flag: f64,
}

impl FliperFeatures {
    pub fn to_vector(&self) -> [f64; 8] {
        [
            self.fp02,
            self.fp07,
            self.fp7,
            self.fp20,
            self.fp50,
            self.noise,
            self.cadence_seconds,
            self.mission_flag,
        ]
    }
}

/// Maps FliPer features to `log₁₀ νmax`.
pub trait NumaxRegressor: Send + Sync {
    fn predict_log_numax(&self, features: &FliperFeatures) -> Result<f64, NumaxError>;
}

/// Linear model over the feature vector, optionally on `log₁₀` of the five
/// FliPer values and the noise.
///
/// Artifact format:
///
/// ```json
/// { "intercept": 1.2, "weights": [0.1, 0.0, 0.3, 0.0, 0.2, -0.4, 0.0, 0.05], "log_features": true }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressor {
    pub intercept: f64,
    pub weights: Vec<f64>,
    #[serde(default)]
    pub log_features: bool,
}

impl LinearRegressor {
    pub fn from_json_str(text: &str) -> Result<Self, NumaxError> {
        let model: LinearRegressor = serde_json::from_str(text).map_err(|e| NumaxError::Json(e.to_string()))?;
        if model.weights.len() != FEATURE_NAMES.len() {
            return Err(NumaxError::Model(format!(
                "expected {} weights, found {}",
                FEATURE_NAMES.len(),
                model.weights.len()
            )));
        }
        Ok(model)
    }

    pub fn from_path(path: &Path) -> Result<Self, NumaxError> {
        let text = fs::read_to_string(path)
            .map_err(|e| NumaxError::io(format!("failed to read regression model {}", path.display()), e))?;
        Self::from_json_str(&text)
    }
}

impl NumaxRegressor for LinearRegressor {
    fn predict_log_numax(&self, features: &FliperFeatures) -> Result<f64, NumaxError> {
        let mut x = features.to_vector();
        if self.log_features {
            for v in &mut x[..6] {
                *v = v.log10();
            }
        }
        Ok(self.intercept + self.weights.iter().zip(&x).map(|(w, v)| w * v).sum::<f64>())
    }
}

/// Everything the proxy computed, whether or not a regressor ran.
#[derive(Debug, Clone, Serialize)]
pub struct FliperResult {
    pub noise: f64,
    pub bands: Vec<BandPower>,
    pub features: FliperFeatures,
    /// Raw regression output, when a regressor ran.
    pub log_numax: Option<f64>,
    pub outcome: ProxyOutcome,
}

impl FliperResult {
    pub fn estimate(&self) -> ProxyEstimate {
        ProxyEstimate::new(FLIPER_TAG, self.outcome.clone())
    }
}

/// Median power of the top `bins` frequency bins (all bins when fewer).
pub fn noise_floor(spectrum: &Spectrum, bins: usize) -> f64 {
    let power = spectrum.power();
    let tail = &power[power.len().saturating_sub(bins)..];
    median(tail).unwrap_or(f64::NAN)
}

/// Moving median over a window of `1 / cutoff` expressed in μHz.
pub fn highpass_filter(spectrum: &Spectrum, cutoff_days: f64) -> Vec<f64> {
    let width_uhz = 1e6 / (cutoff_days * DAY_SECONDS);
    let window = odd_window_len(width_uhz, spectrum.median_spacing());
    log::debug!("FliPer: {cutoff_days} d high-pass filter, {window} bins");
    median_filter(spectrum.power(), window)
}

/// Counting error of the mean power of a band.
///
/// Power is summed in consecutive groups of `rebin` bins (a trailing partial
/// group is dropped); each group sum `P` carries `P / √rebin`.
pub fn band_error(power: &[f64], rebin: usize) -> f64 {
    if power.is_empty() {
        return f64::NAN;
    }
    let scale = (rebin as f64).sqrt();
    let total: f64 = power
        .chunks_exact(rebin)
        .map(|group| {
            let sigma = group.iter().sum::<f64>() / scale;
            sigma * sigma
        })
        .sum();
    total.sqrt() / power.len() as f64
}

fn band_power(frequency: &[f64], filtered: &[f64], raw: &[f64], start: f64, noise: f64, rebin: usize) -> Measurement {
    let first = frequency.partition_point(|f| *f < start);
    let value = mean(&filtered[first..]).map_or(f64::NAN, |m| m - noise);
    Measurement::new(value, band_error(&raw[first..], rebin))
}

/// Compute FliPer features and, given a regressor, νmax.
pub fn numax_from_fliper(
    spectrum: &Spectrum,
    cadence_seconds: f64,
    mission: Mission,
    regressor: Option<&dyn NumaxRegressor>,
    cfg: &FliperConfig,
) -> FliperResult {
    let noise = noise_floor(spectrum, cfg.noise_bins);
    let mut short = highpass_filter(spectrum, cfg.short_cutoff_days);
    let mut long = highpass_filter(spectrum, cfg.long_cutoff_days);
    if cfg.apodize {
        let attenuation = spectrum.attenuation(spectrum.max_frequency());
        for filtered in [&mut short, &mut long] {
            for (p, a) in filtered.iter_mut().zip(&attenuation) {
                *p /= a * a;
            }
        }
    }

    let bands: Vec<BandPower> = BANDS
        .iter()
        .map(|&(label, start, filter)| {
            let filtered = match filter {
                FilterCutoff::Short => &short,
                FilterCutoff::Long => &long,
            };
            BandPower {
                label,
                start_uhz: start,
                filter,
                fp: band_power(spectrum.frequency(), filtered, spectrum.power(), start, noise, cfg.rebin),
            }
        })
        .collect();

    let features = FliperFeatures {
        fp02: bands[0].fp.value,
        fp07: bands[1].fp.value,
        fp7: bands[2].fp.value,
        fp20: bands[3].fp.value,
        fp50: bands[4].fp.value,
        noise,
        cadence_seconds,
        mission_flag: mission.flag(),
    };
    log::debug!("FliPer features: {:?}", features.to_vector());

    let (log_numax, outcome) = match regressor {
        None => {
            log::warn!("FliPer: no regression model, skipping inference");
            (None, ProxyOutcome::skipped("no regression model configured"))
        }
        Some(model) => match model.predict_log_numax(&features) {
            Ok(x) if x.is_finite() && x > 0.0 => {
                let numax = 10f64.powf(x);
                log::info!("FliPer: νmax = {numax:.2} μHz");
                (Some(x), ProxyOutcome::computed(EstimateValue::Plain(numax)))
            }
            Ok(x) => (Some(x), ProxyOutcome::undefined(format!("regression output {x} is not a positive log νmax"))),
            Err(err) => {
                log::warn!("FliPer: regression failed: {err}");
                (None, ProxyOutcome::skipped(format!("regression failed: {err}")))
            }
        },
    };

    FliperResult {
        noise,
        bands,
        features,
        log_numax,
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SyntheticSpectrum, synthetic_spectrum};

    fn flat(level: f64, n: usize) -> Spectrum {
        let frequency: Vec<f64> = (1..=n).map(|k| k as f64 * 0.5).collect();
        Spectrum::new(frequency, vec![level; n]).unwrap()
    }

    fn constant_model(intercept: f64) -> LinearRegressor {
        LinearRegressor {
            intercept,
            weights: vec![0.0; 8],
            log_features: false,
        }
    }

    #[test]
    fn noise_floor_uses_top_bins() {
        let frequency: Vec<f64> = (1..=300).map(|k| k as f64).collect();
        let power: Vec<f64> = (1..=300).map(|k| if k > 200 { 2.0 } else { 50.0 }).collect();
        let spectrum = Spectrum::new(frequency, power).unwrap();
        assert_eq!(noise_floor(&spectrum, 100), 2.0);
        assert_eq!(noise_floor(&flat(4.0, 10), 100), 4.0);
    }

    #[test]
    fn flat_spectrum_has_zero_fliper_without_apodization() {
        let cfg = FliperConfig {
            apodize: false,
            ..FliperConfig::default()
        };
        let result = numax_from_fliper(&flat(3.0, 600), 1800.0, Mission::Kepler, None, &cfg);
        assert_eq!(result.noise, 3.0);
        for band in &result.bands {
            assert_eq!(band.fp.value, 0.0, "{}", band.label);
        }
        assert_eq!(result.features.mission_flag, 0.0);
        assert_eq!(result.features.cadence_seconds, 1800.0);
    }

    #[test]
    fn apodization_raises_power() {
        let result = numax_from_fliper(&flat(3.0, 600), 120.0, Mission::Tess, None, &FliperConfig::default());
        assert!(result.bands.iter().all(|b| b.fp.value > 0.0));
        assert_eq!(result.features.mission_flag, 1.0);
    }

    #[test]
    fn band_error_drops_partial_group() {
        // Two full groups of 50 ones: σ_tot = √(2 · 50) = 10.
        let err = band_error(&[1.0; 120], 50);
        assert!((err - 10.0 / 120.0).abs() < 1e-12);
        assert_eq!(band_error(&[1.0; 20], 50), 0.0);
    }

    #[test]
    fn missing_regressor_skips_but_keeps_features() {
        let spectrum = synthetic_spectrum(&SyntheticSpectrum::default()).unwrap();
        let result = numax_from_fliper(&spectrum, 1800.0, Mission::Kepler, None, &FliperConfig::default());
        assert_eq!(result.outcome.status(), "skipped");
        assert!(result.features.to_vector().iter().all(|v| v.is_finite()));
        // More power at low frequency: the widest band averages the most.
        assert!(result.features.fp02 > 0.0);
    }

    #[test]
    fn regression_output_is_inverted() {
        let spectrum = flat(1.0, 400);
        let model = constant_model(2.0);
        let result = numax_from_fliper(&spectrum, 1800.0, Mission::Kepler, Some(&model), &FliperConfig::default());
        let numax = result.outcome.finite_value().unwrap().nominal();
        assert!((numax - 100.0).abs() < 1e-9);
        assert_eq!(result.estimate().tag, FLIPER_TAG);

        let negative = constant_model(-0.5);
        let result = numax_from_fliper(&spectrum, 1800.0, Mission::Kepler, Some(&negative), &FliperConfig::default());
        assert_eq!(result.outcome.status(), "undefined");
        assert_eq!(result.log_numax, Some(-0.5));
    }

    #[test]
    fn linear_model_reads_json_and_checks_arity() {
        let model = LinearRegressor::from_json_str(r#"{"intercept": 1.0, "weights": [1, 0, 0, 0, 0, 0, 0, 0], "log_features": true}"#).unwrap();
        let features = FliperFeatures {
            fp02: 100.0,
            fp07: 1.0,
            fp7: 1.0,
            fp20: 1.0,
            fp50: 1.0,
            noise: 1.0,
            cadence_seconds: 1800.0,
            mission_flag: 0.0,
        };
        assert!((model.predict_log_numax(&features).unwrap() - 3.0).abs() < 1e-12);

        let err = LinearRegressor::from_json_str(r#"{"intercept": 1.0, "weights": [1, 2]}"#).unwrap_err();
        assert!(matches!(err, NumaxError::Model(_)));
        assert!(matches!(LinearRegressor::from_json_str("{").unwrap_err(), NumaxError::Json(_)));
    }
}
