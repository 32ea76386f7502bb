//! The estimation pipeline shared by the CLI and library users.
//!
//! prepare (+ optional white noise) -> spectrum (+ chunk-averaged spectrum for the ACF)
//! -> proxies -> estimate set
//!
//! Every stage is a plain function over the previous stage's output; the
//! intermediate artifacts are returned in [`RunOutput`] rather than kept as
//! hidden state. The four proxies only read the shared spectrum and run
//! concurrently.

use crate::data::{PrepareSummary, RawLightCurve, add_white_noise, prepare_light_curve};
use crate::domain::{EngineConfig, FliperConfig, Mission, Spectrum, StarParameters, TimeSeries};
use crate::ensemble::NumaxEstimateSet;
use crate::error::NumaxError;
use crate::proxies::{
    AcfResult, CovResult, FliperResult, LinearRegressor, NumaxRegressor, ProxyEstimate, numax_from_acf, numax_from_cov,
    numax_from_fliper, numax_from_scaling,
};
use crate::spectrum::{averaged_spectrum, compute_spectrum, qualifies_for_averaging};

/// Inputs that come from outside the light curve.
#[derive(Clone, Copy)]
pub struct StarContext<'a> {
    /// Target identifier; also used to infer the mission.
    pub target: &'a str,
    pub parameters: &'a StarParameters,
    pub regressor: Option<&'a dyn NumaxRegressor>,
}

/// Per-proxy results over one spectrum.
#[derive(Debug, Clone)]
pub struct ProxyResults {
    pub acf: AcfResult,
    pub cov: CovResult,
    pub fliper: FliperResult,
    pub scaling: Vec<ProxyEstimate>,
}

impl ProxyResults {
    /// Collect every slot, in a fixed proxy order.
    pub fn estimate_set(&self) -> NumaxEstimateSet {
        let mut set = NumaxEstimateSet::new();
        set.insert(self.acf.estimate());
        set.insert(self.cov.estimate());
        set.insert(self.fliper.estimate());
        set.extend(self.scaling.iter().cloned());
        set
    }
}

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub target: String,
    pub mission: Mission,
    pub preparation: PrepareSummary,
    pub series: TimeSeries,
    pub spectrum: Spectrum,
    /// Whether the ACF ran on the chunk-averaged spectrum.
    pub acf_averaged: bool,
    pub proxies: ProxyResults,
    pub estimates: NumaxEstimateSet,
}

/// Load the configured regression artifact.
///
/// A missing or unreadable artifact is an external-dependency failure: it is
/// logged and the FliPer proxy is later reported as skipped.
pub fn load_regressor(cfg: &FliperConfig) -> Option<LinearRegressor> {
    let path = cfg.model_path.as_ref()?;
    match LinearRegressor::from_path(path) {
        Ok(model) => {
            log::info!("loaded FliPer regression model from {}", path.display());
            Some(model)
        }
        Err(err) => {
            log::warn!("FliPer regression model unavailable: {err}");
            None
        }
    }
}

/// Origin instrument: configured, or inferred from the target identifier.
pub fn resolve_mission(target: &str, cfg: &FliperConfig) -> Mission {
    cfg.mission.unwrap_or_else(|| Mission::from_target_id(target))
}

/// Run the four proxies over prepared inputs.
///
/// `acf_spectrum` overrides the spectrum seen by the 2D ACF (the chunk-averaged
/// spectrum for long short-cadence series).
pub fn run_proxies(
    spectrum: &Spectrum,
    acf_spectrum: Option<&Spectrum>,
    cadence_seconds: f64,
    star: StarContext<'_>,
    cfg: &EngineConfig,
) -> Result<ProxyResults, NumaxError> {
    let mission = resolve_mission(star.target, &cfg.fliper);
    let acf_input = acf_spectrum.unwrap_or(spectrum);

    let ((acf, cov), (fliper, scaling)) = rayon::join(
        || {
            rayon::join(
                || numax_from_acf(acf_input, &cfg.normalizer, &cfg.acf),
                || numax_from_cov(spectrum, &cfg.cov),
            )
        },
        || {
            rayon::join(
                || numax_from_fliper(spectrum, cadence_seconds, mission, star.regressor, &cfg.fliper),
                || numax_from_scaling(star.parameters),
            )
        },
    );

    Ok(ProxyResults {
        acf: acf?,
        cov,
        fliper,
        scaling,
    })
}

/// Execute the full pipeline on raw light-curve columns.
pub fn run_pipeline(raw: &RawLightCurve, star: StarContext<'_>, cfg: &EngineConfig) -> Result<RunOutput, NumaxError> {
    cfg.validate()?;

    // 1) Clean the light curve.
    let prepared = prepare_light_curve(raw, &cfg.prepare)?;
    let series = match cfg.prepare.noise_std_ppm {
        Some(std) => {
            log::info!("{}: injecting {std} ppm white noise (seed {})", star.target, cfg.prepare.noise_seed);
            add_white_noise(&prepared.series, std, cfg.prepare.noise_seed)?
        }
        None => prepared.series,
    };
    log::info!(
        "{}: {} samples over {:.2} d, mean cadence {:.1} s",
        star.target,
        series.len(),
        series.baseline_days(),
        series.mean_cadence_seconds()
    );

    // 2) Spectra.
    let spectrum = compute_spectrum(&series, &cfg.spectrum)?;
    let averaged = if cfg.spectrum.average && qualifies_for_averaging(&series, &cfg.spectrum) {
        Some(averaged_spectrum(&series, &cfg.spectrum)?)
    } else {
        None
    };

    // 3) Proxies.
    let proxies = run_proxies(
        &spectrum,
        averaged.as_ref(),
        series.mean_cadence_seconds(),
        star,
        cfg,
    )?;

    // 4) Estimate set.
    let estimates = proxies.estimate_set();
    log::info!(
        "{}: {} of {} estimates valid",
        star.target,
        estimates.valid().len(),
        estimates.len()
    );

    Ok(RunOutput {
        target: star.target.to_string(),
        mission: resolve_mission(star.target, &cfg.fliper),
        preparation: prepared.summary,
        series,
        spectrum,
        acf_averaged: averaged.is_some(),
        proxies,
        estimates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SyntheticLightCurve, synthetic_light_curve};
    use crate::domain::{Measurement, ParameterRow};
    use crate::proxies::{ACF_TAG, COV_TAG, FLIPER_TAG};

    fn raw_from(series: &TimeSeries) -> RawLightCurve {
        RawLightCurve {
            time: series.time().to_vec(),
            flux: series.flux().iter().map(|f| 1.0 + f * 1e-6).collect(),
            flux_err: Some(series.flux_err().iter().map(|e| e * 1e-6).collect()),
        }
    }

    fn giant_parameters() -> StarParameters {
        StarParameters::from_rows(vec![ParameterRow {
            logg: Some(Measurement::new(2.65, 0.05)),
            teff: Some(Measurement::new(4800.0, 80.0)),
            ..ParameterRow::default()
        }])
    }

    #[test]
    fn end_to_end_on_synthetic_light_curve() {
        let series = synthetic_light_curve(&SyntheticLightCurve::default()).unwrap();
        let params = giant_parameters();
        let star = StarContext {
            target: "KIC 0000001",
            parameters: &params,
            regressor: None,
        };
        let out = run_pipeline(&raw_from(&series), star, &EngineConfig::default()).unwrap();

        assert_eq!(out.mission, Mission::Kepler);
        assert!(!out.acf_averaged);
        assert_eq!(out.series.len(), series.len());
        let nyquist = out.series.nyquist_uhz();
        assert!(out.spectrum.frequency().iter().all(|f| *f > 0.0 && *f <= nyquist));

        let tags: Vec<&str> = out.estimates.all().iter().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, vec![ACF_TAG, COV_TAG, FLIPER_TAG, "numax_SR_logg_teff_0"]);
        assert_eq!(out.estimates.get(FLIPER_TAG).unwrap().outcome.status(), "skipped");

        let valid = out.estimates.valid();
        assert!(valid.iter().any(|(tag, _)| *tag == "numax_SR_logg_teff_0"));
        assert!(valid.iter().all(|(_, v)| v.is_finite()));
    }

    #[test]
    fn regressor_and_mission_override_reach_fliper() {
        let series = synthetic_light_curve(&SyntheticLightCurve {
            days: 10.0,
            ..SyntheticLightCurve::default()
        })
        .unwrap();
        let model = LinearRegressor {
            intercept: 2.0,
            weights: vec![0.0; 8],
            log_features: false,
        };
        let params = StarParameters::default();
        let star = StarContext {
            target: "KIC 1",
            parameters: &params,
            regressor: Some(&model),
        };
        let mut cfg = EngineConfig::default();
        cfg.fliper.mission = Some(Mission::Tess);

        let out = run_pipeline(&raw_from(&series), star, &cfg).unwrap();
        assert_eq!(out.mission, Mission::Tess);
        assert_eq!(out.proxies.fliper.features.mission_flag, 1.0);
        let numax = out.estimates.get(FLIPER_TAG).unwrap().outcome.finite_value().unwrap();
        assert!((numax.nominal() - 100.0).abs() < 1e-9);
        assert!(out.proxies.scaling.is_empty());
    }

    #[test]
    fn invalid_config_fails_fast() {
        let series = synthetic_light_curve(&SyntheticLightCurve::default()).unwrap();
        let params = StarParameters::default();
        let star = StarContext {
            target: "TIC 1",
            parameters: &params,
            regressor: None,
        };
        let mut cfg = EngineConfig::default();
        cfg.acf.failsafe_step_bins = 0;
        let err = run_pipeline(&raw_from(&series), star, &cfg).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn injected_noise_is_seeded_and_reaches_the_spectrum() {
        let series = synthetic_light_curve(&SyntheticLightCurve {
            days: 10.0,
            ..SyntheticLightCurve::default()
        })
        .unwrap();
        let raw = raw_from(&series);
        let params = StarParameters::default();
        let star = StarContext {
            target: "KIC 2",
            parameters: &params,
            regressor: None,
        };
        let clean = run_pipeline(&raw, star, &EngineConfig::default()).unwrap();

        let mut cfg = EngineConfig::default();
        cfg.prepare.noise_std_ppm = Some(200.0);
        cfg.prepare.noise_seed = 3;
        let a = run_pipeline(&raw, star, &cfg).unwrap();
        let b = run_pipeline(&raw, star, &cfg).unwrap();
        assert_eq!(a.series.flux(), b.series.flux());
        assert_eq!(a.spectrum.power(), b.spectrum.power());

        let added: Vec<f64> = a.series.flux().iter().zip(clean.series.flux()).map(|(x, y)| x - y).collect();
        let std = crate::math::std_dev(&added).unwrap();
        assert!((std - 200.0).abs() < 20.0, "injected std {std}");

        let floor = |out: &RunOutput| {
            let power = out.spectrum.power();
            crate::math::median(&power[power.len() * 9 / 10..]).unwrap()
        };
        assert!(floor(&a) > 10.0 * floor(&clean));
        assert_eq!(a.estimates.len(), clean.estimates.len());
    }

    #[test]
    fn averaged_spectrum_feeds_the_acf_when_the_series_qualifies() {
        let series = synthetic_light_curve(&SyntheticLightCurve::default()).unwrap();
        let raw = raw_from(&series);
        let params = StarParameters::default();
        let star = StarContext {
            target: "KIC 3",
            parameters: &params,
            regressor: None,
        };
        let mut cfg = EngineConfig::default();
        cfg.spectrum.average = true;
        cfg.spectrum.chunk_days = 10.0;
        cfg.spectrum.average_min_baseline_days = 20.0;
        cfg.spectrum.average_max_cadence_seconds = 3600.0;

        let out = run_pipeline(&raw, star, &cfg).unwrap();
        assert!(out.acf_averaged);
        // The ACF saw the chunk grid (half-step offset), not the full-series grid.
        let acf_grid = &out.proxies.acf.relative.spectrum;
        assert_ne!(acf_grid.len(), out.spectrum.len());
        assert!(acf_grid.min_frequency() < 0.5 * out.spectrum.min_frequency());
        assert_eq!(out.estimates.get(ACF_TAG).unwrap().tag, ACF_TAG);

        cfg.spectrum.average_max_cadence_seconds = 120.0;
        let out = run_pipeline(&raw, star, &cfg).unwrap();
        assert!(!out.acf_averaged);
    }

    #[test]
    fn missing_model_file_is_not_an_error() {
        let cfg = FliperConfig {
            model_path: Some("/nonexistent/fliper-model.json".into()),
            ..FliperConfig::default()
        };
        assert!(load_regressor(&cfg).is_none());
        assert!(load_regressor(&FliperConfig::default()).is_none());
    }
}
