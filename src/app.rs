//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - reads the light curve and optional catalog record
//! - runs the estimation pipeline
//! - prints the report
//! - writes optional exports

use clap::Parser;

use crate::cli::{Command, RunArgs, SynthArgs};
use crate::data::{SyntheticLightCurve, synthetic_light_curve};
use crate::domain::{EngineConfig, Measurement, ParameterRow, StarParameters};
use crate::error::NumaxError;
use crate::proxies::NumaxRegressor;

pub mod pipeline;

/// Entry point for the `numax` binary.
pub fn run() -> Result<(), NumaxError> {
    let cli = crate::cli::Cli::parse_from(std::env::args());

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Synth(args) => handle_synth(args),
    }
}

fn handle_run(args: RunArgs) -> Result<(), NumaxError> {
    let config = config_from_args(&args);
    config.validate()?;

    let ingested = crate::io::load_light_curve(&args.input)?;
    let parameters = parameters_from_args(&args);
    let regressor = pipeline::load_regressor(&config.fliper);
    let star = pipeline::StarContext {
        target: &args.target,
        parameters: &parameters,
        regressor: regressor.as_ref().map(|m| m as &dyn NumaxRegressor),
    };

    let run = pipeline::run_pipeline(&ingested.raw, star, &config)?;

    print!("{}", crate::report::format_run_summary(&run, &config));
    print!("{}", crate::report::format_estimates(&run.estimates));

    if let Some(path) = &args.export {
        let report = crate::io::EstimateReport::from_run(&run, &config);
        crate::io::write_report_json(path, &report)?;
    }
    if let Some(path) = &args.export_spectrum {
        crate::io::write_spectrum_csv(path, &run.spectrum)?;
    }

    Ok(())
}

fn handle_synth(args: SynthArgs) -> Result<(), NumaxError> {
    let series = synthetic_light_curve(&SyntheticLightCurve {
        days: args.days,
        cadence_seconds: args.cadence,
        numax_uhz: args.numax,
        amplitude_ppm: args.amplitude,
        white_noise_ppm: args.noise,
        seed: args.seed,
    })?;

    // Relative flux around 1, so `numax run` exercises the ppm conversion.
    let flux: Vec<f64> = series.flux().iter().map(|f| 1.0 + f * 1e-6).collect();
    let flux_err: Vec<f64> = series.flux_err().iter().map(|e| e * 1e-6).collect();
    crate::io::write_light_curve_csv(&args.output, series.time(), &flux, &flux_err)?;

    println!(
        "wrote {} samples ({:.1} d, νmax {} μHz) to {}",
        series.len(),
        series.baseline_days(),
        args.numax,
        args.output.display()
    );
    Ok(())
}

pub fn config_from_args(args: &RunArgs) -> EngineConfig {
    let mut config = EngineConfig::default();

    config.prepare.normalize_to_ppm = !args.ppm;
    config.prepare.gap_threshold_days = args.gap_days;
    config.prepare.outlier_sigma = (!args.no_clip).then_some(args.clip_sigma);
    config.prepare.noise_std_ppm = args.noise_std;
    config.prepare.noise_seed = args.noise_seed;

    config.spectrum.oversampling = args.oversampling;
    config.spectrum.average = args.average;
    config.spectrum.chunk_days = args.chunk_days;

    config.fliper.apodize = !args.no_apodize;
    config.fliper.mission = args.mission;
    config.fliper.model_path = args.model.clone();

    config
}

/// Catalog record (if any) with command-line values filling its gaps.
///
/// An unreadable catalog is logged and treated as no catalog: the scaling
/// relations then run on the command-line values alone, or are skipped.
pub fn parameters_from_args(args: &RunArgs) -> StarParameters {
    let catalog = match args.catalog.as_deref().map(crate::io::load_catalog_json) {
        Some(Ok(record)) => StarParameters::from_catalog(&record),
        Some(Err(err)) => {
            log::warn!("catalog unavailable, continuing without it: {err}");
            StarParameters::default()
        }
        None => StarParameters::default(),
    };

    let given = |value: Option<f64>, err: f64| value.map(|v| Measurement::new(v, err));
    let overrides = ParameterRow {
        logg: given(args.logg, args.logg_err),
        teff: given(args.teff, args.teff_err),
        luminosity: given(args.luminosity, args.luminosity_err),
        mass: given(args.mass, args.mass_err),
        radius: given(args.radius, args.radius_err),
    };

    catalog.with_overrides(&overrides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::domain::Mission;

    fn run_args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["numax", "run"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Command::Run(args) => args,
            Command::Synth(_) => panic!("expected run"),
        }
    }

    #[test]
    fn config_follows_flags() {
        let args = run_args(&["lc.csv", "--ppm", "--average", "--mission", "tess", "--no-apodize"]);
        let config = config_from_args(&args);
        assert!(!config.prepare.normalize_to_ppm);
        assert!(config.spectrum.average);
        assert!(!config.fliper.apodize);
        assert_eq!(config.fliper.mission, Some(Mission::Tess));
        assert_eq!(config.acf, EngineConfig::default().acf);
        config.validate().unwrap();
    }

    #[test]
    fn command_line_parameters_become_one_row() {
        let args = run_args(&["lc.csv", "--logg", "2.5", "--logg-err", "0.1", "--teff", "4800"]);
        let params = parameters_from_args(&args);
        assert_eq!(params.rows().len(), 1);
        let row = &params.rows()[0];
        assert_eq!(row.logg, Some(Measurement::new(2.5, 0.1)));
        assert_eq!(row.teff, Some(Measurement::new(4800.0, 0.0)));
        assert!(row.mass.is_none());
    }

    #[test]
    fn unreadable_catalog_falls_back_to_command_line_values() {
        let args = run_args(&["lc.csv", "--catalog", "/nonexistent/catalog.json", "--teff", "4800"]);
        let params = parameters_from_args(&args);
        assert_eq!(params.rows().len(), 1);
        assert_eq!(params.rows()[0].teff, Some(Measurement::new(4800.0, 0.0)));

        let args = run_args(&["lc.csv", "--catalog", "/nonexistent/catalog.json"]);
        assert!(parameters_from_args(&args).is_empty());
    }

    #[test]
    fn malformed_catalog_is_not_fatal() {
        let path = std::env::temp_dir().join(format!("numax-bad-catalog-{}.json", std::process::id()));
        std::fs::write(&path, "{ not json").unwrap();
        let args = run_args(&["lc.csv", "--catalog", path.to_str().unwrap(), "--logg", "3.0"]);
        let params = parameters_from_args(&args);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(params.rows().len(), 1);
        assert_eq!(params.rows()[0].logg, Some(Measurement::new(3.0, 0.0)));
    }

    #[test]
    fn clipping_and_noise_flags_reach_preparation() {
        let config = config_from_args(&run_args(&["lc.csv"]));
        assert_eq!(config.prepare.outlier_sigma, Some(5.0));
        assert_eq!(config.prepare.noise_std_ppm, None);

        let args = run_args(&["lc.csv", "--clip-sigma", "4", "--noise-std", "80", "--noise-seed", "9"]);
        let config = config_from_args(&args);
        assert_eq!(config.prepare.outlier_sigma, Some(4.0));
        assert_eq!(config.prepare.noise_std_ppm, Some(80.0));
        assert_eq!(config.prepare.noise_seed, 9);

        let config = config_from_args(&run_args(&["lc.csv", "--no-clip"]));
        assert_eq!(config.prepare.outlier_sigma, None);
    }
}
