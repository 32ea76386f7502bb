//! Export estimate reports (JSON) and spectra (CSV).
//!
//! The JSON report is the portable record of a run: every proxy slot with its
//! status, the valid subset, and the effective configuration.

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::app::pipeline::RunOutput;
use crate::domain::{EngineConfig, Mission, Spectrum};
use crate::error::NumaxError;
use crate::proxies::{EstimateValue, ProxyEstimate};

#[derive(Debug, Clone, Serialize)]
pub struct ValidEstimate {
    pub tag: String,
    pub value: EstimateValue,
}

/// Schema of the exported JSON report.
#[derive(Debug, Clone, Serialize)]
pub struct EstimateReport {
    pub tool: String,
    pub version: String,
    pub generated: DateTime<Utc>,
    pub target: String,
    pub mission: Mission,
    pub n_samples: usize,
    pub baseline_days: f64,
    pub spectrum_bins: usize,
    pub acf_averaged: bool,
    pub estimates: Vec<ProxyEstimate>,
    pub valid: Vec<ValidEstimate>,
    pub config: EngineConfig,
}

impl EstimateReport {
    pub fn from_run(run: &RunOutput, config: &EngineConfig) -> Self {
        Self {
            tool: "numax".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            generated: Utc::now(),
            target: run.target.clone(),
            mission: run.mission,
            n_samples: run.series.len(),
            baseline_days: run.series.baseline_days(),
            spectrum_bins: run.spectrum.len(),
            acf_averaged: run.acf_averaged,
            estimates: run.estimates.all().to_vec(),
            valid: run
                .estimates
                .valid()
                .into_iter()
                .map(|(tag, value)| ValidEstimate {
                    tag: tag.to_string(),
                    value,
                })
                .collect(),
            config: config.clone(),
        }
    }
}

pub fn write_report_json(path: &Path, report: &EstimateReport) -> Result<(), NumaxError> {
    let file = File::create(path)
        .map_err(|e| NumaxError::io(format!("failed to create report JSON '{}'", path.display()), e))?;
    serde_json::to_writer_pretty(file, report).map_err(|e| NumaxError::Json(format!("failed to write report: {e}")))
}

#[derive(Serialize)]
struct SpectrumRow {
    frequency_uhz: f64,
    power: f64,
}

/// Write `frequency_uhz,power` rows.
pub fn write_spectrum_csv(path: &Path, spectrum: &Spectrum) -> Result<(), NumaxError> {
    let file = File::create(path)
        .map_err(|e| NumaxError::io(format!("failed to create spectrum CSV '{}'", path.display()), e))?;
    write_spectrum(csv::Writer::from_writer(file), spectrum)
}

fn write_spectrum<W: std::io::Write>(mut writer: csv::Writer<W>, spectrum: &Spectrum) -> Result<(), NumaxError> {
    for (&frequency_uhz, &power) in spectrum.frequency().iter().zip(spectrum.power()) {
        writer
            .serialize(SpectrumRow { frequency_uhz, power })
            .map_err(|e| NumaxError::Csv(format!("failed to write spectrum row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| NumaxError::io("failed to flush spectrum CSV", e))
}

/// Write `time,flux,flux_err` rows (used by `numax synth`).
pub fn write_light_curve_csv(path: &Path, time: &[f64], flux: &[f64], flux_err: &[f64]) -> Result<(), NumaxError> {
    let file = File::create(path)
        .map_err(|e| NumaxError::io(format!("failed to create light-curve CSV '{}'", path.display()), e))?;
    let mut writer = csv::Writer::from_writer(file);
    writer
        .write_record(["time", "flux", "flux_err"])
        .map_err(|e| NumaxError::Csv(e.to_string()))?;
    for ((t, f), e) in time.iter().zip(flux).zip(flux_err) {
        writer
            .write_record([format!("{t:.10}"), format!("{f:.10}"), format!("{e:.10}")])
            .map_err(|e| NumaxError::Csv(e.to_string()))?;
    }
    writer
        .flush()
        .map_err(|e| NumaxError::io("failed to flush light-curve CSV", e))
}
