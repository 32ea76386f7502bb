//! Formatted terminal output.
//!
//! Formatting lives in one place so the numerical code stays free of
//! presentation concerns and output changes stay localized.

use crate::app::pipeline::RunOutput;
use crate::domain::EngineConfig;
use crate::ensemble::NumaxEstimateSet;
use crate::proxies::ProxyOutcome;

/// Dataset, spectrum and per-proxy diagnostics.
pub fn format_run_summary(run: &RunOutput, config: &EngineConfig) -> String {
    let mut out = String::new();

    out.push_str("=== numax - multi-proxy νmax estimate ===\n");
    out.push_str(&format!("Target: {} ({})\n", run.target, run.mission.display_name()));
    out.push_str(&format!(
        "Light curve: n={} | baseline={:.2} d | cadence={:.1} s | Nyquist={:.2} μHz\n",
        run.series.len(),
        run.series.baseline_days(),
        run.series.mean_cadence_seconds(),
        run.series.nyquist_uhz()
    ));
    let prep = &run.preparation;
    if prep.n_non_finite + prep.n_outliers + prep.n_duplicates + prep.n_gaps_closed > 0 {
        out.push_str(&format!(
            "Cleaning: dropped {} non-finite, {} outlier, {} duplicate | closed {} gaps ({:.2} d)\n",
            prep.n_non_finite, prep.n_outliers, prep.n_duplicates, prep.n_gaps_closed, prep.gap_days_removed
        ));
    }
    if let Some(std) = config.prepare.noise_std_ppm {
        out.push_str(&format!(
            "Injected white noise: σ={std:.1} ppm (seed {})\n",
            config.prepare.noise_seed
        ));
    }
    out.push_str(&format!(
        "Spectrum: {} bins | [{:.3}, {:.3}] μHz | spacing={:.4} μHz{}\n",
        run.spectrum.len(),
        run.spectrum.min_frequency(),
        run.spectrum.max_frequency(),
        run.spectrum.median_spacing(),
        if run.acf_averaged { " | ACF on averaged spectrum" } else { "" }
    ));

    out.push_str("\nDiagnostics:\n");
    let acf = &run.proxies.acf;
    out.push_str(&format!(
        "- 2D ACF : {:?}, {} windows of {} bins, step {}",
        acf.strategy,
        acf.matrix.lags.len(),
        acf.matrix.window_len,
        acf.matrix.step
    ));
    if let Some(fit) = &acf.fit {
        out.push_str(&format!(" | guess={:.2} σ={:.2} n={}", fit.guess, fit.sigma, fit.n_points));
    }
    out.push('\n');

    let cov = &run.proxies.cov;
    out.push_str(&format!(
        "- CoV    : {} bins ({} defined)",
        cov.centers.len(),
        cov.covs.iter().filter(|v| !v.is_nan()).count()
    ));
    if let Some(guess) = cov.guess {
        out.push_str(&format!(" | guess={guess:.2}"));
    }
    out.push('\n');

    let fl = &run.proxies.fliper;
    out.push_str(&format!("- FliPer : noise={:.3}", fl.noise));
    for band in &fl.bands {
        out.push_str(&format!(" {}={:.3}", band.label, band.fp.value));
    }
    if !config.fliper.apodize {
        out.push_str(" (no apodization)");
    }
    out.push('\n');
    out.push('\n');

    out
}

/// Table of every proxy slot.
pub fn format_estimates(estimates: &NumaxEstimateSet) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<34} {:<10} {}\n", "tag", "status", "νmax [μHz]"));
    out.push_str(&format!("{:-<34} {:-<10} {:-<24}\n", "", "", ""));

    for est in estimates.all() {
        let detail = match &est.outcome {
            ProxyOutcome::Computed { value } => match value.std_dev() {
                Some(sd) => format!("{:.2} ± {:.2}", value.nominal(), sd),
                None => format!("{:.2}", value.nominal()),
            },
            ProxyOutcome::Undefined { reason } | ProxyOutcome::Skipped { reason } => reason.clone(),
        };
        out.push_str(format!("{:<34} {:<10} {}", est.tag, est.outcome.status(), detail).trim_end());
        out.push('\n');
    }
    out.push_str(&format!("\nValid: {} of {}\n", estimates.valid().len(), estimates.len()));

    out
}
