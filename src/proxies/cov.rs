//! Coefficient-of-variation (CoV) proxy.
//!
//! The spectrum is cut into overlapping bins whose width follows the expected
//! mode density at that frequency. Inside the oscillation envelope the resolved
//! modes make power far more variable than the surrounding granulation and
//! white noise, so the CoV per bin peaks near νmax.
//!
//! - bins: `w(ν) = 0.267 ν^0.764`, centers advance by `w / 6`
//! - smoothing: mean CoV within `±0.33 ν^0.88`
//! - estimate: CoV-weighted mean of bin centers around the smoothed maximum

use serde::Serialize;

use crate::domain::{CovConfig, Measurement, Spectrum};
use crate::math::{mean, nan_argmax, sample_std};
use crate::proxies::{EstimateValue, ProxyEstimate, ProxyOutcome};

pub const COV_TAG: &str = "numax_CoV";

#[derive(Debug, Clone, Serialize)]
pub struct CovResult {
    pub centers: Vec<f64>,
    pub widths: Vec<f64>,
    /// Raw CoV per bin; `NaN` where undefined.
    pub covs: Vec<f64>,
    pub smoothed: Vec<f64>,
    /// Center of the smoothed maximum, if any bin was defined.
    pub guess: Option<f64>,
    pub outcome: ProxyOutcome,
}

impl CovResult {
    pub fn estimate(&self) -> ProxyEstimate {
        ProxyEstimate::new(COV_TAG, self.outcome.clone())
    }
}

pub fn bin_width(center: f64, cfg: &CovConfig) -> f64 {
    cfg.width_coeff * center.powf(cfg.width_exponent)
}

fn smoothing_half_width(center: f64, cfg: &CovConfig) -> f64 {
    cfg.smooth_coeff * center.powf(cfg.smooth_exponent)
}

/// Bin centers from `start_uhz` up to and including the first center at or
/// beyond `max_frequency`.
pub fn bin_centers(max_frequency: f64, cfg: &CovConfig) -> Vec<f64> {
    let mut centers = vec![cfg.start_uhz];
    let mut c = cfg.start_uhz;
    while c < max_frequency {
        c += bin_width(c, cfg) / cfg.step_divisor;
        centers.push(c);
    }
    centers
}

/// Half-open index range of sorted `values` inside `[lower, upper)`.
fn index_range(values: &[f64], lower: f64, upper: f64) -> std::ops::Range<usize> {
    let start = values.partition_point(|v| *v < lower);
    let end = values.partition_point(|v| *v < upper);
    start..end.max(start)
}

/// `std / mean` of the finite powers in `[center - w/2, center + w/2)`.
///
/// `NaN` for fewer than two finite values, a zero or non-finite mean, or a
/// non-finite standard deviation.
pub fn coefficient_of_variation(spectrum: &Spectrum, center: f64, width: f64) -> f64 {
    let range = index_range(spectrum.frequency(), center - width / 2.0, center + width / 2.0);
    let values: Vec<f64> = spectrum.power()[range]
        .iter()
        .copied()
        .filter(|p| p.is_finite())
        .collect();
    if values.len() < 2 {
        return f64::NAN;
    }
    let Some(m) = mean(&values).filter(|m| m.is_finite() && *m != 0.0) else {
        return f64::NAN;
    };
    match sample_std(&values) {
        Some(s) if s.is_finite() => s / m,
        _ => f64::NAN,
    }
}

/// Mean of the defined CoVs whose centers lie within the smoothing window.
pub fn smooth_covs(centers: &[f64], covs: &[f64], cfg: &CovConfig) -> Vec<f64> {
    centers
        .iter()
        .map(|&c| {
            let h = smoothing_half_width(c, cfg);
            let defined: Vec<f64> = covs[index_range(centers, c - h, c + h)]
                .iter()
                .copied()
                .filter(|v| !v.is_nan())
                .collect();
            mean(&defined).unwrap_or(f64::NAN)
        })
        .collect()
}

/// Weighted-mean νmax around the smoothed maximum.
///
/// Returns the guess alongside the estimate. The uncertainty is the spread of
/// the bin centers inside the weighting window, not a calibrated error.
pub fn estimate_from_smoothed(centers: &[f64], smoothed: &[f64], cfg: &CovConfig) -> (Option<f64>, Measurement) {
    let undefined = Measurement::new(f64::NAN, f64::NAN);
    let candidates: Vec<(f64, f64)> = centers
        .iter()
        .zip(smoothed)
        .filter(|(c, _)| **c > 1.0)
        .map(|(c, s)| (*c, *s))
        .collect();
    let values: Vec<f64> = candidates.iter().map(|(_, s)| *s).collect();
    let Some(best) = nan_argmax(&values) else {
        return (None, undefined);
    };
    let guess = candidates[best].0;

    let h = smoothing_half_width(guess, cfg);
    let window: Vec<(f64, f64)> = centers
        .iter()
        .zip(smoothed)
        .filter(|(c, _)| **c >= guess - h && **c <= guess + h)
        .map(|(c, s)| (*c, *s))
        .collect();

    let (num, den) = window
        .iter()
        .filter(|(_, s)| !s.is_nan())
        .fold((0.0, 0.0), |(n, d), (c, s)| (n + c * s, d + s));
    if den == 0.0 || !den.is_finite() {
        return (Some(guess), undefined);
    }
    let spread: Vec<f64> = window.iter().map(|(c, _)| *c).collect();
    let std_dev = sample_std(&spread).unwrap_or(f64::NAN);
    (Some(guess), Measurement::new(num / den, std_dev))
}

/// Run the CoV proxy end to end. Never fails; degenerate data yields an
/// `Undefined` outcome.
pub fn numax_from_cov(spectrum: &Spectrum, cfg: &CovConfig) -> CovResult {
    let centers = bin_centers(spectrum.max_frequency(), cfg);
    let widths: Vec<f64> = centers.iter().map(|c| bin_width(*c, cfg)).collect();
    let covs: Vec<f64> = centers
        .iter()
        .zip(&widths)
        .map(|(c, w)| coefficient_of_variation(spectrum, *c, *w))
        .collect();
    let smoothed = smooth_covs(&centers, &covs, cfg);
    log::debug!(
        "CoV: {} bins, {} defined",
        centers.len(),
        covs.iter().filter(|v| !v.is_nan()).count()
    );

    let (guess, numax) = estimate_from_smoothed(&centers, &smoothed, cfg);
    let outcome = if numax.value.is_finite() {
        log::info!("CoV: νmax = {numax} μHz");
        ProxyOutcome::computed(EstimateValue::Measured(numax))
    } else {
        log::warn!("CoV: no weighted estimate (guess {guess:?})");
        ProxyOutcome::undefined("no defined smoothed CoV inside the weighting window")
    };

    CovResult {
        centers,
        widths,
        covs,
        smoothed,
        guess,
        outcome,
    }
}
