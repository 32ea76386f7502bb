//! Sliding-window autocorrelation across the relative-power spectrum.

use rayon::prelude::*;
use serde::Serialize;

use crate::domain::{AcfConfig, Spectrum};
use crate::proxies::acf::{FftAcf, direct_acf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AcfStrategy {
    /// Zero-padded FFT; spectra extending past the regime threshold.
    Fft,
    /// Lag-domain sums; everything else.
    Direct,
}

/// The 2D autocorrelation: one row of lags per frequency window.
#[derive(Debug, Clone, Serialize)]
pub struct TwoDimAcf {
    /// `lags[w][k]`: normalized |ACF| of window `w` at lag `k`.
    pub lags: Vec<Vec<f64>>,
    /// Frequencies covered by each window (μHz).
    pub windows: Vec<Vec<f64>>,
    pub window_len: usize,
    pub step: usize,
    pub strategy: AcfStrategy,
}

/// Window geometry `(width, overlap, strategy)` for a spectrum's extent.
pub fn acf_regime(max_frequency: f64, cfg: &AcfConfig) -> (f64, f64, AcfStrategy) {
    if max_frequency > cfg.regime_threshold_uhz {
        (cfg.wide_window_uhz, cfg.wide_overlap_uhz, AcfStrategy::Fft)
    } else {
        (cfg.narrow_window_uhz, cfg.narrow_overlap_uhz, AcfStrategy::Direct)
    }
}

/// Autocorrelate overlapping windows of a relative-power spectrum.
///
/// Non-finite relative power (e.g. from a zero background) is treated as no
/// excess power.
pub fn two_dim_acf(relative: &Spectrum, cfg: &AcfConfig) -> TwoDimAcf {
    let n = relative.len();
    let (width, overlap, strategy) = acf_regime(relative.max_frequency(), cfg);
    let spacing = relative.mean_spacing();

    let window_len = if spacing.is_finite() && spacing > 0.0 {
        ((width / spacing) as usize).clamp(2.min(n), n)
    } else {
        n
    };
    let mut step = if spacing.is_finite() && spacing > 0.0 {
        ((width - overlap) / spacing) as usize
    } else {
        0
    };
    if step == 0 {
        step = cfg.failsafe_step_bins.max(1);
    }

    let power: Vec<f64> = relative
        .power()
        .iter()
        .map(|p| if p.is_finite() { *p } else { 0.0 })
        .collect();
    let starts: Vec<usize> = if window_len == 0 {
        Vec::new()
    } else {
        (0..=n - window_len).step_by(step).collect()
    };
    log::debug!(
        "2D ACF: {} windows of {window_len} bins, step {step}, {strategy:?}",
        starts.len()
    );

    let fft = match strategy {
        AcfStrategy::Fft => Some(FftAcf::new(window_len)),
        AcfStrategy::Direct => None,
    };
    let lags: Vec<Vec<f64>> = starts
        .par_iter()
        .map(|&s| {
            let segment = &power[s..s + window_len];
            match &fft {
                Some(plan) => plan.acf(segment),
                None => direct_acf(segment),
            }
        })
        .collect();
    let windows = starts
        .iter()
        .map(|&s| relative.frequency()[s..s + window_len].to_vec())
        .collect();

    TwoDimAcf {
        lags,
        windows,
        window_len,
        step,
        strategy,
    }
}
