//! Relative-power normalization.
//!
//! A moving median over a window much wider than the mode spacing tracks the
//! granulation and noise background. Dividing it out leaves the "relative
//! power" `(P - B) / B`, centered near zero, where oscillation modes stand out
//! as positive excursions.

use crate::domain::{NormalizerConfig, Spectrum};
use crate::error::NumaxError;
use crate::math::{median_filter, odd_window_len};

/// A normalized spectrum and the background it was divided by.
#[derive(Debug, Clone)]
pub struct RelativePower {
    /// Relative power, carrying the baseline as its `filter` companion.
    pub spectrum: Spectrum,
    pub baseline: Vec<f64>,
    pub window_bins: usize,
}

/// Flatten `spectrum` against its moving-median background.
pub fn relative_power(spectrum: &Spectrum, cfg: &NormalizerConfig) -> Result<RelativePower, NumaxError> {
    let width = if spectrum.max_frequency() > cfg.regime_threshold_uhz {
        cfg.wide_window_uhz
    } else {
        cfg.narrow_window_uhz
    };
    let window_bins = odd_window_len(width, spectrum.median_spacing());
    let baseline = median_filter(spectrum.power(), window_bins);
    log::debug!("relative power: {width} μHz median window ({window_bins} bins)");

    let rel: Vec<f64> = spectrum
        .power()
        .iter()
        .zip(&baseline)
        .map(|(&p, &b)| {
            if b != 0.0 && b.is_finite() {
                (p - b) / b
            } else {
                f64::NAN
            }
        })
        .collect();

    let normalized = Spectrum::new(spectrum.frequency().to_vec(), rel)?.with_filter(baseline.clone())?;
    Ok(RelativePower {
        spectrum: normalized,
        baseline,
        window_bins,
    })
}
