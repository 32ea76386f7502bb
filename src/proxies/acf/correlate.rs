//! Absolute, max-normalized autocorrelation of a single window.
//!
//! Two strategies compute the same quantity for non-negative lags:
//!
//! - [`direct_acf`]: `Σᵢ xᵢ xᵢ₊ₖ` summed in the lag domain, `O(N²)`. Exact and
//!   cheap for the short windows of long-cadence spectra.
//! - [`FftAcf`]: zero-pad to the next power of two `≥ 2N - 1`, forward FFT,
//!   `|·|²`, inverse FFT, `O(N log N)`. Used for the wide windows of
//!   short-cadence spectra, at the cost of FFT round-off (~1e-12 relative).
//!
//! Both subtract the window mean first, divide by the maximum (the zero-lag
//! value) and take absolute values. A window with no variance has no defined
//! autocorrelation and yields `NaN` at every lag.

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

fn centered(x: &[f64]) -> Vec<f64> {
    let mean = x.iter().sum::<f64>() / x.len() as f64;
    x.iter().map(|v| v - mean).collect()
}

fn normalize_abs(mut acf: Vec<f64>) -> Vec<f64> {
    let max = acf.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !(max.is_finite() && max > 0.0) {
        return vec![f64::NAN; acf.len()];
    }
    for v in &mut acf {
        *v = (*v / max).abs();
    }
    acf
}

/// Lag-domain autocorrelation.
pub fn direct_acf(x: &[f64]) -> Vec<f64> {
    if x.is_empty() {
        return Vec::new();
    }
    let x = centered(x);
    let n = x.len();
    let acf = (0..n)
        .map(|k| x[..n - k].iter().zip(&x[k..]).map(|(a, b)| a * b).sum())
        .collect();
    normalize_abs(acf)
}

/// FFT autocorrelation with a plan reused across windows of one length.
#[derive(Clone)]
pub struct FftAcf {
    window_len: usize,
    nfft: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl FftAcf {
    pub fn new(window_len: usize) -> Self {
        let nfft = (2 * window_len.max(1) - 1).next_power_of_two();
        let mut planner = FftPlanner::<f64>::new();
        Self {
            window_len,
            nfft,
            forward: planner.plan_fft_forward(nfft),
            inverse: planner.plan_fft_inverse(nfft),
        }
    }

    pub fn nfft(&self) -> usize {
        self.nfft
    }

    /// Autocorrelation of a window of exactly `window_len` samples.
    pub fn acf(&self, x: &[f64]) -> Vec<f64> {
        let n = x.len().min(self.window_len);
        if n == 0 {
            return Vec::new();
        }
        let x = centered(&x[..n]);

        let mut buf: Vec<Complex<f64>> = vec![Complex::new(0.0, 0.0); self.nfft];
        for (slot, v) in buf.iter_mut().zip(&x) {
            slot.re = *v;
        }
        self.forward.process(&mut buf);
        for c in &mut buf {
            *c = Complex::new(c.norm_sqr(), 0.0);
        }
        self.inverse.process(&mut buf);

        normalize_abs(buf[..n].iter().map(|c| c.re).collect())
    }
}

/// Convenience wrapper for a one-off window.
pub fn fft_acf(x: &[f64]) -> Vec<f64> {
    FftAcf::new(x.len()).acf(x)
}
