//! Collapse the 2D ACF to a profile and fit a Gaussian to its peak.
//!
//! The initial guess is the maximum of the profile averaged over the expected
//! envelope width, so one noisy window cannot capture the fit. A fit that
//! collapses onto a single window, turns negative or drifts out of its window
//! is rejected rather than reported.

use nalgebra::DMatrix;
use serde::Serialize;

use crate::math::{CurveModel, FitError, LmOptions, levenberg_marquardt, median, nan_argmax};
use crate::proxies::acf::TwoDimAcf;

/// Mean |ACF| per window, keyed by the window's median frequency.
#[derive(Debug, Clone, Serialize)]
pub struct CollapsedAcf {
    /// Median-subtracted, max-normalized profile.
    pub profile: Vec<f64>,
    pub centers: Vec<f64>,
}

/// Subtract the median and divide by the maximum, ignoring non-finite entries.
fn recenter(values: &mut [f64]) {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let Some(med) = median(&finite) else {
        return;
    };
    for v in values.iter_mut() {
        *v -= med;
    }
    let max = values.iter().copied().filter(|v| v.is_finite()).fold(f64::NEG_INFINITY, f64::max);
    // No positive excursion above the median: nothing to normalize to.
    let scale = if max.is_finite() && max > 0.0 { max } else { f64::NAN };
    for v in values.iter_mut() {
        *v /= scale;
    }
}

pub fn collapse(acf: &TwoDimAcf) -> CollapsedAcf {
    let mut profile: Vec<f64> = acf
        .lags
        .iter()
        .map(|row| row.iter().sum::<f64>() / row.len() as f64)
        .collect();
    recenter(&mut profile);

    let centers = acf
        .windows
        .iter()
        .map(|w| median(w).unwrap_or(f64::NAN))
        .collect();

    CollapsedAcf { profile, centers }
}

/// `A exp(-(ν - μ)² / 2σ²)`, parameters `[A, σ, μ]`.
pub struct Gaussian;

impl CurveModel for Gaussian {
    fn n_params(&self) -> usize {
        3
    }

    fn eval(&self, x: f64, p: &[f64]) -> f64 {
        let z = (x - p[2]) / p[1];
        p[0] * (-0.5 * z * z).exp()
    }

    fn gradient(&self, x: f64, p: &[f64], out: &mut [f64]) {
        let (a, sigma, mu) = (p[0], p[1], p[2]);
        let d = x - mu;
        let e = (-0.5 * d * d / (sigma * sigma)).exp();
        out[0] = e;
        out[1] = a * e * d * d / (sigma * sigma * sigma);
        out[2] = a * e * d / (sigma * sigma);
    }
}

/// Gaussian fit to the collapsed profile.
#[derive(Debug, Clone, Serialize)]
pub struct GaussianFit {
    pub amplitude: f64,
    pub sigma: f64,
    pub center: f64,
    /// Standard error of the center from the fit covariance.
    pub center_std: f64,
    #[serde(skip)]
    pub covariance: DMatrix<f64>,
    /// Initial νmax guess (maximum of the smoothed profile).
    pub guess: f64,
    /// Number of profile points inside the fit window.
    pub n_points: usize,
}

/// Mode-spacing scale `(2/3) ν^(22/25)` used for the width guess and window.
pub fn gaussian_width_guess(numax: f64) -> f64 {
    (2.0 / 3.0) * numax.powf(22.0 / 25.0)
}

/// Profile averaged over `±½ · gaussian_width_guess(ν)` around each center.
pub fn smoothed_profile(collapsed: &CollapsedAcf) -> Vec<f64> {
    let CollapsedAcf { profile, centers } = collapsed;
    centers
        .iter()
        .map(|&c| {
            if !c.is_finite() {
                return f64::NAN;
            }
            let half = 0.5 * gaussian_width_guess(c);
            let (sum, n) = centers
                .iter()
                .zip(profile)
                .filter(|(cj, v)| v.is_finite() && (**cj - c).abs() <= half)
                .fold((0.0, 0usize), |(sum, n), (_, v)| (sum + v, n + 1));
            if n == 0 { f64::NAN } else { sum / n as f64 }
        })
        .collect()
}

/// Reject fits that do not describe a resolved, positive bump near the guess.
fn check_shape(params: &[f64], guess: f64, window: f64, sampling: f64) -> Result<(), FitError> {
    let (amplitude, sigma, center) = (params[0], params[1].abs(), params[2]);
    if !(amplitude > 0.0) {
        return Err(FitError::Degenerate("non-positive amplitude"));
    }
    if !(sigma >= sampling) {
        return Err(FitError::Degenerate("narrower than one profile step"));
    }
    if !((center - guess).abs() <= window) {
        return Err(FitError::Degenerate("center left the fit window"));
    }
    Ok(())
}

/// Locate the smoothed-profile maximum (excluding the first window) and fit
/// a Gaussian around it.
pub fn fit_collapsed(collapsed: &CollapsedAcf, max_iterations: usize) -> Result<GaussianFit, FitError> {
    let profile = &collapsed.profile;
    let centers = &collapsed.centers;
    if profile.len() < 2 {
        return Err(FitError::TooFewPoints {
            n_points: profile.len(),
            n_params: 3,
        });
    }
    let smoothed = smoothed_profile(collapsed);
    let idx = 1 + nan_argmax(&smoothed[1..]).ok_or(FitError::NonFinite)?;
    let guess = centers[idx];
    if !(guess.is_finite() && guess > 0.0) {
        return Err(FitError::NonFinite);
    }

    let mut y = profile.clone();
    recenter(&mut y);

    let window = 4.0 * gaussian_width_guess(guess);
    let (x, y): (Vec<f64>, Vec<f64>) = centers
        .iter()
        .zip(&y)
        .filter(|(c, v)| c.is_finite() && v.is_finite() && (**c - guess).abs() < window)
        .map(|(c, v)| (*c, *v))
        .unzip();

    let opts = LmOptions {
        max_iterations,
        ..LmOptions::default()
    };
    let p0 = [1.0, gaussian_width_guess(guess), guess];
    let fit = levenberg_marquardt(&Gaussian, &x, &y, &p0, &opts)?;
    let sampling = (x[x.len() - 1] - x[0]) / (x.len() - 1) as f64;
    check_shape(&fit.params, guess, window, sampling)?;

    let center_std = fit.covariance[(2, 2)].sqrt();
    if !center_std.is_finite() {
        return Err(FitError::SingularCovariance);
    }
    Ok(GaussianFit {
        amplitude: fit.params[0],
        sigma: fit.params[1].abs(),
        center: fit.params[2],
        center_std,
        covariance: fit.covariance,
        guess,
        n_points: x.len(),
    })
}
