//! Frequency resolution from the spectral window.
//!
//! The naive resolution `1 / T` ignores how gaps and uneven sampling widen the
//! response to a pure tone. We instead sample a unit sinusoid at half the
//! Nyquist frequency on the series' own timestamps, evaluate its periodogram on
//! a fine grid around the tone, normalize the peak to one and integrate. The
//! area of the normalized window is the effective resolution.

use std::f64::consts::PI;

use crate::domain::{DAY_SECONDS, SpectrumConfig, TimeSeries};
use crate::error::NumaxError;
use crate::math::simpson;
use crate::spectrum::LombScargle;

/// The normalized spectral window around the test tone.
#[derive(Debug, Clone)]
pub struct SpectralWindow {
    /// Offsets from the tone frequency, μHz.
    pub offset_uhz: Vec<f64>,
    /// Window power, 1 at zero offset.
    pub power: Vec<f64>,
}

/// Evaluate the spectral window of the series' sampling.
pub fn spectral_window(ts: &TimeSeries, cfg: &SpectrumConfig) -> Result<SpectralWindow, NumaxError> {
    let t = ts.time_seconds();
    let baseline_s = t[t.len() - 1] - t[0];
    let df0 = 1.0 / baseline_s;
    let tone_hz = 0.5 * ts.nyquist_uhz() * 1e-6;

    let width = cfg.window_width_factor * df0;
    let half = (cfg.oversampling * width / df0) as i64;
    if half < 1 {
        return Err(NumaxError::invalid_config("spectral window grid is empty"));
    }
    let step = df0 / cfg.oversampling;
    let grid: Vec<f64> = (-half..half).map(|k| tone_hz + step * k as f64).collect();

    let tone: Vec<f64> = t
        .iter()
        .map(|ti| {
            let phase = 2.0 * PI * tone_hz * (ti - t[0]);
            0.5 * phase.sin() + 0.5 * phase.cos()
        })
        .collect();

    let mut power = LombScargle::new(&t, &tone, None).power_uniform(grid[0], step, grid.len());
    let peak = power[half as usize];
    if !(peak.is_finite() && peak > 0.0) {
        return Err(NumaxError::invalid_input("spectral window has no power at the test-tone frequency"));
    }
    for p in &mut power {
        *p /= peak;
    }

    let offset_uhz = grid.iter().map(|f| (f - tone_hz) * 1e6).collect();
    Ok(SpectralWindow { offset_uhz, power })
}

/// Effective frequency resolution in μHz.
pub fn frequency_spacing(ts: &TimeSeries, cfg: &SpectrumConfig) -> Result<f64, NumaxError> {
    let window = spectral_window(ts, cfg)?;
    let df = simpson(&window.power, &window.offset_uhz);
    if !(df.is_finite() && df > 0.0) {
        return Err(NumaxError::invalid_input(format!(
            "spectral window integral is not positive ({df})"
        )));
    }
    log::debug!("frequency spacing {df:.6} μHz (naive {:.6} μHz)", 1e6 / (ts.baseline_days() * DAY_SECONDS));
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regular_series(n: usize, cadence_s: f64) -> TimeSeries {
        let dt = cadence_s / DAY_SECONDS;
        let time: Vec<f64> = (0..n).map(|i| i as f64 * dt).collect();
        let flux: Vec<f64> = (0..n).map(|i| (i as f64 * 0.37).sin()).collect();
        TimeSeries::new(time, flux, None).unwrap()
    }

    #[test]
    fn window_peaks_at_test_tone() {
        let ts = regular_series(2000, 1800.0);
        let w = spectral_window(&ts, &SpectrumConfig::default()).unwrap();
        assert_eq!(w.power.len(), 1000);
        assert!((w.power[500] - 1.0).abs() < 1e-12);
        assert!(w.offset_uhz[500].abs() < 1e-9);
        assert!(w.power.iter().all(|p| *p <= 1.0 + 1e-6));
    }

    #[test]
    fn spacing_is_of_order_inverse_baseline() {
        let ts = regular_series(2000, 1800.0);
        let naive = 1e6 / (ts.baseline_days() * DAY_SECONDS);
        let df = frequency_spacing(&ts, &SpectrumConfig::default()).unwrap();
        // The sinc² window of regular sampling integrates to ~1/T.
        assert!(df > 0.5 * naive && df < 2.0 * naive, "df = {df}, naive = {naive}");
    }

    #[test]
    fn gaps_widen_the_window() {
        let dense = regular_series(2000, 1800.0);

        let dt = 1800.0 / DAY_SECONDS;
        let time: Vec<f64> = (0..2000)
            .filter(|i| !(600..1400).contains(i))
            .map(|i| i as f64 * dt)
            .collect();
        let flux = vec![0.0; time.len()];
        let gappy = TimeSeries::new(time, flux, None).unwrap();

        let cfg = SpectrumConfig::default();
        let df_dense = frequency_spacing(&dense, &cfg).unwrap();
        let df_gappy = frequency_spacing(&gappy, &cfg).unwrap();
        assert!(df_gappy > df_dense, "{df_gappy} <= {df_dense}");
    }
}
