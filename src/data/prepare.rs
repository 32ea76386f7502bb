//! Light-curve preparation.
//!
//! Turns raw `(time, flux, flux_err)` columns into a [`TimeSeries`] the spectral
//! estimator can use:
//! - rows with non-finite time or flux are dropped
//! - flux outliers sigma-clipped (5σ around the median by default)
//! - flux (and its errors) optionally converted to ppm around the median
//! - samples sorted by time, duplicate timestamps removed (first kept)
//! - time re-zeroed at the first sample
//! - long gaps closed: every gap above the threshold shrinks to one median cadence

use crate::domain::{PrepareConfig, TimeSeries};
use crate::error::NumaxError;
use crate::math::{median, sigma_clip_mask};

/// Unvalidated light-curve columns (time in days).
#[derive(Debug, Clone, Default)]
pub struct RawLightCurve {
    pub time: Vec<f64>,
    pub flux: Vec<f64>,
    pub flux_err: Option<Vec<f64>>,
}

/// What preparation changed, for logging and reports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrepareSummary {
    pub n_input: usize,
    pub n_non_finite: usize,
    pub n_outliers: usize,
    pub n_duplicates: usize,
    pub n_gaps_closed: usize,
    /// Total time removed by gap closing, days.
    pub gap_days_removed: f64,
}

#[derive(Debug, Clone)]
pub struct PreparedLightCurve {
    pub series: TimeSeries,
    pub summary: PrepareSummary,
}

pub fn prepare_light_curve(raw: &RawLightCurve, cfg: &PrepareConfig) -> Result<PreparedLightCurve, NumaxError> {
    let n_input = raw.time.len();
    if raw.flux.len() != n_input {
        return Err(NumaxError::invalid_input(format!(
            "flux length {} does not match time length {n_input}",
            raw.flux.len()
        )));
    }
    if let Some(err) = &raw.flux_err {
        if err.len() != n_input {
            return Err(NumaxError::invalid_input(format!(
                "flux_err length {} does not match time length {n_input}",
                err.len()
            )));
        }
    }

    let mut rows: Vec<(usize, f64, f64, f64)> = (0..n_input)
        .filter(|&i| raw.time[i].is_finite() && raw.flux[i].is_finite())
        .map(|i| {
            let err = raw.flux_err.as_ref().map_or(f64::NAN, |e| e[i]);
            (i, raw.time[i], raw.flux[i], err)
        })
        .collect();
    let n_non_finite = n_input - rows.len();

    let n_outliers = match cfg.outlier_sigma {
        Some(sigma) => {
            let fluxes: Vec<f64> = rows.iter().map(|r| r.2).collect();
            let keep = sigma_clip_mask(&fluxes, sigma, cfg.outlier_max_iters);
            let before = rows.len();
            let mut mask = keep.iter();
            rows.retain(|_| mask.next().copied().unwrap_or(true));
            let clipped = before - rows.len();
            if clipped > 0 {
                log::info!("clipped {clipped} flux outliers beyond {sigma} σ");
            }
            clipped
        }
        None => 0,
    };

    if cfg.normalize_to_ppm {
        let fluxes: Vec<f64> = rows.iter().map(|r| r.2).collect();
        let med = median(&fluxes).ok_or_else(|| NumaxError::invalid_input("light curve has no finite samples"))?;
        if !(med.is_finite() && med != 0.0) {
            return Err(NumaxError::invalid_input(format!(
                "cannot normalize to ppm around a median flux of {med}"
            )));
        }
        for r in &mut rows {
            r.2 = (r.2 / med - 1.0) * 1e6;
            r.3 = r.3 / med.abs() * 1e6;
        }
    }

    rows.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    let before = rows.len();
    rows.dedup_by(|later, earlier| later.1 == earlier.1);
    let n_duplicates = before - rows.len();

    if rows.len() < 2 {
        return Err(NumaxError::invalid_input(format!(
            "light curve needs at least 2 usable samples, got {}",
            rows.len()
        )));
    }

    let t0 = rows[0].1;
    let mut time: Vec<f64> = rows.iter().map(|r| r.1 - t0).collect();
    let (n_gaps_closed, gap_days_removed) = close_gaps(&mut time, cfg.gap_threshold_days);
    if n_gaps_closed > 0 {
        log::info!("closed {n_gaps_closed} gaps longer than {} d ({gap_days_removed:.2} d removed)", cfg.gap_threshold_days);
    }

    let flux = rows.iter().map(|r| r.2).collect();
    let flux_err = rows.iter().map(|r| r.3).collect();
    let series = TimeSeries::new(time, flux, Some(flux_err))?;

    Ok(PreparedLightCurve {
        series,
        summary: PrepareSummary {
            n_input,
            n_non_finite,
            n_outliers,
            n_duplicates,
            n_gaps_closed,
            gap_days_removed,
        },
    })
}

/// Shrink every step longer than `threshold` to the median step.
///
/// `time` must be strictly increasing; it stays strictly increasing.
/// Returns the number of gaps closed and the total time removed.
pub fn close_gaps(time: &mut [f64], threshold: f64) -> (usize, f64) {
    if time.len() < 2 {
        return (0, 0.0);
    }
    let steps: Vec<f64> = time.windows(2).map(|w| w[1] - w[0]).collect();
    let cadence = median(&steps).unwrap_or(0.0);

    let mut shift = 0.0;
    let mut closed = 0;
    for (i, step) in steps.iter().enumerate() {
        if *step > threshold && cadence > 0.0 && cadence < *step {
            shift += step - cadence;
            closed += 1;
        }
        time[i + 1] -= shift;
    }
    (closed, shift)
}
