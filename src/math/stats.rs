//! Small descriptive statistics helpers.
//!
//! All functions return `None` instead of `NaN` when the input is too short, so
//! callers decide how a degenerate sample is represented.

use std::cmp::Ordering;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median; the average of the two middle values for even lengths.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// Sample standard deviation (divides by `n - 1`).
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Population standard deviation (divides by `n`).
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some((ss / values.len() as f64).sqrt())
}

/// Iterative two-sided sigma clipping around the median.
///
/// Returns a keep-mask. Each pass recomputes the median and standard
/// deviation of the kept values and rejects everything further than
/// `sigma · std` from the median; passes stop once nothing new is rejected
/// or after `max_iters`.
pub fn sigma_clip_mask(values: &[f64], sigma: f64, max_iters: usize) -> Vec<bool> {
    let mut keep = vec![true; values.len()];
    for _ in 0..max_iters {
        let kept: Vec<f64> = values.iter().zip(&keep).filter(|(_, k)| **k).map(|(v, _)| *v).collect();
        let (Some(center), Some(spread)) = (median(&kept), std_dev(&kept)) else {
            break;
        };
        if spread == 0.0 {
            break;
        }
        let mut rejected = 0;
        for (v, k) in values.iter().zip(keep.iter_mut()) {
            if *k && (v - center).abs() > sigma * spread {
                *k = false;
                rejected += 1;
            }
        }
        if rejected == 0 {
            break;
        }
    }
    keep
}

/// Index of the largest non-NaN value (first one on ties).
pub fn nan_argmax(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if v.partial_cmp(&b) != Some(Ordering::Greater) => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}
