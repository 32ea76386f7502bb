//! Composite Simpson quadrature on (possibly non-uniform) samples.
//!
//! For an odd number of samples the classic 1-4-1 panels cover the whole range.
//! For an even number, panels cover all but the last interval, which is
//! integrated with the quadratic through the final three samples.

/// Integrate `y(x)` sampled at strictly increasing `x`.
///
/// Returns `0.0` for fewer than two samples.
pub fn simpson(y: &[f64], x: &[f64]) -> f64 {
    let n = y.len().min(x.len());
    match n {
        0 | 1 => 0.0,
        2 => 0.5 * (x[1] - x[0]) * (y[0] + y[1]),
        _ if n % 2 == 1 => simpson_panels(&y[..n], &x[..n]),
        _ => {
            let mut total = simpson_panels(&y[..n - 1], &x[..n - 1]);
            let h0 = x[n - 2] - x[n - 3];
            let h1 = x[n - 1] - x[n - 2];
            let alpha = (2.0 * h1 * h1 + 3.0 * h0 * h1) / (6.0 * (h0 + h1));
            let beta = (h1 * h1 + 3.0 * h0 * h1) / (6.0 * h0);
            let eta = h1 * h1 * h1 / (6.0 * h0 * (h0 + h1));
            total += alpha * y[n - 1] + beta * y[n - 2] - eta * y[n - 3];
            total
        }
    }
}

/// Simpson panels over an odd number of samples.
fn simpson_panels(y: &[f64], x: &[f64]) -> f64 {
    let mut total = 0.0;
    let mut i = 0;
    while i + 2 < y.len() {
        let h0 = x[i + 1] - x[i];
        let h1 = x[i + 2] - x[i + 1];
        let hs = h0 + h1;
        total += hs / 6.0
            * (y[i] * (2.0 - h1 / h0) + y[i + 1] * hs * hs / (h0 * h1) + y[i + 2] * (2.0 - h0 / h1));
        i += 2;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_for_cubics_on_odd_grids() {
        let x: Vec<f64> = (0..11).map(|i| i as f64 * 0.2).collect();
        let y: Vec<f64> = x.iter().map(|v| v * v * v - v).collect();
        // ∫0^2 (x³ - x) dx = 4 - 2
        assert!((simpson(&y, &x) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn exact_for_quadratics_on_even_grids() {
        let x: Vec<f64> = (0..10).map(|i| i as f64 * 0.5).collect();
        let y: Vec<f64> = x.iter().map(|v| 3.0 * v * v + 1.0).collect();
        // ∫0^4.5 (3x² + 1) dx = 4.5³ + 4.5
        let expected = 4.5f64.powi(3) + 4.5;
        assert!((simpson(&y, &x) - expected).abs() < 1e-9);
    }

    #[test]
    fn degenerate_inputs() {
        assert_eq!(simpson(&[], &[]), 0.0);
        assert_eq!(simpson(&[1.0], &[0.0]), 0.0);
        assert_eq!(simpson(&[1.0, 3.0], &[0.0, 2.0]), 4.0);
    }
}
