//! Values with first-order propagated uncertainties.
//!
//! Every proxy output and every catalog parameter is carried as a
//! [`Measurement`]. Operands are treated as independent: sums add errors in
//! quadrature, products and ratios add partial-derivative terms in quadrature.
//!
//! ```text
//! σ(a ± b)  = √(σa² + σb²)
//! σ(a · b)  = √((b σa)² + (a σb)²)
//! σ(a / b)  = √((σa / b)² + (a σb / b²)²)
//! σ(aⁿ)     = |n aⁿ⁻¹| σa
//! σ(10ᵃ)    = ln(10) 10ᵃ σa
//! ```

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub value: f64,
    pub std_dev: f64,
}

impl Measurement {
    pub fn new(value: f64, std_dev: f64) -> Self {
        Self {
            value,
            std_dev: std_dev.abs(),
        }
    }

    /// A value with no uncertainty.
    pub fn exact(value: f64) -> Self {
        Self::new(value, 0.0)
    }

    /// Whether the nominal value is finite (the uncertainty is not checked).
    pub fn is_finite(&self) -> bool {
        self.value.is_finite()
    }

    pub fn powf(self, n: f64) -> Self {
        let value = self.value.powf(n);
        let deriv = n * self.value.powf(n - 1.0);
        Self::new(value, deriv * self.std_dev)
    }

    pub fn sqrt(self) -> Self {
        let value = self.value.sqrt();
        Self::new(value, self.std_dev / (2.0 * value))
    }

    /// `10^self`.
    pub fn exp10(self) -> Self {
        let value = 10f64.powf(self.value);
        Self::new(value, std::f64::consts::LN_10 * value * self.std_dev)
    }
}

impl From<f64> for Measurement {
    fn from(value: f64) -> Self {
        Self::exact(value)
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match f.precision() {
            Some(p) => write!(f, "{:.*} ± {:.*}", p, self.value, p, self.std_dev),
            None => write!(f, "{} ± {}", self.value, self.std_dev),
        }
    }
}

impl Add for Measurement {
    type Output = Measurement;

    fn add(self, rhs: Measurement) -> Measurement {
        Measurement::new(self.value + rhs.value, self.std_dev.hypot(rhs.std_dev))
    }
}

impl Sub for Measurement {
    type Output = Measurement;

    fn sub(self, rhs: Measurement) -> Measurement {
        Measurement::new(self.value - rhs.value, self.std_dev.hypot(rhs.std_dev))
    }
}

impl Mul for Measurement {
    type Output = Measurement;

    fn mul(self, rhs: Measurement) -> Measurement {
        let err = (rhs.value * self.std_dev).hypot(self.value * rhs.std_dev);
        Measurement::new(self.value * rhs.value, err)
    }
}

impl Div for Measurement {
    type Output = Measurement;

    fn div(self, rhs: Measurement) -> Measurement {
        let value = self.value / rhs.value;
        let err = (self.std_dev / rhs.value).hypot(self.value * rhs.std_dev / (rhs.value * rhs.value));
        Measurement::new(value, err)
    }
}

impl Neg for Measurement {
    type Output = Measurement;

    fn neg(self) -> Measurement {
        Measurement::new(-self.value, self.std_dev)
    }
}

impl Add<f64> for Measurement {
    type Output = Measurement;

    fn add(self, rhs: f64) -> Measurement {
        Measurement::new(self.value + rhs, self.std_dev)
    }
}

impl Sub<f64> for Measurement {
    type Output = Measurement;

    fn sub(self, rhs: f64) -> Measurement {
        Measurement::new(self.value - rhs, self.std_dev)
    }
}

impl Mul<f64> for Measurement {
    type Output = Measurement;

    fn mul(self, rhs: f64) -> Measurement {
        Measurement::new(self.value * rhs, self.std_dev * rhs)
    }
}

impl Div<f64> for Measurement {
    type Output = Measurement;

    fn div(self, rhs: f64) -> Measurement {
        Measurement::new(self.value / rhs, self.std_dev / rhs)
    }
}

impl Mul<Measurement> for f64 {
    type Output = Measurement;

    fn mul(self, rhs: Measurement) -> Measurement {
        rhs * self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn sums_add_errors_in_quadrature() {
        let a = Measurement::new(10.0, 3.0);
        let b = Measurement::new(5.0, 4.0);
        let s = a + b;
        let d = a - b;
        assert!(close(s.value, 15.0, 1e-12));
        assert!(close(s.std_dev, 5.0, 1e-12));
        assert!(close(d.value, 5.0, 1e-12));
        assert!(close(d.std_dev, 5.0, 1e-12));
    }

    #[test]
    fn products_and_ratios_use_relative_errors() {
        let a = Measurement::new(2.0, 0.2); // 10 %
        let b = Measurement::new(4.0, 0.4); // 10 %
        let p = a * b;
        let q = a / b;
        let rel = (0.1f64 * 0.1 + 0.1 * 0.1).sqrt();
        assert!(close(p.value, 8.0, 1e-12));
        assert!(close(p.std_dev / p.value, rel, 1e-12));
        assert!(close(q.value, 0.5, 1e-12));
        assert!(close(q.std_dev / q.value, rel, 1e-12));
    }

    #[test]
    fn powers_scale_relative_error_by_exponent() {
        let a = Measurement::new(4.0, 0.4);
        let sq = a.sqrt();
        assert!(close(sq.value, 2.0, 1e-12));
        assert!(close(sq.std_dev, 0.1, 1e-12));

        let inv_sq = a.powf(-2.0);
        assert!(close(inv_sq.value, 1.0 / 16.0, 1e-12));
        assert!(close(inv_sq.std_dev / inv_sq.value, 0.2, 1e-12));

        let cube = a.powf(3.5);
        assert!(close(cube.std_dev / cube.value, 0.35, 1e-12));
    }

    #[test]
    fn exp10_propagates_log_error() {
        let x = Measurement::new(2.0, 0.01);
        let y = x.exp10();
        assert!(close(y.value, 100.0, 1e-9));
        assert!(close(y.std_dev, std::f64::consts::LN_10 * 100.0 * 0.01, 1e-9));
    }

    #[test]
    fn exact_values_stay_exact() {
        let a = Measurement::exact(3.0);
        let b = 2.0 * a / 4.0 + 1.0;
        assert_eq!(b.std_dev, 0.0);
        assert!(close(b.value, 2.5, 1e-12));
    }

    #[test]
    fn nan_nominal_is_not_finite() {
        assert!(!Measurement::new(f64::NAN, 1.0).is_finite());
        assert!(Measurement::new(1.0, f64::NAN).is_finite());
    }
}
