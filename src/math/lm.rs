//! Nonlinear least squares (Levenberg–Marquardt).
//!
//! We minimize `Σ (y_i - f(x_i; p))²` for a small parameter vector `p`.
//! Each iteration solves the damped Gauss–Newton step as an augmented linear
//! least-squares problem
//!
//! ```text
//! [ J      ] δ ≈ [ r ]
//! [ √λ · D ]     [ 0 ]
//! ```
//!
//! with `D = diag(‖J_j‖)` (Marquardt scaling). With the SVD `J D⁻¹ = U S Vᵀ`
//! the step is `D⁻¹ V diag(s / (s² + λ)) Uᵀ r`, so a rejected step is retried
//! at a larger `λ` without refactoring. Steps that lower the cost are accepted
//! and relax `λ`; rejected steps stiffen it.
//!
//! After convergence the parameter covariance is
//! `(JᵀJ)⁻¹ · SSE / (m - n) = D⁻¹ V S⁻² Vᵀ D⁻¹ · SSE / (m - n)`.
//! A singular or non-finite covariance is reported as an error: a fit whose
//! parameters cannot be assigned uncertainties is not trusted downstream.

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

/// A model `f(x; p)` with an analytic gradient `∂f/∂p`.
pub trait CurveModel {
    fn n_params(&self) -> usize;
    fn eval(&self, x: f64, params: &[f64]) -> f64;
    fn gradient(&self, x: f64, params: &[f64], out: &mut [f64]);
}

#[derive(Debug, Clone)]
pub struct LmOptions {
    pub max_iterations: usize,
    /// Relative cost reduction below which the fit is converged.
    pub ftol: f64,
    /// Relative step size below which the fit is converged.
    pub xtol: f64,
    pub initial_lambda: f64,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_iterations: 800,
            ftol: 1.49e-8,
            xtol: 1.49e-8,
            initial_lambda: 1e-3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CurveFit {
    pub params: Vec<f64>,
    pub covariance: DMatrix<f64>,
    pub sse: f64,
    pub iterations: usize,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("need more than {n_params} points to fit {n_params} parameters, got {n_points}")]
    TooFewPoints { n_points: usize, n_params: usize },
    #[error("non-finite values in fit input or model output")]
    NonFinite,
    #[error("no convergence after {0} iterations")]
    NoConvergence(usize),
    #[error("parameter covariance could not be estimated")]
    SingularCovariance,
    #[error("degenerate fit: {0}")]
    Degenerate(&'static str),
}

const MAX_LAMBDA: f64 = 1e16;

/// Singular values below this fraction of the largest are treated as zero.
const RANK_TOLERANCE: f64 = 1e-7;

/// SVD of the column-scaled Jacobian `J · D⁻¹`, `D = diag(‖J_j‖)`.
///
/// One decomposition serves every damping level tried at the same parameters
/// and, at the solution, the covariance.
#[derive(Debug, Clone)]
struct ScaledJacobian {
    /// `Uᵀ r` for the residuals the decomposition was built with.
    projected: DVector<f64>,
    singular: DVector<f64>,
    v: DMatrix<f64>,
    column_scale: Vec<f64>,
}

impl ScaledJacobian {
    fn new(jac: &DMatrix<f64>, resid: &DVector<f64>) -> Option<Self> {
        if jac.iter().chain(resid.iter()).any(|v| !v.is_finite()) {
            return None;
        }
        let column_scale: Vec<f64> = jac.column_iter().map(|c| c.norm().max(1e-12)).collect();
        let mut scaled = jac.clone();
        for (mut column, scale) in scaled.column_iter_mut().zip(&column_scale) {
            column /= *scale;
        }

        let svd = scaled.svd(true, true);
        let u = svd.u?;
        let v = svd.v_t?.transpose();
        Some(Self {
            projected: u.transpose() * resid,
            singular: svd.singular_values,
            v,
            column_scale,
        })
    }

    fn cutoff(&self) -> f64 {
        self.singular.max() * RANK_TOLERANCE
    }

    /// Minimizer of `‖J δ - r‖² + λ ‖D δ‖²`.
    fn step(&self, lambda: f64) -> DVector<f64> {
        let cutoff = self.cutoff();
        let filtered = DVector::from_iterator(
            self.singular.len(),
            self.singular.iter().zip(self.projected.iter()).map(|(&s, &ur)| {
                if s > cutoff { s * ur / (s * s + lambda) } else { 0.0 }
            }),
        );
        let mut step = &self.v * filtered;
        for (d, scale) in step.iter_mut().zip(&self.column_scale) {
            *d /= scale;
        }
        step
    }

    /// `(JᵀJ)⁻¹ · sse / dof`, or `None` when `J` is rank deficient.
    fn covariance(&self, sse: f64, dof: usize) -> Option<DMatrix<f64>> {
        let s_max = self.singular.max();
        if !(s_max.is_finite() && s_max > 0.0) || self.singular.min() <= self.cutoff() {
            return None;
        }
        let n = self.singular.len();
        let mut cov = DMatrix::<f64>::zeros(n, n);
        for (k, &s) in self.singular.iter().enumerate() {
            let vk = self.v.column(k).into_owned();
            cov += (&vk * vk.transpose()) / (s * s);
        }
        for i in 0..n {
            for j in 0..n {
                cov[(i, j)] *= sse / dof as f64 / (self.column_scale[i] * self.column_scale[j]);
            }
        }
        cov.iter().all(|v| v.is_finite()).then_some(cov)
    }
}

/// Fit `model` to `(x, y)` starting from `p0`.
pub fn levenberg_marquardt<M: CurveModel>(
    model: &M,
    x: &[f64],
    y: &[f64],
    p0: &[f64],
    opts: &LmOptions,
) -> Result<CurveFit, FitError> {
    let m = x.len().min(y.len());
    let n = model.n_params();
    if m <= n {
        return Err(FitError::TooFewPoints {
            n_points: m,
            n_params: n,
        });
    }
    if x.iter().chain(y.iter()).chain(p0.iter()).any(|v| !v.is_finite()) {
        return Err(FitError::NonFinite);
    }

    let mut params = p0.to_vec();
    let mut cost = sum_squares(model, x, y, &params).ok_or(FitError::NonFinite)?;
    let mut lambda = opts.initial_lambda;
    let mut linearized: Option<ScaledJacobian> = None;

    for iteration in 1..=opts.max_iterations {
        if cost == 0.0 {
            return finish(model, x, y, params, cost, iteration);
        }

        // Rejected steps keep the decomposition; only λ changes.
        let jac = match linearized.take() {
            Some(jac) => jac,
            None => {
                let (jac, resid) = jacobian_and_residuals(model, x, y, &params);
                ScaledJacobian::new(&jac, &resid).ok_or(FitError::NonFinite)?
            }
        };
        let step = jac.step(lambda);

        let candidate: Vec<f64> = params.iter().zip(step.iter()).map(|(p, d)| p + d).collect();
        let step_small = step_is_small(&params, step.as_slice(), opts.xtol);

        match sum_squares(model, x, y, &candidate) {
            Some(new_cost) if new_cost < cost => {
                let reduction = cost - new_cost;
                params = candidate;
                cost = new_cost;
                lambda = (lambda / 10.0).max(1e-12);
                if reduction <= opts.ftol * cost.max(f64::MIN_POSITIVE) || step_small {
                    return finish(model, x, y, params, cost, iteration);
                }
            }
            _ => {
                // Nothing left to gain at this resolution.
                if step_small {
                    return finish(model, x, y, params, cost, iteration);
                }
                linearized = Some(jac);
                lambda *= 10.0;
                if lambda > MAX_LAMBDA {
                    return Err(FitError::NoConvergence(iteration));
                }
            }
        }
    }

    Err(FitError::NoConvergence(opts.max_iterations))
}

fn finish<M: CurveModel>(
    model: &M,
    x: &[f64],
    y: &[f64],
    params: Vec<f64>,
    sse: f64,
    iterations: usize,
) -> Result<CurveFit, FitError> {
    if params.iter().any(|p| !p.is_finite()) {
        return Err(FitError::NonFinite);
    }
    let (jac, resid) = jacobian_and_residuals(model, x, y, &params);
    let covariance = ScaledJacobian::new(&jac, &resid)
        .and_then(|j| j.covariance(sse, jac.nrows() - jac.ncols()))
        .ok_or(FitError::SingularCovariance)?;
    Ok(CurveFit {
        params,
        covariance,
        sse,
        iterations,
    })
}

fn sum_squares<M: CurveModel>(model: &M, x: &[f64], y: &[f64], params: &[f64]) -> Option<f64> {
    let sse: f64 = x
        .iter()
        .zip(y.iter())
        .map(|(&xi, &yi)| {
            let r = yi - model.eval(xi, params);
            r * r
        })
        .sum();
    sse.is_finite().then_some(sse)
}

fn jacobian_and_residuals<M: CurveModel>(
    model: &M,
    x: &[f64],
    y: &[f64],
    params: &[f64],
) -> (DMatrix<f64>, DVector<f64>) {
    let m = x.len().min(y.len());
    let n = model.n_params();
    let mut jac = DMatrix::<f64>::zeros(m, n);
    let mut resid = DVector::<f64>::zeros(m);
    let mut row = vec![0.0; n];
    for i in 0..m {
        model.gradient(x[i], params, &mut row);
        for (j, g) in row.iter().enumerate() {
            jac[(i, j)] = *g;
        }
        resid[i] = y[i] - model.eval(x[i], params);
    }
    (jac, resid)
}

fn step_is_small(params: &[f64], step: &[f64], xtol: f64) -> bool {
    let p_norm = params.iter().map(|p| p * p).sum::<f64>().sqrt();
    let d_norm = step.iter().map(|d| d * d).sum::<f64>().sqrt();
    d_norm <= xtol * (p_norm + xtol)
}
