//! The four νmax proxies and their shared result types.
//!
//! - two-dimensional autocorrelation of the relative-power spectrum (`acf`)
//! - coefficient of variation in adaptive bins (`cov`)
//! - high-pass aggregate power plus a regression mapping (`fliper`)
//! - closed-form scaling relations from stellar parameters (`scaling`)
//!
//! Every proxy reports a [`ProxyOutcome`]: a computed value, a value that is
//! undefined for this data, or a skip because an external input was missing.
//! Proxies never return an error for data-quality problems.

pub mod acf;
pub mod cov;
pub mod fliper;
pub mod scaling;

pub use acf::*;
pub use cov::*;
pub use fliper::*;
pub use scaling::*;

use std::fmt;

use serde::Serialize;

use crate::domain::Measurement;

/// A computed νmax value, with or without an uncertainty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EstimateValue {
    Measured(Measurement),
    Plain(f64),
}

impl EstimateValue {
    pub fn nominal(&self) -> f64 {
        match self {
            EstimateValue::Measured(m) => m.value,
            EstimateValue::Plain(v) => *v,
        }
    }

    pub fn std_dev(&self) -> Option<f64> {
        match self {
            EstimateValue::Measured(m) => Some(m.std_dev),
            EstimateValue::Plain(_) => None,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.nominal().is_finite()
    }
}

impl fmt::Display for EstimateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EstimateValue::Measured(m) => fmt::Display::fmt(m, f),
            EstimateValue::Plain(v) => fmt::Display::fmt(v, f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProxyOutcome {
    Computed { value: EstimateValue },
    /// The method ran but the data did not define a value.
    Undefined { reason: String },
    /// The method did not run because an external input was missing.
    Skipped { reason: String },
}

impl ProxyOutcome {
    pub fn computed(value: EstimateValue) -> Self {
        ProxyOutcome::Computed { value }
    }

    pub fn undefined(reason: impl Into<String>) -> Self {
        ProxyOutcome::Undefined { reason: reason.into() }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        ProxyOutcome::Skipped { reason: reason.into() }
    }

    /// A computed value with a finite nominal part.
    pub fn finite_value(&self) -> Option<EstimateValue> {
        match self {
            ProxyOutcome::Computed { value } if value.is_finite() => Some(*value),
            _ => None,
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            ProxyOutcome::Computed { .. } => "computed",
            ProxyOutcome::Undefined { .. } => "undefined",
            ProxyOutcome::Skipped { .. } => "skipped",
        }
    }
}

/// One tagged proxy result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProxyEstimate {
    pub tag: String,
    #[serde(flatten)]
    pub outcome: ProxyOutcome,
}

impl ProxyEstimate {
    pub fn new(tag: impl Into<String>, outcome: ProxyOutcome) -> Self {
        Self {
            tag: tag.into(),
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finite_value_only_for_finite_computed() {
        let ok = ProxyOutcome::computed(EstimateValue::Plain(120.0));
        let nan = ProxyOutcome::computed(EstimateValue::Measured(Measurement::new(f64::NAN, 1.0)));
        assert_eq!(ok.finite_value().map(|v| v.nominal()), Some(120.0));
        assert!(nan.finite_value().is_none());
        assert!(ProxyOutcome::undefined("fit failed").finite_value().is_none());
        assert!(ProxyOutcome::skipped("no model").finite_value().is_none());
    }

    #[test]
    fn serializes_with_status_tag() {
        let est = ProxyEstimate::new("numax_CoV", ProxyOutcome::computed(EstimateValue::Measured(Measurement::new(100.0, 2.0))));
        let json = serde_json::to_value(&est).unwrap();
        assert_eq!(json["tag"], "numax_CoV");
        assert_eq!(json["status"], "computed");
        assert_eq!(json["value"]["value"], 100.0);
        assert_eq!(json["value"]["std_dev"], 2.0);
    }
}
