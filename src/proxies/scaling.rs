//! νmax from asteroseismic scaling relations.
//!
//! All three relations are anchored to the Sun and differ only in which
//! catalog parameters stand in for the surface gravity:
//!
//! ```text
//! νmax = νmax☉ · 10^(logg − logg☉) / √(Teff / Teff☉)
//! νmax = νmax☉ · M R⁻² / √(Teff / Teff☉)
//! νmax = νmax☉ · (M / L) · (Teff / Teff☉)^3.5
//! ```
//!
//! Uncertainties propagate through [`Measurement`] arithmetic.

use serde::Serialize;

use crate::domain::{Measurement, ParameterRow, StarParameters};
use crate::proxies::{EstimateValue, ProxyEstimate, ProxyOutcome};

pub const LOGG_SUN: f64 = 4.44;
pub const TEFF_SUN: f64 = 5777.0;
pub const NUMAX_SUN: f64 = 3090.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingRelation {
    LoggTeff,
    MassRadiusTeff,
    MassLuminosityTeff,
}

impl ScalingRelation {
    pub const ALL: [ScalingRelation; 3] = [
        ScalingRelation::LoggTeff,
        ScalingRelation::MassRadiusTeff,
        ScalingRelation::MassLuminosityTeff,
    ];

    /// Estimate tag for parameter row `row`.
    pub fn tag(self, row: usize) -> String {
        let stem = match self {
            ScalingRelation::LoggTeff => "logg_teff",
            ScalingRelation::MassRadiusTeff => "mass_radius_teff",
            ScalingRelation::MassLuminosityTeff => "mass_luminosity_teff",
        };
        format!("numax_SR_{stem}_{row}")
    }

    /// `None` when the row lacks an input this relation needs.
    pub fn evaluate(self, row: &ParameterRow) -> Option<Measurement> {
        let teff_ratio = row.teff? / TEFF_SUN;
        let numax = match self {
            ScalingRelation::LoggTeff => NUMAX_SUN * (row.logg? - LOGG_SUN).exp10() / teff_ratio.sqrt(),
            ScalingRelation::MassRadiusTeff => NUMAX_SUN * row.radius?.powf(-2.0) * row.mass? / teff_ratio.sqrt(),
            ScalingRelation::MassLuminosityTeff => {
                NUMAX_SUN * (row.mass? / row.luminosity?) * teff_ratio.powf(3.5)
            }
        };
        Some(numax)
    }
}

/// Evaluate every relation on every parameter row.
///
/// Relations with missing inputs are left out; no parameters at all gives an
/// empty list.
pub fn numax_from_scaling(params: &StarParameters) -> Vec<ProxyEstimate> {
    let mut estimates = Vec::new();
    for (i, row) in params.rows().iter().enumerate() {
        for relation in ScalingRelation::ALL {
            if let Some(numax) = relation.evaluate(row) {
                let value = EstimateValue::Measured(numax);
                estimates.push(ProxyEstimate::new(relation.tag(i), ProxyOutcome::computed(value)));
            }
        }
    }
    log::debug!("scaling relations: {} estimates from {} rows", estimates.len(), params.rows().len());
    estimates
}
