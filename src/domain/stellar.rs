//! Stellar parameters supplied by a catalog lookup.
//!
//! The lookup itself lives outside this crate. What arrives here is either
//! nothing, or one record of named catalog columns, each with a value and some
//! combination of lower bound, upper bound and symmetric uncertainty. A record
//! may carry several columns for the same physical parameter (e.g. a
//! spectroscopic and a photometric temperature); those become separate
//! [`ParameterRow`]s so every combination yields its own numbered estimate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::Measurement;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StellarParameter {
    Logg,
    Teff,
    Luminosity,
    Mass,
    Radius,
}

impl StellarParameter {
    pub const ALL: [StellarParameter; 5] = [
        StellarParameter::Logg,
        StellarParameter::Teff,
        StellarParameter::Luminosity,
        StellarParameter::Mass,
        StellarParameter::Radius,
    ];

    /// Route a catalog column to a parameter by its name prefix
    /// (`logg_gspphot` -> logg, `lum_flame` -> luminosity, ...).
    pub fn from_column(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        if name.starts_with("logg") {
            Some(StellarParameter::Logg)
        } else if name.starts_with("teff") {
            Some(StellarParameter::Teff)
        } else if name.starts_with("lum") {
            Some(StellarParameter::Luminosity)
        } else if name.starts_with("mass") {
            Some(StellarParameter::Mass)
        } else if name.starts_with("radius") {
            Some(StellarParameter::Radius)
        } else {
            None
        }
    }
}

/// One consistent set of parameters (any of which may be missing).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterRow {
    pub logg: Option<Measurement>,
    pub teff: Option<Measurement>,
    pub luminosity: Option<Measurement>,
    pub mass: Option<Measurement>,
    pub radius: Option<Measurement>,
}

impl ParameterRow {
    pub fn get(&self, param: StellarParameter) -> Option<Measurement> {
        match param {
            StellarParameter::Logg => self.logg,
            StellarParameter::Teff => self.teff,
            StellarParameter::Luminosity => self.luminosity,
            StellarParameter::Mass => self.mass,
            StellarParameter::Radius => self.radius,
        }
    }

    pub fn set(&mut self, param: StellarParameter, value: Option<Measurement>) {
        let slot = match param {
            StellarParameter::Logg => &mut self.logg,
            StellarParameter::Teff => &mut self.teff,
            StellarParameter::Luminosity => &mut self.luminosity,
            StellarParameter::Mass => &mut self.mass,
            StellarParameter::Radius => &mut self.radius,
        };
        *slot = value;
    }

    pub fn is_empty(&self) -> bool {
        StellarParameter::ALL.iter().all(|p| self.get(*p).is_none())
    }
}

/// A raw catalog column. A null or absent `value` means the catalog has
/// no entry for this column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CatalogValue {
    pub value: Option<f64>,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub uncertainty: Option<f64>,
}

impl CatalogValue {
    pub fn new(value: f64) -> Self {
        Self {
            value: Some(value),
            lower: None,
            upper: None,
            uncertainty: None,
        }
    }

    /// Resolve to a [`Measurement`].
    ///
    /// Precedence: explicit uncertainty, then half the `[lower, upper]` span,
    /// then a one-sided distance to whichever bound exists. Returns `None`
    /// unless both value and error end up finite.
    pub fn resolve(&self) -> Option<Measurement> {
        let finite = |v: Option<f64>| v.filter(|x| x.is_finite());
        let value = finite(self.value)?;
        let err = match (finite(self.uncertainty), finite(self.lower), finite(self.upper)) {
            (Some(u), _, _) => u,
            (None, Some(lo), Some(hi)) => (hi - lo) / 2.0,
            (None, Some(lo), None) => value - lo,
            (None, None, Some(hi)) => hi - value,
            (None, None, None) => return None,
        };
        err.is_finite().then(|| Measurement::new(value, err.abs()))
    }
}

/// Parameters for one star: zero or more rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StarParameters {
    rows: Vec<ParameterRow>,
}

impl StarParameters {
    pub fn from_rows(rows: Vec<ParameterRow>) -> Self {
        Self {
            rows: rows.into_iter().filter(|r| !r.is_empty()).collect(),
        }
    }

    /// Build rows from one catalog record.
    ///
    /// Columns are grouped per parameter in column-name order. Row `i` takes the
    /// `i`-th source of every parameter; a parameter with a single source is
    /// shared by all rows, and one with fewer sources than rows leaves the
    /// remaining rows empty for that parameter.
    pub fn from_catalog(record: &BTreeMap<String, CatalogValue>) -> Self {
        let mut sources: BTreeMap<StellarParameter, Vec<Measurement>> = BTreeMap::new();
        for (name, column) in record {
            let Some(param) = StellarParameter::from_column(name) else {
                continue;
            };
            if let Some(m) = column.resolve() {
                sources.entry(param).or_default().push(m);
            }
        }

        let n_rows = sources.values().map(Vec::len).max().unwrap_or(0);
        let rows = (0..n_rows)
            .map(|i| {
                let mut row = ParameterRow::default();
                for (param, values) in &sources {
                    let value = match values.len() {
                        1 => Some(values[0]),
                        _ => values.get(i).copied(),
                    };
                    row.set(*param, value);
                }
                row
            })
            .collect();

        Self::from_rows(rows)
    }

    /// Fill parameters that a row lacks from user-supplied values.
    ///
    /// Existing catalog values always win. With no rows at all, the overrides
    /// become the single row.
    pub fn with_overrides(mut self, overrides: &ParameterRow) -> Self {
        if overrides.is_empty() {
            return self;
        }
        if self.rows.is_empty() {
            self.rows.push(overrides.clone());
            return self;
        }
        for row in &mut self.rows {
            for param in StellarParameter::ALL {
                if row.get(param).is_none() {
                    row.set(param, overrides.get(param));
                }
            }
        }
        self
    }

    pub fn rows(&self) -> &[ParameterRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
