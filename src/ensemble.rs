//! The per-star collection of proxy results.
//!
//! Every proxy that ran keeps its slot, including failed ones, so callers can
//! tell which methods were attempted. Non-finite results are filtered when the
//! set is read, never when it is written.

use serde::Serialize;

use crate::proxies::{EstimateValue, ProxyEstimate};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NumaxEstimateSet {
    entries: Vec<ProxyEstimate>,
}

impl NumaxEstimateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a result; an existing entry with the same tag is replaced in place.
    pub fn insert(&mut self, estimate: ProxyEstimate) {
        match self.entries.iter_mut().find(|e| e.tag == estimate.tag) {
            Some(slot) => *slot = estimate,
            None => self.entries.push(estimate),
        }
    }

    pub fn extend(&mut self, estimates: impl IntoIterator<Item = ProxyEstimate>) {
        for estimate in estimates {
            self.insert(estimate);
        }
    }

    pub fn get(&self, tag: &str) -> Option<&ProxyEstimate> {
        self.entries.iter().find(|e| e.tag == tag)
    }

    /// Every slot, in insertion order.
    pub fn all(&self) -> &[ProxyEstimate] {
        &self.entries
    }

    /// Finite computed values only, in insertion order.
    pub fn valid(&self) -> Vec<(&str, EstimateValue)> {
        self.entries
            .iter()
            .filter_map(|e| e.outcome.finite_value().map(|v| (e.tag.as_str(), v)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tags whose outcome is not a finite value.
    pub fn failed(&self) -> Vec<&ProxyEstimate> {
        self.entries
            .iter()
            .filter(|e| e.outcome.finite_value().is_none())
            .collect()
    }
}

impl FromIterator<ProxyEstimate> for NumaxEstimateSet {
    fn from_iter<I: IntoIterator<Item = ProxyEstimate>>(iter: I) -> Self {
        let mut set = NumaxEstimateSet::new();
        set.extend(iter);
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Measurement;
    use crate::proxies::ProxyOutcome;

    fn computed(tag: &str, value: f64) -> ProxyEstimate {
        ProxyEstimate::new(tag, ProxyOutcome::computed(EstimateValue::Plain(value)))
    }

    #[test]
    fn valid_view_keeps_only_finite_entry() {
        let set: NumaxEstimateSet = [computed("numax_CoV", f64::NAN), computed("numax_FliPer", 120.0)]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
        let valid = set.valid();
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].0, "numax_FliPer");
        assert_eq!(valid[0].1.nominal(), 120.0);
    }

    #[test]
    fn measured_entries_check_nominal_value() {
        let mut set = NumaxEstimateSet::new();
        set.insert(ProxyEstimate::new(
            "numax_2DACF",
            ProxyOutcome::computed(EstimateValue::Measured(Measurement::new(101.0, f64::NAN))),
        ));
        set.insert(ProxyEstimate::new("numax_SR_logg_teff_0", ProxyOutcome::skipped("no catalog")));
        assert_eq!(set.valid().len(), 1);
        assert_eq!(set.failed().len(), 1);
    }

    #[test]
    fn reinsert_replaces_in_place() {
        let mut set = NumaxEstimateSet::new();
        set.insert(computed("a", 1.0));
        set.insert(computed("b", 2.0));
        set.insert(computed("a", 3.0));
        let tags: Vec<&str> = set.all().iter().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, vec!["a", "b"]);
        assert_eq!(set.get("a").and_then(|e| e.outcome.finite_value()).map(|v| v.nominal()), Some(3.0));
    }
}
