//! Sensory budget engine: derives the active load and checks it against caps.
//!
//! The active budget starts from a location's profile, adds the deltas of
//! every resolvable prop on the canonical axes, then clamps each axis to a
//! minimum of zero independently. There is no upper clamp: exceeding a cap is
//! reported by [`is_exceeded`], never repaired.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::core::catalog::CatalogStore;
use crate::schema::sensory::{Axis, SensoryLoad};

/// The currently active sensory load.
pub type SensoryBudget = SensoryLoad;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BudgetError {
    #[error("location not found: {0}")]
    LocationNotFound(String),
}

/// Policy limits on the active load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensoryBudgetCaps {
    /// Cap on the sum over all axes.
    pub total: u32,
    /// Cap on any single axis.
    pub per_axis: u32,
}

impl Default for SensoryBudgetCaps {
    fn default() -> Self {
        Self {
            total: 6,
            per_axis: 3,
        }
    }
}

impl SensoryBudgetCaps {
    /// Which caps a budget breaks.
    pub fn report(&self, budget: &SensoryBudget) -> CapReport {
        let total = budget.total();
        CapReport {
            total,
            total_exceeded: total > self.total,
            exceeded_axes: budget
                .iter()
                .filter(|&(_, value)| value > self.per_axis)
                .map(|(axis, _)| axis)
                .collect(),
        }
    }
}

/// True iff the sum exceeds `caps.total` or any axis exceeds `caps.per_axis`.
pub fn is_exceeded(budget: &SensoryBudget, caps: &SensoryBudgetCaps) -> bool {
    budget.total() > caps.total || budget.iter().any(|(_, value)| value > caps.per_axis)
}

/// The per-cap view of a budget, used to explain an overage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapReport {
    pub total: u32,
    pub total_exceeded: bool,
    pub exceeded_axes: Vec<Axis>,
}

impl CapReport {
    pub fn is_exceeded(&self) -> bool {
        self.total_exceeded || !self.exceeded_axes.is_empty()
    }
}

/// A computed budget together with what fell outside the canonical axes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BudgetBreakdown {
    pub budget: SensoryBudget,
    /// Summed deltas on non-canonical effect keys, e.g. `anxiety`.
    pub extra: BTreeMap<String, i64>,
    /// Prop ids that did not resolve in the catalog.
    pub skipped_props: Vec<String>,
}

/// Compute the active budget for a location and a set of props.
///
/// Fails only when the location is unknown. Unknown prop ids are skipped and
/// a prop listed twice counts once.
pub fn compute_budget<I, S>(
    catalog: &CatalogStore,
    location_id: &str,
    active_props: I,
) -> Result<SensoryBudget, BudgetError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    compute_breakdown(catalog, location_id, active_props).map(|b| b.budget)
}

/// [`compute_budget`] with diagnostics for non-canonical keys and skipped ids.
pub fn compute_breakdown<I, S>(
    catalog: &CatalogStore,
    location_id: &str,
    active_props: I,
) -> Result<BudgetBreakdown, BudgetError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let location = catalog
        .location(location_id)
        .ok_or_else(|| BudgetError::LocationNotFound(location_id.to_string()))?;

    let mut raw = [0i64; 5];
    for (slot, (_, value)) in raw.iter_mut().zip(location.sensory.iter()) {
        *slot = value as i64;
    }

    let mut extra = BTreeMap::new();
    let mut skipped_props = Vec::new();
    let mut seen = FxHashSet::default();

    for prop_id in active_props {
        let prop_id = prop_id.as_ref();
        if !seen.insert(prop_id.to_string()) {
            continue;
        }
        let Some(prop) = catalog.prop(prop_id) else {
            tracing::warn!(prop = prop_id, "skipping unknown prop");
            skipped_props.push(prop_id.to_string());
            continue;
        };
        for (key, &delta) in &prop.effect {
            match Axis::from_key(key) {
                Some(axis) => raw[axis as usize] += delta as i64,
                None => *extra.entry(key.clone()).or_insert(0) += delta as i64,
            }
        }
    }

    let mut budget = SensoryBudget::default();
    for (axis, value) in Axis::ALL.into_iter().zip(raw) {
        budget.set(axis, value.clamp(0, u32::MAX as i64) as u32);
    }

    Ok(BudgetBreakdown {
        budget,
        extra,
        skipped_props,
    })
}

/// A freshly computed budget and its exceeded flag, produced together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetEvaluation {
    pub budget: SensoryBudget,
    pub exceeded: bool,
}

/// Compute a budget and check it against `caps` in one step.
pub fn evaluate<I, S>(
    catalog: &CatalogStore,
    location_id: &str,
    active_props: I,
    caps: &SensoryBudgetCaps,
) -> Result<BudgetEvaluation, BudgetError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let budget = compute_budget(catalog, location_id, active_props)?;
    Ok(BudgetEvaluation {
        exceeded: is_exceeded(&budget, caps),
        budget,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::CatalogData;
    use crate::schema::catalog::{Location, Prop};

    fn prop(id: &str, effect: &[(&str, i32)]) -> Prop {
        Prop {
            id: id.to_string(),
            name: id.to_string(),
            effect: effect.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            nfc: None,
            emoji: String::new(),
        }
    }

    fn location(id: &str, sensory: SensoryLoad) -> Location {
        Location {
            id: id.to_string(),
            name: id.to_string(),
            sensory,
            emoji: String::new(),
        }
    }

    fn catalog() -> CatalogStore {
        CatalogStore::new(CatalogData {
            props: vec![
                prop("weighted-arms", &[("proprioceptive", -2), ("anxiety", -1)]),
                prop("noise-muffs", &[("audio", -2), ("anxiety", -1)]),
                prop("earplugs", &[("audio", -3)]),
                prop("drum", &[("audio", 2), ("social", 1)]),
            ],
            locations: vec![
                location("market-square", SensoryLoad::new(3, 3, 2, 0, 2)),
                location("quiet-room", SensoryLoad::new(1, 1, 1, 1, 1)),
                location("library", SensoryLoad::new(2, 1, 1, 1, 1)),
            ],
            ..CatalogData::default()
        })
        .unwrap()
    }

    #[test]
    fn market_square_with_weighted_arms() {
        let catalog = catalog();
        let breakdown = compute_breakdown(&catalog, "market-square", ["weighted-arms"]).unwrap();
        assert_eq!(breakdown.budget, SensoryLoad::new(3, 3, 2, 0, 2));
        assert_eq!(breakdown.extra.get("anxiety"), Some(&-1));
        assert_eq!(breakdown.budget.total(), 10);
        assert!(is_exceeded(&breakdown.budget, &SensoryBudgetCaps::default()));
    }

    #[test]
    fn no_props_is_raw_profile() {
        let catalog = catalog();
        let budget = compute_budget(&catalog, "market-square", Vec::<String>::new()).unwrap();
        assert_eq!(budget, SensoryLoad::new(3, 3, 2, 0, 2));
        assert!(is_exceeded(&budget, &SensoryBudgetCaps::default()));
    }

    #[test]
    fn unknown_location_fails() {
        let catalog = catalog();
        assert_eq!(
            compute_budget(&catalog, "moon-base", ["weighted-arms"]),
            Err(BudgetError::LocationNotFound("moon-base".to_string()))
        );
    }

    #[test]
    fn unknown_props_are_skipped() {
        let catalog = catalog();
        let breakdown = compute_breakdown(&catalog, "quiet-room", ["jetpack", "noise-muffs"]).unwrap();
        assert_eq!(breakdown.budget, SensoryLoad::new(0, 1, 1, 1, 1));
        assert_eq!(breakdown.skipped_props, vec!["jetpack".to_string()]);
    }

    #[test]
    fn axes_clamp_independently() {
        let catalog = catalog();
        // audio: 1 - 2 - 3 = -4 clamps to 0; the deficit must not leak into other axes.
        let budget = compute_budget(&catalog, "quiet-room", ["noise-muffs", "earplugs"]).unwrap();
        assert_eq!(budget, SensoryLoad::new(0, 1, 1, 1, 1));
    }

    #[test]
    fn deltas_sum_before_clamping() {
        let catalog = catalog();
        // audio: 1 - 3 + 2 = 0, not max(0, 1 - 3) + 2 = 2.
        let budget = compute_budget(&catalog, "quiet-room", ["earplugs", "drum"]).unwrap();
        assert_eq!(budget.audio, 0);
        assert_eq!(budget.social, 2);
    }

    #[test]
    fn duplicate_props_count_once() {
        let catalog = catalog();
        let budget = compute_budget(&catalog, "market-square", ["drum", "drum"]).unwrap();
        assert_eq!(budget.audio, 5);
    }

    #[test]
    fn exceeded_boundaries() {
        let caps = SensoryBudgetCaps::default();
        // sum 6, all axes <= 3
        assert!(!is_exceeded(&SensoryLoad::new(2, 1, 1, 1, 1), &caps));
        assert!(!is_exceeded(&SensoryLoad::new(3, 3, 0, 0, 0), &caps));
        // sum 7 regardless of distribution
        assert!(is_exceeded(&SensoryLoad::new(2, 2, 1, 1, 1), &caps));
        assert!(is_exceeded(&SensoryLoad::new(3, 3, 1, 0, 0), &caps));
        // a single axis over the per-axis cap
        assert!(is_exceeded(&SensoryLoad::new(4, 0, 0, 0, 0), &caps));
        assert!(!is_exceeded(&SensoryLoad::default(), &caps));
    }

    #[test]
    fn custom_caps() {
        let caps = SensoryBudgetCaps {
            total: 12,
            per_axis: 4,
        };
        assert!(!is_exceeded(&SensoryLoad::new(3, 3, 2, 0, 2), &caps));
        assert!(is_exceeded(&SensoryLoad::new(5, 0, 0, 0, 0), &caps));
    }

    #[test]
    fn evaluate_pairs_budget_and_flag() {
        let catalog = catalog();
        let caps = SensoryBudgetCaps::default();
        let calm = evaluate(&catalog, "library", Vec::<&str>::new(), &caps).unwrap();
        assert_eq!(calm.budget.total(), 6);
        assert!(!calm.exceeded);
        let busy = evaluate(&catalog, "library", ["drum"], &caps).unwrap();
        assert!(busy.exceeded);
    }

    #[test]
    fn cap_report_lists_axes() {
        let report = SensoryBudgetCaps::default().report(&SensoryLoad::new(4, 3, 0, 0, 5));
        assert_eq!(report.total, 12);
        assert!(report.total_exceeded);
        assert_eq!(report.exceeded_axes, vec![Axis::Audio, Axis::Cognitive]);
        assert!(report.is_exceeded());
    }

    #[test]
    fn every_axis_non_negative_for_all_catalog_combinations() {
        let catalog = catalog();
        let prop_ids: Vec<&str> = catalog.props().iter().map(|p| p.id.as_str()).collect();
        for loc in catalog.locations() {
            for mask in 0u32..(1 << prop_ids.len()) {
                let active: Vec<&str> = prop_ids
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| mask & (1 << i) != 0)
                    .map(|(_, id)| *id)
                    .collect();
                let budget = compute_budget(&catalog, &loc.id, &active).unwrap();
                let raw_sum: i64 = Axis::ALL
                    .iter()
                    .map(|&axis| {
                        loc.sensory.get(axis) as i64
                            + active
                                .iter()
                                .filter_map(|id| catalog.prop(id))
                                .map(|p| p.delta(axis.key()) as i64)
                                .sum::<i64>()
                    })
                    .map(|v| v.max(0))
                    .sum();
                assert_eq!(budget.total() as i64, raw_sum);
            }
        }
    }
}
