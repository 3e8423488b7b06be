use std::collections::BTreeMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::family::{SortOrder, build_families, family_base};
use crate::model::group::{EntityKind, GroupMode, GroupSets, ROOMS, TYPES};

/// One auto-classification rule: a case-insensitive substring pattern and
/// the type group it maps to.
///
/// Rules are evaluated in list order and the first match wins, so keep the
/// most specific patterns first.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct KeywordRule {
    pub pattern: String,
    pub group: String,
}

impl KeywordRule {
    #[must_use]
    pub fn new(pattern: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            group: group.into(),
        }
    }

    /// Stock rule list, most-specific-first ("water_heater" must precede
    /// "heater").
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        [
            ("washing_machine", "Laundry"),
            ("dishwasher", "Dishwasher"),
            ("water_heater", "Water heating"),
            ("freezer", "Refrigeration"),
            ("fridge", "Refrigeration"),
            ("oven", "Cooking"),
            ("heater", "Heating"),
            ("tv", "TV"),
            ("light", "Lighting"),
        ]
        .into_iter()
        .map(|(pattern, group)| Self::new(pattern, group))
        .collect()
    }

    #[must_use]
    fn matches(&self, entity_id_lc: &str) -> bool {
        !self.pattern.is_empty() && entity_id_lc.contains(&self.pattern.to_lowercase())
    }
}

/// Counts returned to the caller for UI feedback.
#[derive(Clone, Copy, Debug, Default, Serialize, Eq, PartialEq)]
pub struct ClassifyOutcome {
    pub typed: usize,
    pub linked_energy: usize,
}

/// Infer type-group membership for every power entity placed in a room, and
/// cross-link the matching energy family parent by shared family base.
///
/// Classification only ever adds membership in `types`; nothing is removed
/// from `rooms`. Unmatched entities are skipped, not errors.
pub fn classify_from_rooms(sets: &mut GroupSets, rules: &[KeywordRule]) -> ClassifyOutcome {
    let mut outcome = ClassifyOutcome::default();

    let Some(rooms) = sets.set(ROOMS) else {
        return outcome;
    };

    // index energy family parents across all rooms, keyed by family base
    let energy_ids = rooms
        .groups
        .values()
        .flat_map(|group| group.list(EntityKind::Energy).iter().cloned())
        .collect_vec();
    let energy_parents: BTreeMap<String, String> =
        build_families(&energy_ids, EntityKind::Energy, SortOrder::Ascending)
            .into_iter()
            .filter_map(|family| family.parent.map(|parent| (family.key, parent)))
            .collect();

    let power_ids = rooms
        .groups
        .values()
        .flat_map(|group| group.list(EntityKind::Power).iter().cloned())
        .collect_vec();

    for power_id in power_ids {
        let lowered = power_id.to_lowercase();
        let Some(rule) = rules.iter().find(|rule| rule.matches(&lowered)) else {
            continue;
        };

        let existed = sets
            .set(TYPES)
            .is_some_and(|set| set.groups.contains_key(&rule.group));
        let group = sets.ensure_group(TYPES, &rule.group);
        if existed {
            // auto entities landing in a hand-built group make it mixed
            if group.mode == GroupMode::Manual {
                group.mode = GroupMode::Mixed;
            }
        } else {
            group.mode = GroupMode::Auto;
        }

        if group.add(EntityKind::Power, &power_id) {
            outcome.typed += 1;
        }

        if let Some(parent) = energy_parents.get(family_base(&power_id, EntityKind::Power)) {
            if group.add(EntityKind::Energy, parent) {
                outcome.linked_energy += 1;
            }
        }
    }

    log::debug!(
        "Auto-classified {} power entities, linked {} energy parents",
        outcome.typed,
        outcome.linked_energy
    );
    outcome
}
