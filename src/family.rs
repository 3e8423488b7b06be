use std::collections::BTreeMap;

use itertools::Itertools;
use serde::Serialize;

use crate::model::group::EntityKind;

/* Ordered suffix tables: the first matching suffix is stripped to obtain
 * the family base. "_today_energy" must come before "_energy", since ids
 * carrying the former also end with the latter. */

const ENERGY_SUFFIXES: &[&str] = &[
    "_today_energy",
    "_energy",
    "_energy_hourly",
    "_energy_daily",
    "_energy_weekly",
    "_energy_monthly",
    "_energy_yearly",
];

const POWER_SUFFIXES: &[&str] = &[
    "_power_energy_hourly",
    "_power_energy_daily",
    "_power_energy_weekly",
    "_power_energy_monthly",
    "_power_energy_yearly",
    "_power_energy",
    "_power",
];

/* Parent election preference, per kind. Whatever matches first becomes the
 * canonical parent; ids matching none fall back to the shortest string. */

const ENERGY_PARENT_PREFERENCE: &[&str] = &["_today_energy", "_energy"];
const POWER_PARENT_PREFERENCE: &[&str] = &["_power", "_power_energy"];

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Naming variants of one physical quantity, collapsed under a canonical
/// parent identifier. Recomputed on demand, never persisted.
#[derive(Clone, Debug, Serialize, Eq, PartialEq)]
pub struct Family {
    pub key: String,
    pub parent: Option<String>,
    pub children: Vec<String>,
    pub all: Vec<String>,
}

const fn suffixes_for(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Energy => ENERGY_SUFFIXES,
        EntityKind::Power => POWER_SUFFIXES,
    }
}

/// Strip the first matching kind-specific suffix to obtain the family base.
/// Ids matching no suffix (or consisting only of a suffix) are their own
/// base.
#[must_use]
pub fn family_base(entity_id: &str, kind: EntityKind) -> &str {
    for suffix in suffixes_for(kind) {
        if let Some(base) = entity_id.strip_suffix(suffix) {
            if !base.is_empty() {
                return base;
            }
        }
    }
    entity_id
}

fn pick_parent(members: &[String], kind: EntityKind) -> Option<String> {
    let preference = match kind {
        EntityKind::Energy => ENERGY_PARENT_PREFERENCE,
        EntityKind::Power => POWER_PARENT_PREFERENCE,
    };

    for suffix in preference {
        if let Some(found) = members.iter().find(|id| id.ends_with(suffix)) {
            return Some(found.clone());
        }
    }

    // fallback: shortest string, ties alphabetical (members are pre-sorted)
    members.first().cloned()
}

/// Group naming variants of the same physical quantity into families with
/// one canonical parent each.
///
/// Deterministic and idempotent: permuting the input order never changes
/// family contents or parent choice.
#[must_use]
pub fn build_families(entity_ids: &[String], kind: EntityKind, order: SortOrder) -> Vec<Family> {
    let mut by_base: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for id in entity_ids.iter().unique() {
        by_base
            .entry(family_base(id, kind).to_string())
            .or_default()
            .push(id.clone());
    }

    let mut families = by_base
        .into_iter()
        .map(|(key, mut all)| {
            all.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
            let parent = pick_parent(&all, kind);
            let children = all
                .iter()
                .filter(|id| Some(*id) != parent.as_ref())
                .sorted()
                .cloned()
                .collect();
            all.sort();
            Family {
                key,
                parent,
                children,
                all,
            }
        })
        .collect_vec();

    if order == SortOrder::Descending {
        families.reverse();
    }
    families
}
