use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Well-known set key for the exclusive room placement set.
pub const ROOMS: &str = "rooms";
/// Well-known set key for the multi-membership type category set.
pub const TYPES: &str = "types";

/// Which member list of a [`Group`] an entity belongs to.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Energy,
    Power,
}

impl EntityKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Energy => "energy",
            Self::Power => "power",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GroupMode {
    Auto,
    #[default]
    Manual,
    Mixed,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SetMode {
    Exclusive,
    Multi,
}

/// Default exclusivity policy for auto-created sets: room placement is
/// exclusive, everything else allows multi-membership.
#[must_use]
pub fn default_mode_for(set_key: &str) -> SetMode {
    if set_key == ROOMS {
        SetMode::Exclusive
    } else {
        SetMode::Multi
    }
}

/// The prior schema stored groups as bare entity-id arrays: under `rooms`
/// those were energy ids, under `types` power ids.
fn legacy_kind_for(set_key: &str) -> EntityKind {
    if set_key == ROOMS {
        EntityKind::Energy
    } else {
        EntityKind::Power
    }
}

/// A named bucket of entity identifiers, split into energy and power lists.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct Group {
    pub name: String,
    #[serde(default)]
    pub mode: GroupMode,
    #[serde(default)]
    pub energy: Vec<String>,
    #[serde(default)]
    pub power: Vec<String>,
}

impl Group {
    #[must_use]
    pub fn new(name: impl Into<String>, mode: GroupMode) -> Self {
        Self {
            name: name.into(),
            mode,
            energy: Vec::new(),
            power: Vec::new(),
        }
    }

    #[must_use]
    pub fn list(&self, kind: EntityKind) -> &[String] {
        match kind {
            EntityKind::Energy => &self.energy,
            EntityKind::Power => &self.power,
        }
    }

    pub fn list_mut(&mut self, kind: EntityKind) -> &mut Vec<String> {
        match kind {
            EntityKind::Energy => &mut self.energy,
            EntityKind::Power => &mut self.power,
        }
    }

    #[must_use]
    pub fn contains(&self, kind: EntityKind, entity_id: &str) -> bool {
        self.list(kind).iter().any(|id| id == entity_id)
    }

    /// Deduplicated append. Returns whether the id was actually added.
    pub fn add(&mut self, kind: EntityKind, entity_id: &str) -> bool {
        if self.contains(kind, entity_id) {
            return false;
        }
        self.list_mut(kind).push(entity_id.to_string());
        true
    }

    /// Returns whether the id was present.
    pub fn remove(&mut self, kind: EntityKind, entity_id: &str) -> bool {
        let list = self.list_mut(kind);
        let before = list.len();
        list.retain(|id| id != entity_id);
        list.len() != before
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.energy.is_empty() && self.power.is_empty()
    }
}

/// A named collection of groups sharing one exclusivity policy.
#[derive(Clone, Debug, Serialize, Eq, PartialEq)]
pub struct GroupSet {
    pub mode: SetMode,
    pub groups: BTreeMap<String, Group>,
}

impl GroupSet {
    #[must_use]
    pub const fn new(mode: SetMode) -> Self {
        Self {
            mode,
            groups: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }
}

/// The canonical, versioned collection of group sets. Persisted as a whole
/// by an external save collaborator; mutated only through the engine ops.
#[derive(Clone, Debug, Default, Serialize, Eq, PartialEq)]
pub struct GroupSets {
    pub sets: BTreeMap<String, GroupSet>,
    pub version: u32,
}

impl GroupSets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn set(&self, set_key: &str) -> Option<&GroupSet> {
        self.sets.get(set_key)
    }
}

/* Stored group values come in two shapes: the canonical record, and the
 * legacy bare array. All reads funnel through RawGroupValue::normalize, so
 * nothing outside this module ever sees the legacy shape. */

#[derive(Deserialize)]
#[serde(untagged)]
enum RawGroupValue {
    Legacy(Vec<String>),
    Canonical(RawGroup),
}

#[derive(Deserialize)]
struct RawGroup {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    mode: GroupMode,
    #[serde(default)]
    energy: Vec<String>,
    #[serde(default)]
    power: Vec<String>,
}

#[derive(Deserialize)]
struct RawGroupSet {
    #[serde(default)]
    mode: Option<SetMode>,
    #[serde(default)]
    groups: BTreeMap<String, RawGroupValue>,
}

#[derive(Deserialize)]
struct RawGroupSets {
    #[serde(default)]
    sets: BTreeMap<String, RawGroupSet>,
    #[serde(default)]
    version: u32,
}

impl RawGroupValue {
    fn normalize(self, set_key: &str, group_name: &str) -> Group {
        match self {
            Self::Legacy(members) => {
                let mut group = Group::new(group_name, GroupMode::Manual);
                let kind = legacy_kind_for(set_key);
                for id in &members {
                    group.add(kind, id);
                }
                group
            }
            Self::Canonical(raw) => {
                let name = raw.name.unwrap_or_else(|| group_name.to_string());
                let mut group = Group::new(name, raw.mode);
                for id in &raw.energy {
                    group.add(EntityKind::Energy, id);
                }
                for id in &raw.power {
                    group.add(EntityKind::Power, id);
                }
                group
            }
        }
    }
}

impl<'de> Deserialize<'de> for GroupSets {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawGroupSets::deserialize(deserializer)?;

        let mut sets = BTreeMap::new();
        for (set_key, raw_set) in raw.sets {
            let mode = raw_set.mode.unwrap_or_else(|| default_mode_for(&set_key));
            let groups = raw_set
                .groups
                .into_iter()
                .map(|(name, value)| {
                    let group = value.normalize(&set_key, &name);
                    (name, group)
                })
                .collect();
            sets.insert(set_key, GroupSet { mode, groups });
        }

        Ok(Self {
            sets,
            version: raw.version,
        })
    }
}
