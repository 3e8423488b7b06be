use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::model::group::{
    EntityKind, Group, GroupMode, GroupSet, GroupSets, SetMode, default_mode_for,
};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum BulkAction {
    Move,
    Copy,
}

/// Scope of a bulk keyword assignment: the whole set, or one source group.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BulkScope {
    All,
    Group(String),
}

/// Counts returned to the caller for UI feedback.
#[derive(Clone, Copy, Debug, Default, Serialize, Eq, PartialEq)]
pub struct BulkOutcome {
    pub moved: usize,
    pub copied: usize,
}

/// The assignment engine: all mutations of the group-set collection go
/// through these operations. Every call is synchronous, in-memory and
/// all-or-nothing; missing sets and groups are created on demand instead
/// of failing ([`GroupSets::rename_group`] excepted).
impl GroupSets {
    pub fn ensure_set(&mut self, set_key: &str, default_mode: SetMode) -> &mut GroupSet {
        self.sets
            .entry(set_key.to_string())
            .or_insert_with(|| GroupSet::new(default_mode))
    }

    pub fn ensure_group(&mut self, set_key: &str, group_name: &str) -> &mut Group {
        let set = self.ensure_set(set_key, default_mode_for(set_key));
        set.groups
            .entry(group_name.to_string())
            .or_insert_with(|| Group::new(group_name, GroupMode::Manual))
    }

    /// Move ids from one group's list to another within the same set.
    ///
    /// Returns the number of identifiers newly appended to the target list.
    pub fn move_entities(
        &mut self,
        set_key: &str,
        from: &str,
        to: &str,
        entity_ids: &[String],
        kind: EntityKind,
    ) -> usize {
        if from == to {
            return 0;
        }

        {
            let source = self.ensure_group(set_key, from);
            for id in entity_ids {
                source.remove(kind, id);
            }
        }

        let target = self.ensure_group(set_key, to);
        let added = entity_ids.iter().filter(|id| target.add(kind, id)).count();
        if added > 0 {
            log::debug!("Moved {added} {kind} entities from [{from}] to [{to}] in set [{set_key}]");
        }
        added
    }

    /// As [`GroupSets::move_entities`], but the source list is untouched and
    /// only ids actually present in the source are copied.
    pub fn copy_entities(
        &mut self,
        set_key: &str,
        from: &str,
        to: &str,
        entity_ids: &[String],
        kind: EntityKind,
    ) -> usize {
        if from == to {
            return 0;
        }

        let present = {
            let source = self.ensure_group(set_key, from);
            entity_ids
                .iter()
                .filter(|id| source.contains(kind, id))
                .cloned()
                .collect_vec()
        };

        let target = self.ensure_group(set_key, to);
        present.iter().filter(|id| target.add(kind, id)).count()
    }

    /// Assign one entity to a group, honoring the set's exclusivity policy:
    /// in an exclusive set the id is first removed from every other group's
    /// list of the same kind. Appending an already-present id is a no-op.
    pub fn assign_with_exclusivity(
        &mut self,
        set_key: &str,
        group_name: &str,
        entity_id: &str,
        kind: EntityKind,
    ) {
        self.ensure_group(set_key, group_name);

        let set = self.ensure_set(set_key, default_mode_for(set_key));
        if set.mode == SetMode::Exclusive {
            for (name, other) in &mut set.groups {
                if name != group_name {
                    other.remove(kind, entity_id);
                }
            }
        }

        if let Some(group) = set.groups.get_mut(group_name) {
            group.add(kind, entity_id);
        }
    }

    /// Relocate a group under a new name, atomically.
    ///
    /// This is the one loud validation failure of the engine: a collision
    /// with an existing name returns [`EngineError::DuplicateGroupName`]
    /// and leaves the collection untouched, since a silent overwrite would
    /// destroy the target group's members.
    pub fn rename_group(&mut self, set_key: &str, old_name: &str, new_name: &str) -> EngineResult<()> {
        if old_name == new_name {
            return Ok(());
        }

        let set = self.ensure_set(set_key, default_mode_for(set_key));
        if set.groups.contains_key(new_name) {
            return Err(EngineError::DuplicateGroupName {
                set: set_key.to_string(),
                name: new_name.to_string(),
            });
        }

        let mut group = set
            .groups
            .remove(old_name)
            .unwrap_or_else(|| Group::new(old_name, GroupMode::Manual));
        group.name = new_name.to_string();
        set.groups.insert(new_name.to_string(), group);

        log::debug!("Renamed group [{old_name}] to [{new_name}] in set [{set_key}]");
        Ok(())
    }

    /// Remove a group. Its entities revert to unassigned, which is valid
    /// state, not an error. Returns whether the group existed.
    pub fn delete_group(&mut self, set_key: &str, group_name: &str) -> bool {
        let removed = self
            .sets
            .get_mut(set_key)
            .and_then(|set| set.groups.remove(group_name))
            .is_some();
        if removed {
            log::debug!("Deleted group [{group_name}] from set [{set_key}]");
        }
        removed
    }

    /// Case-insensitive substring match of `keyword` against every id in
    /// every energy/power list within `scope`, moving or copying matches
    /// into `target`. Self-moves are skipped as no-ops.
    pub fn bulk_keyword_assign(
        &mut self,
        set_key: &str,
        keyword: &str,
        action: BulkAction,
        target: &str,
        scope: &BulkScope,
    ) -> BulkOutcome {
        let mut outcome = BulkOutcome::default();

        let needle = keyword.trim().to_lowercase();
        if needle.is_empty() {
            return outcome;
        }
        let Some(set) = self.sets.get(set_key) else {
            return outcome;
        };

        let mut matches = Vec::new();
        for (name, group) in &set.groups {
            if name == target {
                continue;
            }
            if let BulkScope::Group(only) = scope {
                if name != only {
                    continue;
                }
            }
            for kind in [EntityKind::Energy, EntityKind::Power] {
                let ids = group
                    .list(kind)
                    .iter()
                    .filter(|id| id.to_lowercase().contains(&needle))
                    .cloned()
                    .collect_vec();
                if !ids.is_empty() {
                    matches.push((name.clone(), kind, ids));
                }
            }
        }

        for (name, kind, ids) in matches {
            match action {
                BulkAction::Move => {
                    outcome.moved += self.move_entities(set_key, &name, target, &ids, kind);
                }
                BulkAction::Copy => {
                    outcome.copied += self.copy_entities(set_key, &name, target, &ids, kind);
                }
            }
        }

        log::debug!(
            "Bulk assign [{keyword}] into [{target}]: {} moved, {} copied",
            outcome.moved,
            outcome.copied
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::group::ROOMS;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn ensure_set_is_idempotent() {
        let mut sets = GroupSets::new();
        sets.ensure_set(ROOMS, SetMode::Exclusive);
        sets.ensure_group(ROOMS, "Salon");
        // a second ensure with another mode must not clobber the first
        sets.ensure_set(ROOMS, SetMode::Multi);

        let set = sets.set(ROOMS).unwrap();
        assert_eq!(set.mode, SetMode::Exclusive);
        assert!(set.group("Salon").is_some());
    }

    #[test]
    fn exclusive_assignment_moves_between_groups() {
        let mut sets = GroupSets::new();
        sets.ensure_set(ROOMS, SetMode::Exclusive);
        sets.assign_with_exclusivity(ROOMS, "Salon", "sensor.x", EntityKind::Power);
        sets.assign_with_exclusivity(ROOMS, "Cuisine", "sensor.x", EntityKind::Power);

        let set = sets.set(ROOMS).unwrap();
        assert!(set.group("Salon").unwrap().power.is_empty());
        assert_eq!(set.group("Cuisine").unwrap().power, vec!["sensor.x"]);
    }

    #[test]
    fn exclusivity_holds_per_kind() {
        let mut sets = GroupSets::new();
        sets.ensure_set(ROOMS, SetMode::Exclusive);
        sets.assign_with_exclusivity(ROOMS, "Salon", "sensor.x", EntityKind::Power);
        sets.assign_with_exclusivity(ROOMS, "Cuisine", "sensor.x", EntityKind::Energy);

        // different kinds do not evict each other
        let set = sets.set(ROOMS).unwrap();
        assert_eq!(set.group("Salon").unwrap().power, vec!["sensor.x"]);
        assert_eq!(set.group("Cuisine").unwrap().energy, vec!["sensor.x"]);
    }

    #[test]
    fn multi_sets_allow_repeated_membership() {
        let mut sets = GroupSets::new();
        sets.assign_with_exclusivity("types", "TV", "sensor.x", EntityKind::Power);
        sets.assign_with_exclusivity("types", "Media", "sensor.x", EntityKind::Power);

        let set = sets.set("types").unwrap();
        assert_eq!(set.group("TV").unwrap().power, vec!["sensor.x"]);
        assert_eq!(set.group("Media").unwrap().power, vec!["sensor.x"]);
    }

    #[test]
    fn move_round_trip_restores_membership() {
        let mut sets = GroupSets::new();
        let group = sets.ensure_group(ROOMS, "Salon");
        group.add(EntityKind::Energy, "sensor.a_energy");
        group.add(EntityKind::Energy, "sensor.b_energy");

        let moved = ids(&["sensor.a_energy"]);
        assert_eq!(
            sets.move_entities(ROOMS, "Salon", "Cuisine", &moved, EntityKind::Energy),
            1
        );
        assert!(!sets.set(ROOMS).unwrap().group("Salon").unwrap().contains(
            EntityKind::Energy,
            "sensor.a_energy"
        ));

        sets.move_entities(ROOMS, "Cuisine", "Salon", &moved, EntityKind::Energy);
        let salon = sets.set(ROOMS).unwrap().group("Salon").unwrap();
        assert!(salon.contains(EntityKind::Energy, "sensor.a_energy"));
        assert!(salon.contains(EntityKind::Energy, "sensor.b_energy"));
        assert!(
            sets.set(ROOMS)
                .unwrap()
                .group("Cuisine")
                .unwrap()
                .energy
                .is_empty()
        );
    }

    #[test]
    fn move_to_self_is_a_noop() {
        let mut sets = GroupSets::new();
        sets.ensure_group(ROOMS, "Salon")
            .add(EntityKind::Power, "sensor.x");
        assert_eq!(
            sets.move_entities(ROOMS, "Salon", "Salon", &ids(&["sensor.x"]), EntityKind::Power),
            0
        );
        assert_eq!(sets.set(ROOMS).unwrap().group("Salon").unwrap().power, vec!["sensor.x"]);
    }

    #[test]
    fn copy_leaves_source_intact() {
        let mut sets = GroupSets::new();
        let group = sets.ensure_group(ROOMS, "Salon");
        group.add(EntityKind::Power, "sensor.a_power");

        // one present, one absent: only the present id is copied
        let copied = sets.copy_entities(
            ROOMS,
            "Salon",
            "Cuisine",
            &ids(&["sensor.a_power", "sensor.ghost_power"]),
            EntityKind::Power,
        );
        assert_eq!(copied, 1);

        let set = sets.set(ROOMS).unwrap();
        assert_eq!(set.group("Salon").unwrap().power, vec!["sensor.a_power"]);
        assert_eq!(set.group("Cuisine").unwrap().power, vec!["sensor.a_power"]);
    }

    #[test]
    fn rename_collision_fails_loudly_and_changes_nothing() {
        let mut sets = GroupSets::new();
        sets.ensure_group(ROOMS, "Salon")
            .add(EntityKind::Power, "sensor.a_power");
        sets.ensure_group(ROOMS, "Cuisine")
            .add(EntityKind::Power, "sensor.b_power");

        let before = sets.clone();
        let result = sets.rename_group(ROOMS, "Salon", "Cuisine");
        assert!(matches!(
            result,
            Err(EngineError::DuplicateGroupName { .. })
        ));
        assert_eq!(sets, before);
    }

    #[test]
    fn rename_relocates_value_and_name() {
        let mut sets = GroupSets::new();
        sets.ensure_group(ROOMS, "Salon")
            .add(EntityKind::Power, "sensor.a_power");

        sets.rename_group(ROOMS, "Salon", "Living room").unwrap();
        let set = sets.set(ROOMS).unwrap();
        assert!(set.group("Salon").is_none());
        let renamed = set.group("Living room").unwrap();
        assert_eq!(renamed.name, "Living room");
        assert_eq!(renamed.power, vec!["sensor.a_power"]);
    }

    #[test]
    fn delete_group_unassigns_entities() {
        let mut sets = GroupSets::new();
        sets.ensure_group(ROOMS, "Salon")
            .add(EntityKind::Power, "sensor.a_power");

        assert!(sets.delete_group(ROOMS, "Salon"));
        assert!(!sets.delete_group(ROOMS, "Salon"));
        assert!(sets.set(ROOMS).unwrap().group("Salon").is_none());
    }

    #[test]
    fn bulk_keyword_move_and_copy() {
        let mut sets = GroupSets::new();
        sets.ensure_set(ROOMS, SetMode::Exclusive);
        let salon = sets.ensure_group(ROOMS, "Salon");
        salon.add(EntityKind::Power, "sensor.TV_salon_power");
        salon.add(EntityKind::Energy, "sensor.tv_salon_energy");
        salon.add(EntityKind::Power, "sensor.lamp_power");
        sets.ensure_group(ROOMS, "Bureau")
            .add(EntityKind::Power, "sensor.tv_bureau_power");

        let outcome =
            sets.bulk_keyword_assign(ROOMS, "TV", BulkAction::Move, "Media", &BulkScope::All);
        // case-insensitive: both power ids and the energy id match
        assert_eq!(outcome.moved, 3);
        assert_eq!(outcome.copied, 0);

        let set = sets.set(ROOMS).unwrap();
        assert_eq!(set.group("Salon").unwrap().power, vec!["sensor.lamp_power"]);
        assert!(set.group("Bureau").unwrap().power.is_empty());
        let media = set.group("Media").unwrap();
        assert_eq!(media.power.len(), 2);
        assert_eq!(media.energy, vec!["sensor.tv_salon_energy"]);
    }

    #[test]
    fn bulk_scope_restricts_to_one_group() {
        let mut sets = GroupSets::new();
        sets.ensure_group(ROOMS, "Salon")
            .add(EntityKind::Power, "sensor.tv_salon_power");
        sets.ensure_group(ROOMS, "Bureau")
            .add(EntityKind::Power, "sensor.tv_bureau_power");

        let outcome = sets.bulk_keyword_assign(
            ROOMS,
            "tv",
            BulkAction::Copy,
            "Media",
            &BulkScope::Group("Bureau".to_string()),
        );
        assert_eq!(outcome.copied, 1);

        let set = sets.set(ROOMS).unwrap();
        assert_eq!(set.group("Media").unwrap().power, vec!["sensor.tv_bureau_power"]);
        // source untouched on copy
        assert_eq!(set.group("Bureau").unwrap().power, vec!["sensor.tv_bureau_power"]);
    }

    #[test]
    fn bulk_skips_self_moves() {
        let mut sets = GroupSets::new();
        sets.ensure_group(ROOMS, "Media")
            .add(EntityKind::Power, "sensor.tv_power");

        let outcome =
            sets.bulk_keyword_assign(ROOMS, "tv", BulkAction::Move, "Media", &BulkScope::All);
        assert_eq!(outcome.moved, 0);
        assert_eq!(sets.set(ROOMS).unwrap().group("Media").unwrap().power, vec!["sensor.tv_power"]);
    }
}
