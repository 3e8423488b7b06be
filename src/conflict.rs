use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::sensor::{MeasurementKind, SensorInfo};

/// One row of the persisted sensor selection, per integration.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct SelectionRow {
    pub entity_id: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub include_in_summary: bool,
}

/// A physical device with contradictory enabled measurements. Produced
/// transiently by validation, never persisted.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct ConflictRecord {
    pub device_id: String,
    pub entities: Vec<String>,
}

fn is_allowed_pair(entities: &[String], all_sensors: &BTreeMap<String, SensorInfo>) -> bool {
    let [a, b] = entities else {
        return false;
    };
    let kind_of = |id: &String| all_sensors.get(id).and_then(SensorInfo::measurement_kind);
    matches!(
        (kind_of(a), kind_of(b)),
        (Some(MeasurementKind::Power), Some(MeasurementKind::Energy))
            | (Some(MeasurementKind::Energy), Some(MeasurementKind::Power))
    )
}

/// Pre-flight check before a selection is persisted: a device with more
/// than one enabled measurement is rejected unless the pair is exactly one
/// power plus one energy reading.
///
/// Entities without a resolvable `device_id` cannot be cross-checked and
/// are treated as conflict-free by necessity. The result is advisory: the
/// persistence collaborator is expected to re-run this check
/// authoritatively, so this must never be the sole gate.
#[must_use]
pub fn validate_selection(
    selections: &BTreeMap<String, Vec<SelectionRow>>,
    all_sensors: &BTreeMap<String, SensorInfo>,
) -> Vec<ConflictRecord> {
    let mut by_device: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for rows in selections.values() {
        for row in rows {
            if !row.enabled {
                continue;
            }
            let Some(device_id) = all_sensors
                .get(&row.entity_id)
                .and_then(|info| info.device_id.clone())
            else {
                continue;
            };
            let entities = by_device.entry(device_id).or_default();
            if !entities.contains(&row.entity_id) {
                entities.push(row.entity_id.clone());
            }
        }
    }

    let mut conflicts = Vec::new();
    for (device_id, entities) in by_device {
        if entities.len() < 2 || is_allowed_pair(&entities, all_sensors) {
            continue;
        }
        log::debug!(
            "Device [{device_id}] has {} conflicting enabled entities",
            entities.len()
        );
        conflicts.push(ConflictRecord {
            device_id,
            entities,
        });
    }
    conflicts
}
