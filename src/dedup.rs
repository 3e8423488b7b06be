use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::model::sensor::SensorInfo;

/// Sensors sharing one device signature, believed to measure the same
/// physical device.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct DeviceGroup {
    pub signature: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub members: Vec<String>,
}

/// Duplicate groups partitioned for display: duplicates spanning several
/// integrations, duplicates within one integration (bucketed by it), and
/// the currently ignored sensors (bucketed likewise).
#[derive(Clone, Debug, Default, Serialize, Eq, PartialEq)]
pub struct DuplicatePartition {
    pub multi_integration: Vec<DeviceGroup>,
    pub intra_integration: BTreeMap<String, Vec<DeviceGroup>>,
    pub ignored_by_integration: BTreeMap<String, Vec<SensorInfo>>,
}

fn integration_of<'a>(entity_id: &str, all_sensors: &'a BTreeMap<String, SensorInfo>) -> &'a str {
    all_sensors
        .get(entity_id)
        .map_or(SensorInfo::UNKNOWN_INTEGRATION, SensorInfo::integration_name)
}

/// Partition device-signature groups into multi-integration and
/// intra-integration duplicates, after dropping ignored members.
///
/// A group left with fewer than two active members is not a duplicate and
/// is dropped entirely. Ignored sensors are reported separately, bucketed
/// by integration, whether or not they still belong to any device group.
#[must_use]
pub fn partition_duplicates(
    groups_by_device: &BTreeMap<String, DeviceGroup>,
    ignored: &BTreeSet<String>,
    all_sensors: &BTreeMap<String, SensorInfo>,
) -> DuplicatePartition {
    let mut partition = DuplicatePartition::default();

    for group in groups_by_device.values() {
        let active = group
            .members
            .iter()
            .filter(|id| !ignored.contains(*id))
            .cloned()
            .collect_vec();
        if active.len() < 2 {
            // a lone surviving sensor is not a conflict
            continue;
        }

        let integrations: BTreeSet<&str> = active
            .iter()
            .map(|id| integration_of(id, all_sensors))
            .collect();

        let active_group = DeviceGroup {
            signature: group.signature.clone(),
            name: group.name.clone(),
            area: group.area.clone(),
            members: active,
        };

        if integrations.len() >= 2 {
            partition.multi_integration.push(active_group);
        } else {
            let integration = integrations
                .first()
                .map_or(SensorInfo::UNKNOWN_INTEGRATION, |x| *x)
                .to_string();
            partition
                .intra_integration
                .entry(integration)
                .or_default()
                .push(active_group);
        }
    }

    for entity_id in ignored {
        let info = all_sensors
            .get(entity_id)
            .cloned()
            .unwrap_or_else(|| SensorInfo::named(entity_id.clone()));
        let integration = info.integration_name().to_string();
        partition
            .ignored_by_integration
            .entry(integration)
            .or_default()
            .push(info);
    }

    log::debug!(
        "Duplicate partition: {} multi-integration, {} intra-integration buckets, {} ignored",
        partition.multi_integration.len(),
        partition.intra_integration.len(),
        ignored.len()
    );
    partition
}
