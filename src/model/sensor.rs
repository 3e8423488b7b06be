use serde::{Deserialize, Serialize};

/// Normalized measurement kind of one sensor stream.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementKind {
    Power,
    Energy,
}

impl MeasurementKind {
    /// Fold integration-specific type names into exactly power or energy.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "power" | "puissance" => Some(Self::Power),
            "energy" | "energydirect" | "energy_direct" | "hse_energy" => Some(Self::Energy),
            _ => None,
        }
    }
}

/// One entry of the raw sensor inventory, as supplied by the external
/// inventory collaborator. All metadata is optional: integrations differ in
/// what they report.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct SensorInfo {
    pub entity_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind_hint: Option<String>,
}

impl SensorInfo {
    /// Fallback bucket for sensors with no integration metadata.
    pub const UNKNOWN_INTEGRATION: &'static str = "unknown";

    #[must_use]
    pub fn named(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            ..Self::default()
        }
    }

    /// Kind from `source_type`, falling back to `type`.
    #[must_use]
    pub fn measurement_kind(&self) -> Option<MeasurementKind> {
        self.source_type
            .as_deref()
            .and_then(MeasurementKind::parse)
            .or_else(|| self.kind_hint.as_deref().and_then(MeasurementKind::parse))
    }

    #[must_use]
    pub fn integration_name(&self) -> &str {
        self.integration
            .as_deref()
            .map(str::trim)
            .filter(|x| !x.is_empty())
            .unwrap_or(Self::UNKNOWN_INTEGRATION)
    }
}
