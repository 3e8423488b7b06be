use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigError};
use serde::{Deserialize, Serialize};

use crate::classify::KeywordRule;

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct CoreConfig {
    pub state_file: Utf8PathBuf,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, Eq, PartialEq)]
pub struct ClassifyConfig {
    #[serde(default)]
    pub rules: Vec<KeywordRule>,
}

impl ClassifyConfig {
    /// The ordered rule list to classify with; the stock rules apply when
    /// the config file provides none.
    #[must_use]
    pub fn effective_rules(&self) -> Vec<KeywordRule> {
        if self.rules.is_empty() {
            KeywordRule::defaults()
        } else {
            self.rules.clone()
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    pub engine: CoreConfig,
    #[serde(default)]
    pub classify: ClassifyConfig,
}

pub fn parse(filename: &Utf8Path) -> Result<EngineConfig, ConfigError> {
    let settings = Config::builder()
        .set_default("engine.state_file", "groups.yaml")?
        .add_source(config::File::with_name(filename.as_str()))
        .build()?;

    settings.try_deserialize()
}
