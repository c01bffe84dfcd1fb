use crate::reference_node::DEFAULT_SPREAD_TOLERANCE;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: ron::error::SpannedError,
    },
}

/// Distance tolerances in metres chosen from link attributes.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ThresholdPolicy {
    /// FUNC_CLASS values treated as highway.
    pub highway_classes: Vec<String>,
    pub highway_m: f64,
    pub urban_m: f64,
    pub default_m: f64,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            highway_classes: vec!["1".to_string(), "2".to_string()],
            highway_m: 70.0,
            urban_m: 10.0,
            default_m: 40.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AuditConfig {
    pub thresholds: ThresholdPolicy,
    // below this the lat and lon spreads of a link count as equal
    pub spread_tolerance: f64,
    pub parallel: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            thresholds: ThresholdPolicy::default(),
            spread_tolerance: DEFAULT_SPREAD_TOLERANCE,
            parallel: true,
        }
    }
}

impl AuditConfig {
    pub fn from_ron_str(text: &str, origin: &str) -> Result<Self, ConfigError> {
        ron::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        Self::from_ron_str(&text, &display)
    }
}
