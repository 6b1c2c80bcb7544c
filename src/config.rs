//! Session Configuration
//!
//! Fixed policy defaults applied once when a labelling session starts, plus
//! the export knobs. Every key is optional in the JSON file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::templates::LabelType;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Supersample factor must be between 1 and 8, got {0}")]
    Supersample(u32),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LabelConfig {
    pub supplier_name: String,
    pub vendor_lot: String,
    pub expiry_date: String,
    pub coo: String,
    pub box_no: String,
    pub vendor_code: String,
    pub plant_code: String,
    pub label_type: LabelType,
    pub output_dir: PathBuf,
    pub settle_delay_ms: u64,
    pub supersample: u32,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            supplier_name: "ELCOMP TRADING SDN BHD".to_string(),
            vendor_lot: "N / A".to_string(),
            expiry_date: "31-12-50".to_string(),
            coo: "JP".to_string(),
            box_no: "1".to_string(),
            vendor_code: crate::identifier::HU_VENDOR_CODE.to_string(),
            plant_code: "C039".to_string(),
            label_type: LabelType::Substrate,
            output_dir: PathBuf::from("."),
            settle_delay_ms: 50,
            supersample: crate::print::SUPERSAMPLE,
        }
    }
}

impl LabelConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=8).contains(&self.supersample) {
            return Err(ConfigError::Supersample(self.supersample));
        }
        Ok(())
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_uses_policy_defaults() {
        let config = LabelConfig::from_json("{}").unwrap();
        assert_eq!(config, LabelConfig::default());
        assert_eq!(config.vendor_code, "3000594");
        assert_eq!(config.supersample, 4);
    }

    #[test]
    fn test_partial_override() {
        let config =
            LabelConfig::from_json(r#"{"coo": "MY", "settleDelayMs": 0, "labelType": "non-substrate"}"#)
                .unwrap();
        assert_eq!(config.coo, "MY");
        assert_eq!(config.settle_delay(), Duration::ZERO);
        assert_eq!(config.label_type, LabelType::NonSubstrate);
        assert_eq!(config.plant_code, "C039");
    }

    #[test]
    fn test_rejects_out_of_range_supersample() {
        let err = LabelConfig::from_json(r#"{"supersample": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Supersample(0)));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = LabelConfig::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }
}
