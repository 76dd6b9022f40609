//! YAML-backed tuning knobs for ingestion and key scoring.
//!
//! Every field has a default, so an empty file (or no file) reproduces the
//! built-in heuristics. Command line flags override what is loaded here.

use std::{fs::File, io::BufReader, path::Path};

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const WEIGHT_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UnifyConfig {
    pub scoring: ScoringConfig,
    pub ingest: IngestConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringConfig {
    pub uniqueness_weight: f64,
    pub name_weight: f64,
    pub type_weight: f64,
    /// Column names (matched whole and case-insensitively) that suggest a key.
    pub key_names: Vec<String>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            uniqueness_weight: 0.5,
            name_weight: 0.3,
            type_weight: 0.2,
            key_names: ["id", "uuid", "pk", "key", "task_id", "_id"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = [
            ("uniqueness_weight", self.uniqueness_weight),
            ("name_weight", self.name_weight),
            ("type_weight", self.type_weight),
        ];
        if let Some((name, value)) = weights.iter().find(|(_, w)| !(*w >= 0.0)) {
            return Err(ConfigError::InvalidWeights(format!(
                "{name} must be non-negative (got {value})"
            )));
        }
        let total: f64 = weights.iter().map(|(_, w)| w).sum();
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ConfigError::InvalidWeights(format!(
                "weights must sum to 1.0 (got {total})"
            )));
        }
        Ok(())
    }

    /// Anchored, case-insensitive alternation over `key_names`; `None` when
    /// no names are configured.
    pub fn key_name_pattern(&self) -> Result<Option<Regex>, ConfigError> {
        if self.key_names.is_empty() {
            return Ok(None);
        }
        let alternation = self
            .key_names
            .iter()
            .map(|name| regex::escape(name))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = RegexBuilder::new(&format!("^(?:{alternation})$"))
            .case_insensitive(true)
            .build()?;
        Ok(Some(pattern))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IngestConfig {
    /// Conventional wrapper keys checked, in order, for the record list.
    pub record_path_candidates: Vec<String>,
    /// Forces the JSON record list key instead of detecting it.
    pub record_path: Option<String>,
    #[serde(with = "delimiter_serde")]
    pub delimiter: u8,
    /// `encoding_rs` label for delimited inputs; UTF-8 when absent.
    pub encoding: Option<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            record_path_candidates: ["tasks", "items", "annotations", "response", "records", "data"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            record_path: None,
            delimiter: b',',
            encoding: None,
        }
    }
}

impl UnifyConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: UnifyConfig = serde_yaml::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: UnifyConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scoring.validate()?;
        self.scoring.key_name_pattern()?;
        Ok(())
    }
}

mod delimiter_serde {
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S>(value: &u8, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&(*value as char).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u8, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        crate::cli::parse_delimiter(&raw).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_yields_defaults() {
        let config = UnifyConfig::from_yaml_str("{}").expect("parse");
        assert_eq!(config, UnifyConfig::default());
        assert_eq!(config.ingest.delimiter, b',');
    }

    #[test]
    fn partial_yaml_overrides_selected_fields() {
        let yaml = "scoring:\n  key_names: [code]\ningest:\n  delimiter: ';'\n  record_path: rows\n";
        let config = UnifyConfig::from_yaml_str(yaml).expect("parse");
        assert_eq!(config.scoring.key_names, vec!["code"]);
        assert_eq!(config.scoring.uniqueness_weight, 0.5);
        assert_eq!(config.ingest.delimiter, b';');
        assert_eq!(config.ingest.record_path.as_deref(), Some("rows"));
    }

    #[test]
    fn weights_must_sum_to_one() {
        let yaml = "scoring:\n  uniqueness_weight: 0.9\n";
        let err = UnifyConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWeights(_)));
    }

    #[test]
    fn key_name_pattern_matches_whole_names_only() {
        let pattern = ScoringConfig::default()
            .key_name_pattern()
            .expect("regex")
            .expect("default names");
        assert!(pattern.is_match("ID"));
        assert!(pattern.is_match("Task_Id"));
        assert!(!pattern.is_match("user_id"));
        assert!(!pattern.is_match("identity"));
    }

    #[test]
    fn yaml_round_trips_through_string() {
        let config = UnifyConfig::default();
        let text = config.to_yaml_string().expect("serialize");
        assert_eq!(UnifyConfig::from_yaml_str(&text).expect("parse"), config);
    }
}
