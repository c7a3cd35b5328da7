//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.peer-assess.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = ".peer-assess.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Rubric settings.
    #[serde(default)]
    pub rubric: RubricConfig,

    /// Candidates inserted when the store has none.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub seed: Vec<SeedCandidate>,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Path of the JSON record store.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            verbose: false,
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("assessments.json")
}

/// Rubric settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RubricConfig {
    /// Maximum feedback length in characters. Unset means unlimited;
    /// 69 matches the on-chain questionnaire.
    #[serde(default)]
    pub max_feedback_len: Option<usize>,
}

/// A candidate to register on first start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedCandidate {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub statement: String,
    #[serde(default)]
    pub nominated_by: String,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref store) = args.store {
            self.general.store_path = store.clone();
        }

        if let Some(max) = args.max_feedback_len {
            self.rubric.max_feedback_len = Some(max);
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.store_path, PathBuf::from("assessments.json"));
        assert_eq!(config.rubric.max_feedback_len, None);
        assert!(config.seed.is_empty());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
store_path = "/var/lib/peer-assess/ledger.json"
verbose = true

[rubric]
max_feedback_len = 69

[[seed]]
name = "Alice"
address = "0x1234567890123456789012345678901234567890"
statement = "Experienced Multi-Sig signer with 5+ years in DeFi"

[[seed]]
name = "Bob"
address = "0x0987654321098765432109876543210987654321"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(
            config.general.store_path,
            PathBuf::from("/var/lib/peer-assess/ledger.json")
        );
        assert!(config.general.verbose);
        assert_eq!(config.rubric.max_feedback_len, Some(69));
        assert_eq!(config.seed.len(), 2);
        assert_eq!(config.seed[1].name, "Bob");
        assert!(config.seed[1].statement.is_empty());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.general.store_path, PathBuf::from("assessments.json"));
        assert!(config.seed.is_empty());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("store_path"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.general.store_path, PathBuf::from("assessments.json"));
    }
}
