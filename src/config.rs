//! Configuration file parsing
//!
//! Reads migration-dialect.toml configuration files.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::dialect::{DialectError, DialectRegistry};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub dialects: DialectsConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DialectsConfig {
    /// Custom overrides: database key (or `migration.dialect.<key>` property)
    /// to handler name.
    #[serde(default)]
    pub custom: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// How the CLI prints split statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Register every configured custom dialect with `registry`.
    pub fn apply(&self, registry: &DialectRegistry) -> Result<(), DialectError> {
        for (property, identifier) in &self.dialects.custom {
            registry.add_custom_property(property, identifier)?;
        }
        Ok(())
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<(), ConfigError> {
        for (key, identifier) in &self.dialects.custom {
            if key.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "custom dialect keys must not be empty".to_string(),
                ));
            }
            if identifier.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "custom dialect for '{}' names no handler",
                    key
                )));
            }
        }
        Ok(())
    }
}
