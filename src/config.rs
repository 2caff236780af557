//! Engine configuration
//!
//! Loaded from a JSON file at startup:
//!
//! ```json
//! {
//!   "defaults": { "mod.*": false, "levels.use": true, "economy.*": true },
//!   "super_owner_nodes": ["restart.use"],
//!   "logging": { "level": "info", "format": "compact", "directory": "logs" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::core::{PolicyError, PolicyResult};
use crate::permissions::{node, DefaultPolicyTable, DEFAULT_SUPER_OWNER_NODES};

/// Environment variable holding the config file path
pub const CONFIG_PATH_ENV: &str = "POLICY_ENGINE_CONFIG";

/// Output format of the console log layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset (e.g. "info", "tenant_policy_engine=debug")
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    /// Directory for daily-rolling log files; console only when unset
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// File name prefix for rolling log files
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_file_prefix() -> String {
    "policy-engine.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            directory: None,
            file_prefix: default_file_prefix(),
        }
    }
}

impl LoggingConfig {
    /// Set the filter level
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Set the console format
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Also write rolling log files to a directory
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seed of the default policy table
    #[serde(default)]
    pub defaults: BTreeMap<String, bool>,

    /// Nodes that only super owners may use
    #[serde(default = "default_super_owner_nodes")]
    pub super_owner_nodes: BTreeSet<String>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_super_owner_nodes() -> BTreeSet<String> {
    DEFAULT_SUPER_OWNER_NODES.iter().map(|n| n.to_string()).collect()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            defaults: BTreeMap::new(),
            super_owner_nodes: default_super_owner_nodes(),
            logging: LoggingConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Create a configuration with no defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> PolicyResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            PolicyError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            PolicyError::InvalidConfig(format!("cannot parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the file named by `POLICY_ENGINE_CONFIG`, or use defaults
    pub fn from_env() -> PolicyResult<Self> {
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Add a default policy entry
    pub fn with_default(mut self, key: impl Into<String>, allowed: bool) -> Self {
        self.defaults.insert(key.into(), allowed);
        self
    }

    /// Replace the super-owner-restricted set
    pub fn with_super_owner_nodes<I, S>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.super_owner_nodes = nodes.into_iter().map(Into::into).collect();
        self
    }

    /// Set logging configuration
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    /// Check every key and restricted node
    pub fn validate(&self) -> PolicyResult<()> {
        for key in self.defaults.keys() {
            node::validate_key(key)
                .map_err(|e| PolicyError::InvalidConfig(format!("defaults: {e}")))?;
        }
        for restricted in &self.super_owner_nodes {
            if !node::is_literal(restricted) {
                return Err(PolicyError::InvalidConfig(format!(
                    "super_owner_nodes: '{restricted}' is not a literal node"
                )));
            }
        }
        Ok(())
    }

    /// Build the default policy table
    pub fn build_table(&self) -> PolicyResult<DefaultPolicyTable> {
        self.validate()?;
        DefaultPolicyTable::new(self.defaults.iter().map(|(k, v)| (k, *v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!(config.defaults.is_empty());
        assert!(config.super_owner_nodes.contains("restart.use"));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "defaults": {{"mod.*": false, "economy.gambling.slots": true}},
                "logging": {{"format": "json"}}
            }}"#
        )
        .unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.defaults.len(), 2);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
        assert!(config.super_owner_nodes.contains("restart.use"));

        let table = config.build_table().unwrap();
        assert!(table.resolve_default("economy.gambling.slots"));
        assert!(!table.resolve_default("mod.ban"));
    }

    #[test]
    fn test_load_rejects_bad_key() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"defaults": {{"mod.*.ban": true}}}}"#).unwrap();

        let err = EngineConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, PolicyError::InvalidConfig(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = EngineConfig::load("/nonexistent/policy.json").unwrap_err();
        assert!(matches!(err, PolicyError::InvalidConfig(_)));
    }

    #[test]
    fn test_restricted_nodes_must_be_literal() {
        let config = EngineConfig::new().with_super_owner_nodes(["restart.*"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::new()
            .with_default("levels.use", true)
            .with_super_owner_nodes(["eval.run"])
            .with_logging(LoggingConfig::default().with_format(LogFormat::Compact));

        assert_eq!(config.defaults.get("levels.use"), Some(&true));
        assert_eq!(config.super_owner_nodes.len(), 1);
        assert_eq!(config.logging.format, LogFormat::Compact);
    }
}
