//! Processor configuration.
//!
//! Configuration is a small YAML document; every field has a default so an
//! empty file (or no file at all) yields the behavior of the stock
//! processor. Environment variables prefixed with `EDA_CATALOG_` override
//! file values.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::events::kind::EVENT_API_VERSIONS;

/// Error type for configuration loading and validation
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: String, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// What to do with a message `$ref` that cannot be resolved against
/// `components.messages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefPolicy {
    /// Use the raw `{ $ref: ... }` value as the message.
    #[default]
    PassThrough,
    /// Emit no Event for that channel/message pair.
    Skip,
    /// Fail derivation for the whole source entity.
    Reject,
}

impl std::str::FromStr for RefPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "pass_through" | "passthrough" => Ok(RefPolicy::PassThrough),
            "skip" => Ok(RefPolicy::Skip),
            "reject" => Ok(RefPolicy::Reject),
            other => Err(format!("unknown ref policy '{}'", other)),
        }
    }
}

/// Settings for [`crate::processor::EventEntitiesProcessor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// `apiVersion` stamped on derived Event entities
    pub event_api_version: String,

    /// Lifecycle used when the source API has none
    pub default_lifecycle: String,

    /// Owner used when the source API has none
    pub default_owner: String,

    pub unresolved_refs: RefPolicy,

    /// Keep only the `components.schemas` entries the retained channel and
    /// message actually reference
    pub prune_schemas: bool,

    /// Copy `eda.io/domain` and `eda.io/subdomain` labels into the Event spec
    pub propagate_domain_labels: bool,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            event_api_version: EVENT_API_VERSIONS[0].to_string(),
            default_lifecycle: "experimental".to_string(),
            default_owner: "unknown".to_string(),
            unresolved_refs: RefPolicy::default(),
            prune_schemas: true,
            propagate_domain_labels: true,
        }
    }
}

impl ProcessorConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    /// Returns error if the file cannot be read, is not valid YAML, or
    /// fails [`ProcessorConfig::validate`]
    ///
    /// # Example
    /// ```ignore
    /// use eda_catalog::ProcessorConfig;
    ///
    /// let config = ProcessorConfig::load_from_file("eda-catalog.yaml")?;
    /// ```
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_yaml(&contents)
    }

    /// Parse configuration from a YAML string. An empty document yields the defaults.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config = if contents.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(contents)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Apply `EDA_CATALOG_*` overrides from the process environment.
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup (the environment in
    /// production, a map in tests).
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("EDA_CATALOG_EVENT_API_VERSION") {
            self.event_api_version = value;
        }
        if let Some(value) = lookup("EDA_CATALOG_DEFAULT_LIFECYCLE") {
            self.default_lifecycle = value;
        }
        if let Some(value) = lookup("EDA_CATALOG_DEFAULT_OWNER") {
            self.default_owner = value;
        }
        if let Some(value) = lookup("EDA_CATALOG_UNRESOLVED_REFS") {
            self.unresolved_refs = value.parse().map_err(|_| ConfigError::InvalidEnv {
                key: "EDA_CATALOG_UNRESOLVED_REFS".to_string(),
                value,
            })?;
        }
        if let Some(value) = lookup("EDA_CATALOG_PRUNE_SCHEMAS") {
            self.prune_schemas = parse_bool("EDA_CATALOG_PRUNE_SCHEMAS", value)?;
        }
        if let Some(value) = lookup("EDA_CATALOG_PROPAGATE_DOMAIN_LABELS") {
            self.propagate_domain_labels = parse_bool("EDA_CATALOG_PROPAGATE_DOMAIN_LABELS", value)?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Check that derived entities would pass Event kind validation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !EVENT_API_VERSIONS.contains(&self.event_api_version.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "event_api_version must be one of {:?}, got '{}'",
                EVENT_API_VERSIONS, self.event_api_version
            )));
        }
        if self.default_lifecycle.is_empty() {
            return Err(ConfigError::Invalid("default_lifecycle must not be empty".to_string()));
        }
        if self.default_owner.is_empty() {
            return Err(ConfigError::Invalid("default_owner must not be empty".to_string()));
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: String) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            key: key.to_string(),
            value,
        }),
    }
}
