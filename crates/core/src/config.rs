// Configuration table
//
// A Configuration is one named serving setup: which model runs, on what
// partition profile, and how many instances of it fit on one accelerator.
// The table is built once at startup and never mutated afterwards.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building or loading a configuration table
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The table has no configurations
    #[error("configuration table is empty")]
    Empty,

    /// A configuration id is blank
    #[error("configuration #{0} has a blank id")]
    BlankId(usize),

    /// A configuration has no endpoint target
    #[error("configuration '{0}' has a blank model")]
    BlankModel(String),

    /// Two configurations share an id
    #[error("duplicate configuration id: {0}")]
    DuplicateId(String),

    /// Replication factor must be at least one instance
    #[error("configuration '{0}' has a replication factor of zero")]
    ZeroReplication(String),

    /// Table file could not be read
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// Table file could not be parsed
    #[error("failed to parse configuration file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// A named serving setup on a partitioned accelerator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    /// Identifier used as the report key (e.g. "small")
    pub id: String,

    /// Endpoint target, the model name the endpoint serves (e.g. "llama3.2:1b")
    pub model: String,

    /// Number of concurrent instances assumed available for this configuration
    pub replication_factor: u32,

    /// Human-readable capacity descriptor (e.g. "6GB")
    pub capacity: String,

    /// Partition profile (e.g. "1g.6gb")
    #[serde(default)]
    pub profile: Option<String>,

    /// Model size descriptor (e.g. "1B parameters")
    #[serde(default)]
    pub parameters: Option<String>,

    /// Namespace the instances are deployed to
    #[serde(default)]
    pub namespace: Option<String>,

    /// Intended workload class
    #[serde(default)]
    pub use_case: Option<String>,
}

impl Configuration {
    /// Create a configuration with the required fields
    pub fn new(
        id: impl Into<String>,
        model: impl Into<String>,
        replication_factor: u32,
        capacity: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            model: model.into(),
            replication_factor,
            capacity: capacity.into(),
            profile: None,
            parameters: None,
            namespace: None,
            use_case: None,
        }
    }

    /// Set the partition profile
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Set the model size descriptor
    pub fn with_parameters(mut self, parameters: impl Into<String>) -> Self {
        self.parameters = Some(parameters.into());
        self
    }

    /// Set the deployment namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the workload class
    pub fn with_use_case(mut self, use_case: impl Into<String>) -> Self {
        self.use_case = Some(use_case.into());
        self
    }
}

#[derive(Debug, Deserialize)]
struct TableFile {
    configurations: Vec<Configuration>,
}

/// Ordered, validated set of configurations
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct ConfigurationTable {
    configurations: Vec<Configuration>,
}

impl ConfigurationTable {
    /// Validate and build a table. Enumeration order is preserved.
    pub fn new(configurations: Vec<Configuration>) -> Result<Self, ConfigError> {
        if configurations.is_empty() {
            return Err(ConfigError::Empty);
        }

        let mut seen = HashSet::new();
        for (index, config) in configurations.iter().enumerate() {
            if config.id.trim().is_empty() {
                return Err(ConfigError::BlankId(index));
            }
            if config.model.trim().is_empty() {
                return Err(ConfigError::BlankModel(config.id.clone()));
            }
            if config.replication_factor == 0 {
                return Err(ConfigError::ZeroReplication(config.id.clone()));
            }
            if !seen.insert(config.id.as_str()) {
                return Err(ConfigError::DuplicateId(config.id.clone()));
            }
        }

        Ok(Self { configurations })
    }

    /// Parse a table from YAML with a top-level `configurations` list
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let file: TableFile = serde_yaml::from_str(yaml)?;
        Self::new(file.configurations)
    }

    /// Load a table from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// The built-in table: three partition sizes of one 24GB accelerator
    pub fn builtin() -> Self {
        Self {
            configurations: vec![
                Configuration::new("small", "llama3.2:1b", 4, "6GB")
                    .with_profile("1g.6gb")
                    .with_parameters("1B parameters")
                    .with_namespace("ai-dev")
                    .with_use_case("Development, CI/CD, Edge Devices"),
                Configuration::new("medium", "llama3.2:3b", 2, "12GB")
                    .with_profile("2g.12gb")
                    .with_parameters("3B parameters")
                    .with_namespace("ai-staging")
                    .with_use_case("Staging, QA, Medium Workloads"),
                Configuration::new("large", "llama3.1:8b", 1, "24GB")
                    .with_profile("Full A30 (24GB)")
                    .with_parameters("8B parameters")
                    .with_namespace("ai-workloads")
                    .with_use_case("Production, Customer APIs"),
            ],
        }
    }

    /// Look up a configuration by id
    pub fn get(&self, id: &str) -> Option<&Configuration> {
        self.configurations.iter().find(|c| c.id == id)
    }

    /// Iterate in enumeration order
    pub fn iter(&self) -> std::slice::Iter<'_, Configuration> {
        self.configurations.iter()
    }

    /// Configuration ids in enumeration order
    pub fn ids(&self) -> Vec<&str> {
        self.configurations.iter().map(|c| c.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.configurations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }
}

impl<'a> IntoIterator for &'a ConfigurationTable {
    type Item = &'a Configuration;
    type IntoIter = std::slice::Iter<'a, Configuration>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
