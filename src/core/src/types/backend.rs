//! Backend connection descriptors

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Default cap on simultaneous invocations of one connection
pub const DEFAULT_MAX_CONNECTIONS: usize = 10;

fn default_max_connections() -> usize {
    DEFAULT_MAX_CONNECTIONS
}

/// Which phase of a request a backend takes part in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Computes access tokens for an identity
    Authority,
    /// Rewrites an identity before the authorities see it
    Mapping,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Authority => write!(f, "authority"),
            BackendKind::Mapping => write!(f, "mapping"),
        }
    }
}

/// Opaque connector configuration
///
/// The engine never interprets these; only the connector named by the
/// descriptor's class does.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigParams(BTreeMap<String, serde_json::Value>);

impl ConfigParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.as_str())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(|v| v.as_bool())
    }

    /// A list parameter; a JSON array of strings or one comma-separated string
    pub fn get_str_list(&self, key: &str) -> Option<Vec<String>> {
        match self.0.get(key)? {
            serde_json::Value::Array(items) => Some(
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
            ),
            serde_json::Value::String(s) => Some(
                s.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A configured authority or mapping connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendDescriptor {
    /// Unique connection name
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Connector implementation identifier
    pub class_name: String,

    /// Connector configuration
    #[serde(default)]
    pub config: ConfigParams,

    /// Max simultaneous in-flight invocations of this connection
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Mapping connections this one waits for (mapping backends only)
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub prerequisites: BTreeSet<String>,
}

impl BackendDescriptor {
    pub fn new(name: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            class_name: class_name.into(),
            config: ConfigParams::default(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            prerequisites: BTreeSet::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_config(mut self, config: ConfigParams) -> Self {
        self.config = config;
        self
    }

    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn with_prerequisite(mut self, name: impl Into<String>) -> Self {
        self.prerequisites.insert(name.into());
        self
    }

    /// String reported back to callers: the description, or the name when
    /// no description is configured
    pub fn identifying_string(&self) -> &str {
        if self.description.is_empty() {
            &self.name
        } else {
            &self.description
        }
    }
}
