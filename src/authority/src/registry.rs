//! In-memory connection registry, optionally loaded from JSON
//!
//! ```json
//! {
//!   "mappers": [
//!     { "name": "lowercase", "class_name": "aclgate.mapping.regex",
//!       "config": { "lowercase": true } }
//!   ],
//!   "authorities": [
//!     { "name": "ad", "description": "Active Directory",
//!       "class_name": "aclgate.authority.static", "max_connections": 5,
//!       "config": { "tokens": ["grp:eng"] } }
//!   ]
//! }
//! ```

use aclgate_core::{BackendDescriptor, BackendKind, ConnectionRegistry, CoreError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryDocument {
    #[serde(default)]
    pub authorities: Vec<BackendDescriptor>,

    #[serde(default)]
    pub mappers: Vec<BackendDescriptor>,
}

/// Fixed set of connections, kept in registration order
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    authorities: Vec<BackendDescriptor>,
    mappers: Vec<BackendDescriptor>,
}

impl StaticRegistry {
    /// Validate and wrap the given connections
    ///
    /// Names must be unique per kind and only mapping connections may
    /// declare prerequisites. Whether prerequisites resolve is checked per
    /// request by the mapping scheduler.
    pub fn new(authorities: Vec<BackendDescriptor>, mappers: Vec<BackendDescriptor>) -> Result<Self> {
        check_unique(&authorities, BackendKind::Authority)?;
        check_unique(&mappers, BackendKind::Mapping)?;

        if let Some(authority) = authorities.iter().find(|a| !a.prerequisites.is_empty()) {
            return Err(CoreError::configuration(format!(
                "authority connection '{}' declares prerequisites; only mapping connections may",
                authority.name
            )));
        }

        Ok(Self {
            authorities,
            mappers,
        })
    }

    pub fn from_document(document: RegistryDocument) -> Result<Self> {
        Self::new(document.authorities, document.mappers)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_document(serde_json::from_str(json)?)
    }

    /// Read a JSON registry file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            CoreError::registry(format!("cannot read {}: {}", path.display(), e))
        })?;
        let registry = Self::from_json(&json)?;
        info!(
            "Loaded {} authority and {} mapping connections from {}",
            registry.authorities.len(),
            registry.mappers.len(),
            path.display()
        );
        Ok(registry)
    }
}

fn check_unique(connections: &[BackendDescriptor], kind: BackendKind) -> Result<()> {
    let mut seen = HashSet::new();
    for connection in connections {
        if !seen.insert(connection.name.as_str()) {
            return Err(CoreError::configuration(format!(
                "duplicate {} connection name '{}'",
                kind, connection.name
            )));
        }
    }
    Ok(())
}

#[async_trait]
impl ConnectionRegistry for StaticRegistry {
    async fn authority_connections(&self) -> Result<Vec<BackendDescriptor>> {
        Ok(self.authorities.clone())
    }

    async fn mapping_connections(&self) -> Result<Vec<BackendDescriptor>> {
        Ok(self.mappers.clone())
    }
}
