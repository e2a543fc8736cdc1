//! Connectors shipped with the server

pub mod regex_mapper;
pub mod static_authority;

pub use regex_mapper::RegexMapper;
pub use static_authority::StaticAuthority;

use crate::catalog::{AuthorityCatalog, MappingCatalog};
use aclgate_core::{AuthorityConnector, MappingConnector};
use std::sync::Arc;

/// Catalog with every bundled authority connector installed
pub fn authority_catalog() -> AuthorityCatalog {
    AuthorityCatalog::new().with(static_authority::CLASS_NAME, |config| {
        Ok(Arc::new(StaticAuthority::from_config(config)?) as Arc<dyn AuthorityConnector>)
    })
}

/// Catalog with every bundled mapping connector installed
pub fn mapping_catalog() -> MappingCatalog {
    MappingCatalog::new().with(regex_mapper::CLASS_NAME, |config| {
        Ok(Arc::new(RegexMapper::from_config(config)?) as Arc<dyn MappingConnector>)
    })
}
