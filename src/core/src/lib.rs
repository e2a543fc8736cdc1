//! # aclgate core
//!
//! Shared types, traits, and error handling for the aclgate services.
//! Connector implementations and the dispatch engine depend on this crate,
//! never the other way around.

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{ConnectorError, CoreError, Result};
pub use traits::{AuthorityConnector, ConnectionRegistry, MappingConnector};
pub use types::{
    AuthorizationResponse, BackendDescriptor, BackendKind, ConfigParams, LocalValue,
    ResponseStatus, UserRecord, DEFAULT_DOMAIN,
};
