//! Traits at the boundary between the engine and its collaborators

pub mod connector;
pub mod registry;

// Re-export commonly used traits
pub use connector::{AuthorityConnector, MappingConnector};
pub use registry::ConnectionRegistry;
