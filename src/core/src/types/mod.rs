//! Shared types for identities, connections and authority answers

pub mod backend;
pub mod identity;
pub mod response;

// Re-export commonly used types
pub use backend::{BackendDescriptor, BackendKind, ConfigParams, DEFAULT_MAX_CONNECTIONS};
pub use identity::{LocalValue, UserRecord, DEFAULT_DOMAIN};
pub use response::{AuthorizationResponse, ResponseStatus};
