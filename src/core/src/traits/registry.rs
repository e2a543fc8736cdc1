//! Connection registry boundary

use crate::error::Result;
use crate::types::BackendDescriptor;
use async_trait::async_trait;

/// Enumerates the configured connections, in registration order
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// All authority connections
    async fn authority_connections(&self) -> Result<Vec<BackendDescriptor>>;

    /// All mapping connections
    async fn mapping_connections(&self) -> Result<Vec<BackendDescriptor>>;
}
