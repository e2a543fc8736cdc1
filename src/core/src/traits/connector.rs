//! Connector traits implemented by authority and mapping backends

use crate::error::ConnectorError;
use crate::types::{AuthorizationResponse, UserRecord};
use async_trait::async_trait;

/// A backend that computes access tokens for an identity
#[async_trait]
pub trait AuthorityConnector: Send + Sync {
    /// Resolve the status and tokens for `user`
    async fn authorize(&self, user: &UserRecord) -> Result<AuthorizationResponse, ConnectorError>;
}

/// A backend that rewrites an identity before the authorities see it
#[async_trait]
pub trait MappingConnector: Send + Sync {
    /// Return the mapped identity; `user` itself is never modified
    async fn map_user(&self, user: &UserRecord) -> Result<UserRecord, ConnectorError>;
}
