//! Connector catalogs
//!
//! A catalog maps connector class names to factories. Workers use it as
//! their [`Invoker`]: build the connector from the cell's configuration,
//! then call it.

use crate::dispatch::{ConnectorTarget, Invoker, Outcome};
use aclgate_core::{
    AuthorityConnector, AuthorizationResponse, ConfigParams, ConnectorError, MappingConnector,
    UserRecord,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Builds a connector instance from its connection configuration
pub type ConnectorFactory<C> =
    Arc<dyn Fn(&ConfigParams) -> Result<Arc<C>, ConnectorError> + Send + Sync>;

/// Class name → factory
pub struct ConnectorCatalog<C: ?Sized> {
    factories: HashMap<String, ConnectorFactory<C>>,
}

pub type AuthorityCatalog = ConnectorCatalog<dyn AuthorityConnector>;
pub type MappingCatalog = ConnectorCatalog<dyn MappingConnector>;

impl<C: ?Sized> Default for ConnectorCatalog<C> {
    fn default() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }
}

impl<C: ?Sized> ConnectorCatalog<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a connector class, replacing any previous factory
    pub fn register<F>(&mut self, class_name: impl Into<String>, factory: F)
    where
        F: Fn(&ConfigParams) -> Result<Arc<C>, ConnectorError> + Send + Sync + 'static,
    {
        self.factories.insert(class_name.into(), Arc::new(factory));
    }

    /// Builder-style [`register`](Self::register)
    pub fn with<F>(mut self, class_name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&ConfigParams) -> Result<Arc<C>, ConnectorError> + Send + Sync + 'static,
    {
        self.register(class_name, factory);
        self
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.factories.contains_key(class_name)
    }

    /// Instantiate the connector `target` names
    ///
    /// An uninstalled class is a recognized failure of that connection.
    pub fn build(&self, target: &ConnectorTarget) -> Result<Arc<C>, ConnectorError> {
        let factory = self.factories.get(&target.class_name).ok_or_else(|| {
            ConnectorError::domain(format!(
                "connector class '{}' is not installed",
                target.class_name
            ))
        })?;
        factory(&target.config)
    }
}

#[async_trait]
impl Invoker<AuthorizationResponse> for AuthorityCatalog {
    async fn invoke(
        &self,
        target: &ConnectorTarget,
        user: &UserRecord,
    ) -> Outcome<AuthorizationResponse> {
        let connector = self.build(target)?;
        connector.authorize(user).await
    }
}

#[async_trait]
impl Invoker<UserRecord> for MappingCatalog {
    async fn invoke(&self, target: &ConnectorTarget, user: &UserRecord) -> Outcome<UserRecord> {
        let connector = self.build(target)?;
        connector.map_user(user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aclgate_core::BackendDescriptor;

    struct Echo;

    #[async_trait]
    impl MappingConnector for Echo {
        async fn map_user(&self, user: &UserRecord) -> Result<UserRecord, ConnectorError> {
            Ok(user.with_user(format!("{}!", user.user())))
        }
    }

    #[tokio::test]
    async fn test_invoke_registered_class() {
        let catalog = MappingCatalog::new().with("echo", |_| Ok(Arc::new(Echo) as Arc<dyn MappingConnector>));
        assert!(catalog.contains("echo"));

        let target = ConnectorTarget::from(&BackendDescriptor::new("m", "echo"));
        let mapped = catalog.invoke(&target, &UserRecord::new("", "alice")).await.unwrap();
        assert_eq!(mapped.user(), "alice!");
    }

    #[tokio::test]
    async fn test_unknown_class_is_domain_failure() {
        let catalog = AuthorityCatalog::new();
        let target = ConnectorTarget::from(&BackendDescriptor::new("a", "missing.Class"));

        let err = catalog.invoke(&target, &UserRecord::new("", "alice")).await.unwrap_err();
        assert!(err.is_domain());
        assert!(err.to_string().contains("missing.Class"));
    }
}
