//! # aclgate authority service
//!
//! Answers "which access tokens does this user hold?" by fanning one
//! request out to every registered authority connection and merging the
//! answers into a line-oriented text response.
//!
//! ## Features
//!
//! - **Identity mapping** through a dependency graph of mapping connections
//! - **Bounded parallelism** with per-connection `max_connections` limits
//! - **Deterministic output** in registration order, whatever the completion order
//! - **Cancellation and timeouts** at the request boundary
//!
//! ## Example
//!
//! ```rust,no_run
//! use aclgate_authority::{
//!     connectors, AclQuery, AclService, EngineConfig, StaticRegistry, WorkerPool,
//! };
//! use aclgate_core::{AuthorizationResponse, UserRecord};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = StaticRegistry::load("registry.json").await?;
//!     let mappers =
//!         WorkerPool::<UserRecord>::start("mapping", 4, Arc::new(connectors::mapping_catalog()));
//!     let authorities = WorkerPool::<AuthorizationResponse>::start(
//!         "authority",
//!         4,
//!         Arc::new(connectors::authority_catalog()),
//!     );
//!
//!     let service = AclService::new(
//!         Arc::new(registry),
//!         mappers.queue(),
//!         authorities.queue(),
//!         EngineConfig::default(),
//!     );
//!
//!     let answer = service
//!         .resolve(&AclQuery::new("bob@corp"), &CancellationToken::new())
//!         .await?;
//!     print!("{}", answer.to_text());
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod connectors;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod mapping;
pub mod query;
pub mod registry;
pub mod service;

pub use aggregate::{Aggregator, MergeBuffer, MergeLine};
pub use catalog::{AuthorityCatalog, ConnectorCatalog, MappingCatalog};
pub use config::{EngineConfig, ServiceConfig};
pub use dispatch::{CompletionCell, ConnectorTarget, DispatchQueue, Invoker, WorkerPool};
pub use error::{AuthorityError, ErrorClass, Result};
pub use http::{build_router, AppState};
pub use mapping::{MappingOutcome, MappingScheduler};
pub use query::{AclQuery, QueryError};
pub use registry::StaticRegistry;
pub use service::AclService;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
