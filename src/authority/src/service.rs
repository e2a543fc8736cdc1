//! Request orchestration: mapping phase, then authority phase
//!
//! ```text
//! AclQuery → UserRecord → MappingScheduler → identity → Aggregator → MergeBuffer
//!                              ↓                              ↓
//!                       [mapping queue]               [authority queue]
//! ```

use crate::aggregate::{Aggregator, MergeBuffer};
use crate::config::EngineConfig;
use crate::dispatch::DispatchQueue;
use crate::error::{AuthorityError, Result};
use crate::mapping::MappingScheduler;
use crate::query::AclQuery;
use aclgate_core::{AuthorizationResponse, ConnectionRegistry, UserRecord};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, Instrument};
use uuid::Uuid;

/// Resolves ACL queries against the configured connections
pub struct AclService {
    registry: Arc<dyn ConnectionRegistry>,
    mapping_queue: DispatchQueue<UserRecord>,
    authority_queue: DispatchQueue<AuthorizationResponse>,
    config: EngineConfig,
}

impl AclService {
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        mapping_queue: DispatchQueue<UserRecord>,
        authority_queue: DispatchQueue<AuthorizationResponse>,
        config: EngineConfig,
    ) -> Self {
        Self {
            registry,
            mapping_queue,
            authority_queue,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Answer one query
    ///
    /// Cancelling `cancel` abandons the request with
    /// [`AuthorityError::Cancelled`]. When the configured timeout elapses
    /// first the request fails with [`AuthorityError::Timeout`]. Either way
    /// every coordinator the request spawned is told to stop.
    pub async fn resolve(&self, query: &AclQuery, cancel: &CancellationToken) -> Result<MergeBuffer> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("acl_request", %request_id, user = %query.user_id);
        let start = Instant::now();

        let result = match self.config.request_timeout {
            Some(limit) => tokio::time::timeout(limit, self.resolve_inner(query, cancel))
                .instrument(span.clone())
                .await
                .unwrap_or(Err(AuthorityError::Timeout(limit))),
            None => self.resolve_inner(query, cancel).instrument(span.clone()).await,
        };

        span.in_scope(|| match &result {
            Ok(buffer) => info!(
                "Resolved {} authority answers in {:?}",
                buffer.status_count(),
                start.elapsed()
            ),
            Err(e) => debug!("Request ended without an answer after {:?}: {}", start.elapsed(), e),
        });
        result
    }

    async fn resolve_inner(&self, query: &AclQuery, cancel: &CancellationToken) -> Result<MergeBuffer> {
        // Dropping the guard (on return or when the timeout drops this
        // future) stops whatever this request still has waiting.
        let request_token = cancel.child_token();
        let _guard = request_token.clone().drop_guard();

        if self.mapping_queue.is_closed() || self.authority_queue.is_closed() {
            return Err(AuthorityError::MisconfiguredSystem(
                "dispatch queues are not running".to_string(),
            ));
        }

        let user = query.user_record();
        debug!("Received authority request for '{}'", user);

        let mappers = self.registry.mapping_connections().await?;
        let mapped = MappingScheduler::new(self.mapping_queue.clone(), self.config.detect_mapping_cycles)
            .run(&mappers, &user, &request_token)
            .await?;
        if mapped.identity != user {
            debug!("User '{}' mapped to '{}'", user, mapped.identity);
        }

        let authorities = self.registry.authority_connections().await?;
        Aggregator::new(self.authority_queue.clone())
            .run(&authorities, &mapped.identity, query, &request_token)
            .await
    }
}
