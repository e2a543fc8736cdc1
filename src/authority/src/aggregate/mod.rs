//! Authority phase: fan out one request per authority, fan in, merge

pub mod merge;

pub use merge::{MergeBuffer, MergeLine, CONTENT_TYPE};

use crate::dispatch::{CompletionCell, ConnectorTarget, DispatchQueue};
use crate::error::{AuthorityError, Result};
use crate::query::AclQuery;
use aclgate_core::{AuthorizationResponse, BackendDescriptor, ConnectorError, ResponseStatus, UserRecord};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

pub struct Aggregator {
    queue: DispatchQueue<AuthorizationResponse>,
}

impl Aggregator {
    pub fn new(queue: DispatchQueue<AuthorizationResponse>) -> Self {
        Self { queue }
    }

    /// Ask every authority about `user` and merge the answers
    ///
    /// All requests are queued first; answers are then read strictly in
    /// registration order. The first captured failure aborts the whole
    /// merge, so a failed request never yields a partial buffer.
    pub async fn run(
        &self,
        connections: &[BackendDescriptor],
        user: &UserRecord,
        query: &AclQuery,
        cancel: &CancellationToken,
    ) -> Result<MergeBuffer> {
        let cells = connections
            .iter()
            .map(|connection| -> Result<_> {
                let cell = Arc::new(CompletionCell::new(
                    ConnectorTarget::from(connection),
                    user.clone(),
                ));
                self.queue.submit(cell.clone())?;
                Ok(cell)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut buffer = MergeBuffer::new();
        for (connection, cell) in connections.iter().zip(&cells) {
            debug!(
                "Waiting for answer from connector class '{}' for user '{}'",
                connection.class_name, user
            );
            let outcome = cell.wait_for_complete(cancel).await?;
            debug!(
                "Received answer from connector class '{}' for user '{}'",
                connection.class_name, user
            );

            let response = match outcome {
                Ok(response) => response,
                Err(err) => {
                    log_failure(cell.identifying_string(), user, err);
                    return Err(AuthorityError::from_connector(cell.identifying_string(), err));
                }
            };

            let backend = cell.identifying_string();
            match response.status {
                ResponseStatus::Unreachable => warn!(
                    "Authority '{}' is unreachable for user '{}'",
                    backend, query.user_id
                ),
                ResponseStatus::UserUnauthorized => debug!(
                    "Authority '{}' does not authorize user '{}'",
                    backend, user
                ),
                ResponseStatus::UserNotFound => {
                    debug!("User '{}' unknown to authority '{}'", user, backend)
                }
                ResponseStatus::Authorized => {}
            }
            buffer.push_status(response.status, backend);

            if query.acl_needed {
                if let Some(tokens) = &response.access_tokens {
                    for token in tokens {
                        debug!(
                            "  User '{}' has Acl = '{}' from authority '{}'",
                            user, token, backend
                        );
                        buffer.push_token(&connection.name, token);
                    }
                }
            }
        }

        if query.id_needed {
            buffer.push_identity(&query.user_id);
        }

        Ok(buffer)
    }
}

fn log_failure(backend: &str, user: &UserRecord, err: &ConnectorError) {
    match err {
        ConnectorError::Domain(message) => {
            warn!("Authority '{}' refused user '{}': {}", backend, user, message)
        }
        ConnectorError::Unexpected(message) => error!(
            "Unexpected failure from authority '{}' for user '{}': {}",
            backend, user, message
        ),
    }
}
