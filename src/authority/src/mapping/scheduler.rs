//! Dependency-ordered dispatch of mapping connections
//!
//! Every mapping connection gets a completion cell, all created before any
//! work starts, and one coordinator task. A coordinator waits until each of
//! its prerequisites' cells is completed, binds its input identity and
//! submits its own cell. No topological sort is needed: the waits alone
//! guarantee that a connection is never dispatched before its
//! prerequisites are done.
//!
//! A cyclic graph makes the coordinators on the cycle wait forever; the
//! request timeout at the orchestration boundary bounds that, and
//! `detect_cycles` rejects such graphs before anything is dispatched.

use super::graph;
use crate::dispatch::{CompletionCell, ConnectorTarget, DispatchQueue};
use crate::error::{AuthorityError, Result};
use aclgate_core::{BackendDescriptor, ConnectorError, UserRecord};
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

type MappingCell = Arc<CompletionCell<UserRecord>>;

/// What the mapping phase hands to the authority phase
#[derive(Debug, Clone)]
pub struct MappingOutcome {
    /// Identity the authorities should see
    pub identity: UserRecord,

    /// Mapping connections that failed, by identifying string
    pub failures: Vec<(String, ConnectorError)>,
}

pub struct MappingScheduler {
    queue: DispatchQueue<UserRecord>,
    detect_cycles: bool,
}

impl MappingScheduler {
    pub fn new(queue: DispatchQueue<UserRecord>, detect_cycles: bool) -> Self {
        Self {
            queue,
            detect_cycles,
        }
    }

    /// Drive every mapping connection to completion for `user`
    ///
    /// Connector failures do not abort the request: they are logged and the
    /// failed mapper passes its input through. Unknown prerequisites,
    /// dispatch problems and cancellation do abort it.
    pub async fn run(
        &self,
        connections: &[BackendDescriptor],
        user: &UserRecord,
        cancel: &CancellationToken,
    ) -> Result<MappingOutcome> {
        if connections.is_empty() {
            return Ok(MappingOutcome {
                identity: user.clone(),
                failures: Vec::new(),
            });
        }

        if self.detect_cycles {
            graph::evaluation_order(connections)
                .map_err(|e| AuthorityError::Configuration(e.to_string()))?;
        }

        // The lookup table is complete before the first coordinator starts
        // and read-only afterwards.
        let mut cells: HashMap<String, MappingCell> = HashMap::with_capacity(connections.len());
        for connection in connections {
            let cell = Arc::new(CompletionCell::unbound(ConnectorTarget::from(connection)));
            if cells.insert(connection.name.clone(), cell).is_some() {
                return Err(AuthorityError::Configuration(format!(
                    "duplicate mapping connection name '{}'",
                    connection.name
                )));
            }
        }
        let cells = Arc::new(cells);

        let coordinators: Vec<_> = connections
            .iter()
            .map(|connection| {
                let coordinator = Coordinator {
                    name: connection.name.clone(),
                    prerequisites: connection.prerequisites.iter().cloned().collect(),
                    cells: cells.clone(),
                    queue: self.queue.clone(),
                    original: user.clone(),
                    cancel: cancel.clone(),
                };
                tokio::spawn(coordinator.run())
            })
            .collect();

        // Join every coordinator before inspecting what they captured
        let mut first_error = None;
        for (connection, joined) in connections.iter().zip(join_all(coordinators).await) {
            let result = joined.unwrap_or_else(|e| {
                Err(AuthorityError::UnexpectedFailure {
                    backend: connection.identifying_string().to_string(),
                    message: format!("mapping coordinator failed: {}", e),
                })
            });
            match result {
                Ok(()) => {}
                Err(AuthorityError::Cancelled) => return Err(AuthorityError::Cancelled),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        let mut failures = Vec::new();
        for connection in connections {
            let cell = &cells[&connection.name];
            if let Err(e) = cell.wait_for_complete(cancel).await? {
                warn!(
                    "Mapping exception logged from {}: {}; mapper aborted",
                    cell.identifying_string(),
                    e
                );
                failures.push((cell.identifying_string().to_string(), e.clone()));
            }
        }

        let identity = final_identity(connections, &cells).unwrap_or_else(|| user.clone());
        debug!("Mapping phase produced identity '{}'", identity);

        Ok(MappingOutcome { identity, failures })
    }
}

/// What a completed mapping cell passes downstream
///
/// A failed mapper passes its own input through unchanged.
fn effective_output(cell: &CompletionCell<UserRecord>) -> Option<UserRecord> {
    match cell.outcome()? {
        Ok(mapped) => Some(mapped.clone()),
        Err(_) => cell.input().cloned(),
    }
}

/// Output of the last connection, in registration order, that nothing else
/// lists as a prerequisite
fn final_identity(
    connections: &[BackendDescriptor],
    cells: &HashMap<String, MappingCell>,
) -> Option<UserRecord> {
    let required: HashSet<&str> = connections
        .iter()
        .flat_map(|c| c.prerequisites.iter().map(String::as_str))
        .collect();

    connections
        .iter()
        .rev()
        .find(|c| !required.contains(c.name.as_str()))
        .and_then(|c| cells.get(&c.name))
        .and_then(|cell| effective_output(cell))
}

/// Waits for one connection's prerequisites, then submits its cell
struct Coordinator {
    name: String,
    /// Sorted, since they come from a `BTreeSet`
    prerequisites: Vec<String>,
    cells: Arc<HashMap<String, MappingCell>>,
    queue: DispatchQueue<UserRecord>,
    original: UserRecord,
    cancel: CancellationToken,
}

impl Coordinator {
    async fn run(self) -> Result<()> {
        let own = self.cells.get(&self.name).cloned().ok_or_else(|| {
            AuthorityError::MisconfiguredSystem(format!(
                "no request was created for mapping connection '{}'",
                self.name
            ))
        })?;

        let result = self.dispatch(&own).await;

        // Anything other than cancellation means the cell will never be
        // dispatched; complete it so dependents do not wait forever.
        if let Err(e) = &result {
            if !matches!(e, AuthorityError::Cancelled) && !own.is_completed() {
                let _ = own.complete_with_failure(ConnectorError::unexpected(format!(
                    "mapping request not dispatched: {}",
                    e
                )));
            }
        }
        result
    }

    async fn dispatch(&self, own: &MappingCell) -> Result<()> {
        // Look every prerequisite up before waiting on any, so a bad name
        // fails right away instead of after the others complete.
        let prerequisites = self
            .prerequisites
            .iter()
            .map(|name| {
                self.cells.get(name).cloned().ok_or_else(|| {
                    AuthorityError::MisconfiguredSystem(format!(
                        "mapping connection '{}' requires unknown prerequisite '{}'",
                        self.name, name
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut input = self.original.clone();
        for prerequisite in &prerequisites {
            prerequisite.wait_for_complete(&self.cancel).await?;
            if let Some(output) = effective_output(prerequisite) {
                input = output;
            }
        }

        debug!(
            "Constraints met for mapper '{}'; dispatching for user '{}'",
            self.name, input
        );
        own.bind(input)?;
        self.queue.submit(own.clone())
    }
}
