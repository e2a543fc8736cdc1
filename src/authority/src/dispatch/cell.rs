//! Single-use completion cells
//!
//! A cell wraps one unit of dispatched work. It is completed exactly once,
//! by the worker that ran the connector, and may be awaited by any number
//! of tasks. After completion its outcome never changes.

use crate::error::{AuthorityError, Result};
use aclgate_core::{BackendDescriptor, ConfigParams, ConnectorError, UserRecord};
use std::fmt;
use std::sync::OnceLock;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Result of one connector invocation
pub type Outcome<T> = std::result::Result<T, ConnectorError>;

/// Connection a cell is addressed to, copied from its descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorTarget {
    pub name: String,
    pub class_name: String,
    pub identifying_string: String,
    pub config: ConfigParams,
    pub max_connections: usize,
}

impl From<&BackendDescriptor> for ConnectorTarget {
    fn from(descriptor: &BackendDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            class_name: descriptor.class_name.clone(),
            identifying_string: descriptor.identifying_string().to_string(),
            config: descriptor.config.clone(),
            max_connections: descriptor.max_connections,
        }
    }
}

pub struct CompletionCell<T> {
    target: ConnectorTarget,
    input: OnceLock<UserRecord>,
    outcome: OnceLock<Outcome<T>>,
    notify: Notify,
}

impl<T> CompletionCell<T> {
    /// A cell whose input identity is known up front
    pub fn new(target: ConnectorTarget, user: UserRecord) -> Self {
        let cell = Self::unbound(target);
        // A fresh OnceLock always accepts its first value
        let _ = cell.input.set(user);
        cell
    }

    /// A cell whose input is bound later, right before it is submitted
    pub fn unbound(target: ConnectorTarget) -> Self {
        Self {
            target,
            input: OnceLock::new(),
            outcome: OnceLock::new(),
            notify: Notify::new(),
        }
    }

    /// Bind the input identity; only the first bind succeeds
    pub fn bind(&self, user: UserRecord) -> Result<()> {
        self.input
            .set(user)
            .map_err(|_| AuthorityError::AlreadyBound(self.target.name.clone()))
    }

    pub fn input(&self) -> Option<&UserRecord> {
        self.input.get()
    }

    pub fn target(&self) -> &ConnectorTarget {
        &self.target
    }

    pub fn identifying_string(&self) -> &str {
        &self.target.identifying_string
    }

    /// Complete with a result and wake every waiter
    pub fn complete(&self, result: T) -> Result<()> {
        self.finish(Ok(result))
    }

    /// Complete with a captured failure and wake every waiter
    pub fn complete_with_failure(&self, err: ConnectorError) -> Result<()> {
        self.finish(Err(err))
    }

    fn finish(&self, outcome: Outcome<T>) -> Result<()> {
        self.outcome
            .set(outcome)
            .map_err(|_| AuthorityError::DoubleCompletion(self.target.name.clone()))?;
        self.notify.notify_waiters();
        Ok(())
    }

    pub fn is_completed(&self) -> bool {
        self.outcome.get().is_some()
    }

    pub fn outcome(&self) -> Option<&Outcome<T>> {
        self.outcome.get()
    }

    /// The result, once completed successfully
    pub fn result(&self) -> Option<&T> {
        self.outcome.get().and_then(|o| o.as_ref().ok())
    }

    /// The captured failure, once completed unsuccessfully
    pub fn failure(&self) -> Option<&ConnectorError> {
        self.outcome.get().and_then(|o| o.as_ref().err())
    }

    /// Wait until the cell is completed
    ///
    /// Returns `Cancelled` if `cancel` fires first. Cancelling one waiter
    /// leaves the cell untouched for everybody else.
    pub async fn wait_for_complete(&self, cancel: &CancellationToken) -> Result<&Outcome<T>> {
        loop {
            // Register interest before checking, so a completion landing
            // between the check and the await still wakes us.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(outcome) = self.outcome.get() {
                return Ok(outcome);
            }

            tokio::select! {
                _ = &mut notified => {}
                _ = cancel.cancelled() => return Err(AuthorityError::Cancelled),
            }
        }
    }
}

impl<T> fmt::Debug for CompletionCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionCell")
            .field("target", &self.target.name)
            .field("bound", &self.input.get().is_some())
            .field("completed", &self.is_completed())
            .finish()
    }
}
