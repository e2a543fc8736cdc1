//! Worker pool draining a dispatch queue

use super::cell::{CompletionCell, ConnectorTarget, Outcome};
use super::queue::{DispatchQueue, QueueReceiver};
use aclgate_core::{ConnectorError, UserRecord};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Runs the connector a cell is addressed to
#[async_trait]
pub trait Invoker<T>: Send + Sync + 'static {
    async fn invoke(&self, target: &ConnectorTarget, user: &UserRecord) -> Outcome<T>;
}

/// Caps simultaneous invocations per connection
///
/// One semaphore per (connection name, limit); a connection whose limit is
/// reconfigured gets a fresh semaphore.
#[derive(Default)]
pub struct ConnectionLimiter {
    permits: DashMap<(String, usize), Arc<Semaphore>>,
}

impl ConnectionLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for a free slot on `target`'s connection
    pub async fn acquire(
        &self,
        target: &ConnectorTarget,
    ) -> std::result::Result<OwnedSemaphorePermit, AcquireError> {
        let limit = target.max_connections.max(1);
        let semaphore = self
            .permits
            .entry((target.name.clone(), limit))
            .or_insert_with(|| Arc::new(Semaphore::new(limit)))
            .clone();
        semaphore.acquire_owned().await
    }
}

/// A fixed set of worker tasks sharing one queue
pub struct WorkerPool<T> {
    name: String,
    queue: DispatchQueue<T>,
    receiver: QueueReceiver<T>,
    shutdown: CancellationToken,
    workers: std::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl<T: Send + Sync + 'static> WorkerPool<T> {
    /// Spawn `workers` tasks (at least one) on the current runtime
    pub fn start(name: impl Into<String>, workers: usize, invoker: Arc<dyn Invoker<T>>) -> Self {
        let name = name.into();
        let (queue, receiver) = DispatchQueue::channel();
        let shutdown = CancellationToken::new();
        let limiter = Arc::new(ConnectionLimiter::new());

        let handles = (0..workers.max(1))
            .map(|id| {
                tokio::spawn(worker_loop(
                    format!("{}-{}", name, id),
                    receiver.clone(),
                    invoker.clone(),
                    limiter.clone(),
                    shutdown.clone(),
                ))
            })
            .collect();

        info!("Started {} worker pool with {} workers", name, workers.max(1));

        Self {
            name,
            queue,
            receiver,
            shutdown,
            workers: std::sync::Mutex::new(handles),
        }
    }

    /// Handle for submitting work to this pool
    pub fn queue(&self) -> DispatchQueue<T> {
        self.queue.clone()
    }

    /// Stop the workers and fail whatever is still queued
    ///
    /// Cells a worker already picked up are finished first.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();

        let handles = match self.workers.lock() {
            Ok(mut workers) => std::mem::take(&mut *workers),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        for handle in handles {
            if let Err(e) = handle.await {
                error!("{} worker ended abnormally: {}", self.name, e);
            }
        }

        let failed = self
            .receiver
            .close_and_fail(&format!("{} worker pool shut down", self.name))
            .await;
        info!("{} worker pool stopped ({} queued requests failed)", self.name, failed);
    }
}

async fn worker_loop<T: Send + Sync + 'static>(
    worker: String,
    receiver: QueueReceiver<T>,
    invoker: Arc<dyn Invoker<T>>,
    limiter: Arc<ConnectionLimiter>,
    shutdown: CancellationToken,
) {
    loop {
        let cell = tokio::select! {
            _ = shutdown.cancelled() => break,
            cell = receiver.take() => match cell {
                Some(cell) => cell,
                None => break,
            },
        };
        execute(&worker, &invoker, &limiter, cell).await;
    }
    debug!("Worker {} exiting", worker);
}

/// Run one cell and complete it, whatever happens
async fn execute<T: Send + Sync + 'static>(
    worker: &str,
    invoker: &Arc<dyn Invoker<T>>,
    limiter: &ConnectionLimiter,
    cell: Arc<CompletionCell<T>>,
) {
    let outcome = match cell.input().cloned() {
        None => Err(ConnectorError::unexpected(format!(
            "request for '{}' dispatched without an identity",
            cell.identifying_string()
        ))),
        Some(user) => match limiter.acquire(cell.target()).await {
            Err(e) => Err(ConnectorError::unexpected(format!(
                "connection limit unavailable: {}",
                e
            ))),
            Ok(permit) => {
                debug!(
                    "Worker {} invoking connector class '{}' for user '{}'",
                    worker,
                    cell.target().class_name,
                    user
                );
                let invoker = invoker.clone();
                let target = cell.target().clone();
                // Run on its own task so a panicking connector becomes a
                // captured failure instead of taking the worker down
                let joined = tokio::spawn(async move { invoker.invoke(&target, &user).await }).await;
                drop(permit);
                joined.unwrap_or_else(|e| {
                    Err(ConnectorError::unexpected(format!("connector task failed: {}", e)))
                })
            }
        },
    };

    let completed = match outcome {
        Ok(result) => cell.complete(result),
        Err(err) => cell.complete_with_failure(err),
    };
    if let Err(e) = completed {
        error!("Worker {}: {}", worker, e);
    }
}
