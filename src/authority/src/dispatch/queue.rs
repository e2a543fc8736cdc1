//! Multi-producer, multi-consumer queue of completion cells

use super::cell::CompletionCell;
use crate::error::{AuthorityError, Result};
use aclgate_core::ConnectorError;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Submitting side of a dispatch queue
///
/// Cheap to clone; every request handler holds one. Submission never waits.
pub struct DispatchQueue<T> {
    sender: mpsc::UnboundedSender<Arc<CompletionCell<T>>>,
}

impl<T> Clone for DispatchQueue<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T> DispatchQueue<T> {
    /// Create a queue and the receiving side its workers share
    pub fn channel() -> (Self, QueueReceiver<T>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self { sender },
            QueueReceiver {
                inner: Arc::new(Mutex::new(receiver)),
            },
        )
    }

    /// Enqueue a cell for execution
    ///
    /// Fails with `MisconfiguredSystem` when nothing drains the queue
    /// anymore; the cell is then left untouched.
    pub fn submit(&self, cell: Arc<CompletionCell<T>>) -> Result<()> {
        self.sender.send(cell).map_err(|_| {
            AuthorityError::MisconfiguredSystem("dispatch queue is not running".to_string())
        })
    }

    /// True once the receiving side has shut down
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Receiving side, shared by every worker of a pool
pub struct QueueReceiver<T> {
    inner: Arc<Mutex<mpsc::UnboundedReceiver<Arc<CompletionCell<T>>>>>,
}

impl<T> Clone for QueueReceiver<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> QueueReceiver<T> {
    /// Take the next cell; `None` once every submitter is gone
    pub async fn take(&self) -> Option<Arc<CompletionCell<T>>> {
        self.inner.lock().await.recv().await
    }

    /// Refuse further submissions and fail everything still queued
    ///
    /// Returns how many cells were failed.
    pub async fn close_and_fail(&self, reason: &str) -> usize {
        let mut receiver = self.inner.lock().await;
        receiver.close();

        let mut failed = 0;
        while let Ok(cell) = receiver.try_recv() {
            if cell
                .complete_with_failure(ConnectorError::unexpected(reason.to_string()))
                .is_ok()
            {
                failed += 1;
            }
        }
        failed
    }
}
