//! Asynchronous dispatch of connector invocations
//!
//! Submitters wrap each unit of work in a [`CompletionCell`] and hand it to a
//! [`DispatchQueue`]. A [`WorkerPool`] drains the queue, runs the named
//! connector through an [`Invoker`] while honoring each connection's
//! `max_connections`, and completes the cell exactly once.

pub mod cell;
pub mod pool;
pub mod queue;

pub use cell::{CompletionCell, ConnectorTarget, Outcome};
pub use pool::{ConnectionLimiter, Invoker, WorkerPool};
pub use queue::{DispatchQueue, QueueReceiver};
