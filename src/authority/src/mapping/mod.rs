//! Mapping phase: identity rewriting in prerequisite order

pub mod graph;
pub mod scheduler;

pub use graph::{evaluation_order, GraphError};
pub use scheduler::{MappingOutcome, MappingScheduler};
