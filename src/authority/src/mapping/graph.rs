//! Prerequisite graph checks for mapping connections
//!
//! The scheduler itself never sorts the graph; coordinators simply wait on
//! their prerequisites. This module exists for the optional up-front check
//! that turns a cyclic configuration (which would otherwise hang until the
//! request timeout) into an immediate configuration error.
//!
//! Prerequisite names that match no connection are skipped here; the
//! scheduler reports those itself when a coordinator looks them up.

use aclgate_core::BackendDescriptor;
use std::collections::{HashMap, VecDeque};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    /// Circular dependency between mapping connections
    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    /// Two mapping connections share a name
    #[error("Duplicate mapping connection name: {0}")]
    DuplicateConnection(String),
}

/// Evaluation order for `connections` using Kahn's algorithm
///
/// Connections become ready in registration order whenever several are
/// ready at once, so the result is deterministic.
pub fn evaluation_order(connections: &[BackendDescriptor]) -> Result<Vec<String>, GraphError> {
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(connections.len());
    for (i, connection) in connections.iter().enumerate() {
        if index.insert(connection.name.as_str(), i).is_some() {
            return Err(GraphError::DuplicateConnection(connection.name.clone()));
        }
    }

    // dependents[p] = connections waiting on p
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); connections.len()];
    let mut in_degree: Vec<usize> = vec![0; connections.len()];
    for (i, connection) in connections.iter().enumerate() {
        for prerequisite in &connection.prerequisites {
            if let Some(&p) = index.get(prerequisite.as_str()) {
                dependents[p].push(i);
                in_degree[i] += 1;
            }
        }
    }

    let mut queue: VecDeque<usize> = (0..connections.len())
        .filter(|&i| in_degree[i] == 0)
        .collect();
    let mut sorted = Vec::with_capacity(connections.len());

    while let Some(current) = queue.pop_front() {
        sorted.push(connections[current].name.clone());
        for &dependent in &dependents[current] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                queue.push_back(dependent);
            }
        }
    }

    if sorted.len() != connections.len() {
        let cycle = find_cycle(connections, &index)
            .map(|path| path.join(" -> "))
            .unwrap_or_else(|| "unknown cycle".to_string());
        return Err(GraphError::CircularDependency(cycle));
    }

    Ok(sorted)
}

/// Depth-first search for one cycle, reported as a closed path
fn find_cycle(connections: &[BackendDescriptor], index: &HashMap<&str, usize>) -> Option<Vec<String>> {
    // 0 = unvisited, 1 = on the current path, 2 = done
    let mut state = vec![0u8; connections.len()];
    let mut path = Vec::new();

    for start in 0..connections.len() {
        if state[start] == 0 {
            if let Some(cycle) = visit(start, connections, index, &mut state, &mut path) {
                return Some(cycle);
            }
        }
    }
    None
}

fn visit(
    node: usize,
    connections: &[BackendDescriptor],
    index: &HashMap<&str, usize>,
    state: &mut [u8],
    path: &mut Vec<usize>,
) -> Option<Vec<String>> {
    state[node] = 1;
    path.push(node);

    for prerequisite in &connections[node].prerequisites {
        let Some(&next) = index.get(prerequisite.as_str()) else {
            continue;
        };
        match state[next] {
            1 => {
                let start = path.iter().position(|&n| n == next).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..]
                    .iter()
                    .map(|&n| connections[n].name.clone())
                    .collect();
                cycle.push(connections[next].name.clone());
                return Some(cycle);
            }
            0 => {
                if let Some(cycle) = visit(next, connections, index, state, path) {
                    return Some(cycle);
                }
            }
            _ => {}
        }
    }

    path.pop();
    state[node] = 2;
    None
}
