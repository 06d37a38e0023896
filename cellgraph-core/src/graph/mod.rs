//! Dependency Graph
//!
//! This module implements the dependency graph that tracks relationships
//! between cells.
//!
//! # Overview
//!
//! - Nodes represent signals, computed cells or effects.
//! - Edges represent dependencies: if A reads B, there is an edge from B to A.
//!
//! When a signal changes, the graph is traversed to find every affected
//! node. Edges are rebuilt each time a computed cell or effect re-runs, so
//! the graph can change shape at runtime.
//!
//! Both forward (dependencies) and reverse (dependents) edges are stored to
//! make traversal cheap in both directions.

mod node;
mod scheduler;

pub use node::{Node, NodeId, NodeKind};
pub use scheduler::UpdateScheduler;
