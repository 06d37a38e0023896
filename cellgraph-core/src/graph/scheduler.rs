//! Update Scheduler
//!
//! The scheduler owns the dependency graph and answers one question for the
//! runtime: when a node changes, which nodes are now stale?
//!
//! # Algorithm
//!
//! 1. Start from the changed node's direct dependents.
//! 2. Walk dependents breadth-first, visiting each node once.
//! 3. Return every visited node. Derived nodes get marked stale by the
//!    caller; effect nodes get queued.
//!
//! Nothing is recomputed here. Derived values are pulled lazily on their
//! next read.

use std::collections::{HashMap, HashSet, VecDeque};

use super::node::{Node, NodeId};

/// The update scheduler manages the dependency graph and coordinates updates.
#[derive(Debug, Default)]
pub struct UpdateScheduler {
    nodes: HashMap<NodeId, Node>,
}

impl UpdateScheduler {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
        }
    }

    /// Add a node to the graph.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id();
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node from the graph, along with every edge touching it.
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<Node> {
        let node = self.nodes.remove(&node_id)?;

        for dep_id in node.dependencies() {
            if let Some(dep) = self.nodes.get_mut(dep_id) {
                dep.remove_dependent(node_id);
            }
        }

        for dependent_id in node.dependents() {
            if let Some(dependent) = self.nodes.get_mut(dependent_id) {
                dependent.remove_dependency(node_id);
            }
        }

        Some(node)
    }

    pub fn get_node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    pub fn contains(&self, node_id: NodeId) -> bool {
        self.nodes.contains_key(&node_id)
    }

    /// Add a dependency edge: `dependent` depends on `dependency`.
    ///
    /// Edges are only recorded when both ends are in the graph.
    pub fn add_edge(&mut self, dependency: NodeId, dependent: NodeId) {
        if dependency == dependent
            || !self.nodes.contains_key(&dependency)
            || !self.nodes.contains_key(&dependent)
        {
            return;
        }
        if let Some(dep_node) = self.nodes.get_mut(&dependency) {
            dep_node.add_dependent(dependent);
        }
        if let Some(dependent_node) = self.nodes.get_mut(&dependent) {
            dependent_node.add_dependency(dependency);
        }
    }

    /// Replace the full dependency set of `dependent`.
    ///
    /// Old edges are dropped first, so a node that stopped reading a cell
    /// no longer hears about it.
    pub fn replace_dependencies<I>(&mut self, dependent: NodeId, dependencies: I)
    where
        I: IntoIterator<Item = NodeId>,
    {
        let old = match self.nodes.get_mut(&dependent) {
            Some(node) => node.take_dependencies(),
            None => return,
        };

        for dep_id in old {
            if let Some(dep) = self.nodes.get_mut(&dep_id) {
                dep.remove_dependent(dependent);
            }
        }

        for dep_id in dependencies {
            self.add_edge(dep_id, dependent);
        }
    }

    /// Drop every dependency of `dependent` without adding new ones.
    pub fn clear_dependencies(&mut self, dependent: NodeId) {
        self.replace_dependencies(dependent, std::iter::empty());
    }

    /// Collect every node downstream of `source_id`.
    ///
    /// The result is in breadth-first order and never contains the source
    /// itself. Cycles in the graph are visited once.
    pub fn mark_changed(&self, source_id: NodeId) -> Vec<NodeId> {
        let mut affected = Vec::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();

        visited.insert(source_id);
        if let Some(source) = self.nodes.get(&source_id) {
            queue.extend(source.dependents().iter().copied());
        }

        while let Some(node_id) = queue.pop_front() {
            if !visited.insert(node_id) {
                continue;
            }

            if let Some(node) = self.nodes.get(&node_id) {
                affected.push(node_id);
                queue.extend(node.dependents().iter().copied());
            }
        }

        affected
    }

    pub fn dependent_count(&self, node_id: NodeId) -> usize {
        self.nodes
            .get(&node_id)
            .map(|node| node.dependents().len())
            .unwrap_or(0)
    }

    pub fn dependency_count(&self, node_id: NodeId) -> usize {
        self.nodes
            .get(&node_id)
            .map(|node| node.dependencies().len())
            .unwrap_or(0)
    }

    /// Get the total number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
