//! Reactive Runtime
//!
//! The runtime is the central coordinator that connects signals, computed
//! cells and effects. It owns the dependency graph and schedules effects
//! when signals change.
//!
//! # How It Works
//!
//! 1. Every cell adds a node to the graph when it is created. Computed cells
//!    and effects also register themselves so they can be notified.
//!
//! 2. Each tracked read adds an edge from the reader to the cell it read,
//!    so a write that lands mid-run already reaches the reader. When the
//!    run finishes, the runtime replaces the reader's edges with exactly
//!    the reads recorded during that run.
//!
//! 3. When a signal's value changes, the runtime:
//!    a. Finds every node downstream of it
//!    b. Marks them stale
//!    c. Queues the effects among them
//!    d. Flushes the queue, unless a batch is open or a flush is running
//!
//! Computed cells are lazy and recompute on their next read.
//!
//! # Thread Safety
//!
//! The graph and registry are global and lock-protected, so handles can
//! move between threads. The effect queue and batch depth are thread-local:
//! effects run on the thread that changed their inputs. No lock is held
//! while user code runs.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock, Weak};

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use crate::config::RuntimeConfig;
use crate::error::{ReactiveError, Result};
use crate::graph::{Node, NodeId, NodeKind, UpdateScheduler};

/// A cell that can be notified when its dependencies change.
pub trait Reactive: Send + Sync {
    /// Get the node ID for this cell.
    fn node_id(&self) -> NodeId;

    /// Mark this cell as needing to run again.
    fn mark_stale(&self);

    /// Run the cell if it is stale. Only effects do anything here.
    fn run(&self) {}
}

/// Handle to a node in the graph.
///
/// Dropping this handle removes the node and unregisters the cell.
#[derive(Debug)]
pub struct ReactiveHandle {
    node_id: NodeId,
}

impl ReactiveHandle {
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }
}

impl Drop for ReactiveHandle {
    fn drop(&mut self) {
        Runtime::unregister(self.node_id);
    }
}

/// The global reactive runtime.
pub struct Runtime;

static GRAPH: OnceLock<RwLock<UpdateScheduler>> = OnceLock::new();
static REGISTRY: OnceLock<DashMap<NodeId, Weak<dyn Reactive>>> = OnceLock::new();
static CONFIG: OnceLock<RwLock<RuntimeConfig>> = OnceLock::new();

thread_local! {
    static PENDING: RefCell<BTreeSet<NodeId>> = const { RefCell::new(BTreeSet::new()) };
    static FLUSHING: Cell<bool> = const { Cell::new(false) };
    static BATCH_DEPTH: Cell<usize> = const { Cell::new(0) };
}

fn graph() -> &'static RwLock<UpdateScheduler> {
    GRAPH.get_or_init(|| RwLock::new(UpdateScheduler::new()))
}

fn registry() -> &'static DashMap<NodeId, Weak<dyn Reactive>> {
    REGISTRY.get_or_init(DashMap::new)
}

fn runtime_config() -> &'static RwLock<RuntimeConfig> {
    CONFIG.get_or_init(|| RwLock::new(RuntimeConfig::default()))
}

/// Clears the flushing flag even if an effect panics.
struct FlushGuard;

impl FlushGuard {
    fn enter() -> Option<Self> {
        if FLUSHING.with(|f| f.replace(true)) {
            None
        } else {
            Some(Self)
        }
    }
}

impl Drop for FlushGuard {
    fn drop(&mut self) {
        FLUSHING.with(|f| f.set(false));
    }
}

impl Runtime {
    /// Install a new runtime configuration.
    pub fn configure(new_config: RuntimeConfig) {
        debug!(?new_config, "runtime reconfigured");
        *runtime_config().write() = new_config;
    }

    /// Get the active runtime configuration.
    pub fn config() -> RuntimeConfig {
        *runtime_config().read()
    }

    /// Add a node to the graph.
    ///
    /// Returns a handle that removes the node when dropped.
    pub fn add_node(node_id: NodeId, kind: NodeKind) -> ReactiveHandle {
        graph().write().add_node(Node::new(node_id, kind));
        trace!(node = %node_id, ?kind, "node added");
        ReactiveHandle { node_id }
    }

    /// Register a cell for notifications.
    ///
    /// The registry only keeps a weak reference; the cell's lifetime is
    /// governed by its handles.
    pub fn register(reactive: &Arc<dyn Reactive>) {
        registry().insert(reactive.node_id(), Arc::downgrade(reactive));
    }

    /// Remove a node and its edges. Safe to call more than once.
    pub fn unregister(node_id: NodeId) {
        registry().remove(&node_id);
        let removed = graph().write().remove_node(node_id);
        // Handles dropped during thread teardown outlive the queue.
        let _ = PENDING.try_with(|pending| pending.borrow_mut().remove(&node_id));

        if removed.is_some() {
            trace!(node = %node_id, "node removed");
        }
    }

    /// Add a single edge recorded by a tracked read.
    pub fn add_dependency(dependent: NodeId, dependency: NodeId) {
        graph().write().add_edge(dependency, dependent);
    }

    /// Replace the dependency set of `dependent`.
    ///
    /// Called after each run of a computed cell or effect.
    pub fn set_dependencies<I>(dependent: NodeId, dependencies: I)
    where
        I: IntoIterator<Item = NodeId>,
    {
        graph().write().replace_dependencies(dependent, dependencies);
    }

    /// Propagate a change of `source` through the graph.
    ///
    /// Every downstream node is marked stale and downstream effects are
    /// queued. The queue is flushed before returning unless a batch is open
    /// or a flush is already running further up the stack.
    pub fn notify_changed(source: NodeId) -> Result<()> {
        let affected: Vec<(NodeId, bool)> = {
            let graph = graph().read();
            graph
                .mark_changed(source)
                .into_iter()
                .filter_map(|id| graph.get_node(id).map(|node| (id, node.is_eager())))
                .collect()
        };

        if affected.is_empty() {
            return Ok(());
        }

        trace!(node = %source, affected = affected.len(), "propagating change");

        for (node_id, eager) in affected {
            let Some(reactive) = Self::lookup(node_id) else {
                continue;
            };
            reactive.mark_stale();
            if eager {
                PENDING.with(|pending| pending.borrow_mut().insert(node_id));
            }
        }

        if Self::is_batching() {
            return Ok(());
        }

        Self::flush()
    }

    /// Queue an effect on this thread and flush unless a batch is open.
    ///
    /// Inside a running flush this only queues; the flush picks it up.
    pub fn schedule(node_id: NodeId) -> Result<()> {
        PENDING.with(|pending| pending.borrow_mut().insert(node_id));

        if Self::is_batching() {
            return Ok(());
        }

        Self::flush()
    }

    /// Run every queued effect in registration order.
    ///
    /// Effects queued while the flush runs are picked up by the same flush.
    /// Calling this from inside a running flush is a no-op.
    pub fn flush() -> Result<()> {
        let Some(_guard) = FlushGuard::enter() else {
            return Ok(());
        };

        let limit = Self::config().max_flush_iterations;
        let mut runs = 0usize;

        while let Some(node_id) = PENDING.with(|pending| pending.borrow_mut().pop_first()) {
            if runs >= limit {
                let dropped = PENDING.with(|pending| {
                    let mut pending = pending.borrow_mut();
                    let len = pending.len() + 1;
                    pending.clear();
                    len
                });
                warn!(limit, dropped, "effect flush abandoned");
                return Err(ReactiveError::FlushLimitExceeded { limit });
            }

            if let Some(reactive) = Self::lookup(node_id) {
                runs += 1;
                reactive.run();
            }
        }

        if runs > 0 {
            debug!(runs, "effects flushed");
        }
        Ok(())
    }

    /// Number of effects waiting on this thread.
    pub fn pending_count() -> usize {
        PENDING.with(|pending| pending.borrow().len())
    }

    /// Open a batch on this thread.
    pub(crate) fn enter_batch() {
        BATCH_DEPTH.with(|depth| depth.set(depth.get() + 1));
    }

    /// Close a batch. Returns true when the outermost batch closed.
    pub(crate) fn exit_batch() -> bool {
        BATCH_DEPTH.with(|depth| {
            let next = depth.get().saturating_sub(1);
            depth.set(next);
            next == 0
        })
    }

    /// Check if a batch is open on this thread.
    pub fn is_batching() -> bool {
        BATCH_DEPTH.with(|depth| depth.get() > 0)
    }

    /// Number of nodes that read `node_id` during their last run.
    pub fn dependent_count(node_id: NodeId) -> usize {
        graph().read().dependent_count(node_id)
    }

    /// Number of nodes `node_id` read during its last run.
    pub fn dependency_count(node_id: NodeId) -> usize {
        graph().read().dependency_count(node_id)
    }

    /// Check whether a node is still in the graph.
    pub fn contains(node_id: NodeId) -> bool {
        graph().read().contains(node_id)
    }

    /// Upgrade a registry entry without holding the shard lock afterwards.
    fn lookup(node_id: NodeId) -> Option<Arc<dyn Reactive>> {
        let weak = registry().get(&node_id).map(|entry| entry.value().clone())?;
        weak.upgrade()
    }
}
