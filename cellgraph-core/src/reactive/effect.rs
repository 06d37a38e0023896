//! Effect Implementation
//!
//! An Effect is a side-effecting computation that runs whenever its
//! dependencies change.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs its callback immediately to establish
//!    initial dependencies.
//!
//! 2. When any dependency changes, the effect is queued. The queue is
//!    flushed in registration order before the triggering write returns, or
//!    at the end of the outermost [`Batch`](super::Batch).
//!
//! 3. Each run records a fresh dependency set that replaces the previous
//!    one.
//!
//! 4. A run never overlaps itself. If a dependency changes while the
//!    callback is running, on any thread, the effect is queued again once
//!    the current run returns.
//!
//! # Differences from Computed
//!
//! - Computed cells return a value; effects do not.
//! - Computed cells are lazy; effects are eager.
//!
//! # Disposal
//!
//! An effect lives until [`Effect::dispose`] is called or its last handle is
//! dropped. Tie effects to a [`Scope`](super::Scope) to release them with
//! their owner.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, trace};

use super::context::ReactiveContext;
use super::runtime::{Reactive, ReactiveHandle, Runtime};
use crate::error::{ReactiveError, Result};
use crate::graph::{NodeId, NodeKind};

struct EffectInner {
    callback: Box<dyn Fn() + Send + Sync>,
    stale: AtomicBool,
    disposed: AtomicBool,
    /// Held while the callback runs. A thread that finds it taken leaves
    /// the stale flag for the running thread to pick up.
    running: Mutex<()>,
    runs: AtomicUsize,
    handle: ReactiveHandle,
}

impl EffectInner {
    fn id(&self) -> NodeId {
        self.handle.node_id()
    }

    /// Run the callback, then reschedule if a dependency changed mid-run.
    fn execute(&self) -> Result<()> {
        {
            let Some(_running) = self.running.try_lock() else {
                return Ok(());
            };
            self.run_callback();
        }

        if self.stale.load(Ordering::SeqCst) && !self.disposed.load(Ordering::SeqCst) {
            trace!(node = %self.id(), "effect invalidated while running");
            return Runtime::schedule(self.id());
        }
        Ok(())
    }

    /// Run the callback inside a fresh tracking context.
    fn run_callback(&self) {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }
        self.stale.store(false, Ordering::SeqCst);

        let dependencies = {
            let _ctx = ReactiveContext::enter(self.id());
            (self.callback)();
            ReactiveContext::get_dependencies()
        };

        // The callback may have disposed this effect.
        if !self.disposed.load(Ordering::SeqCst) {
            Runtime::set_dependencies(self.id(), dependencies);
        }

        let runs = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(node = %self.id(), runs, "effect ran");
    }
}

impl Reactive for EffectInner {
    fn node_id(&self) -> NodeId {
        self.id()
    }

    fn mark_stale(&self) {
        self.stale.store(true, Ordering::SeqCst);
    }

    fn run(&self) {
        if !self.stale.load(Ordering::SeqCst) {
            return;
        }
        if let Err(err) = self.execute() {
            error!(node = %self.id(), %err, "effect rerun failed");
        }
    }
}

/// A side-effecting computation that runs when dependencies change.
///
/// # Example
///
/// ```rust
/// use cellgraph_core::reactive::{Effect, Signal};
///
/// let count = Signal::new(0);
/// let effect = {
///     let count = count.clone();
///     Effect::new(move || println!("count is {}", count.get()))
/// };
///
/// count.set(5);
/// assert_eq!(effect.run_count(), 2);
/// ```
#[derive(Clone)]
pub struct Effect {
    inner: Arc<EffectInner>,
}

impl Effect {
    /// Create a new effect and run it once.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let handle = Runtime::add_node(NodeId::new(), NodeKind::Effect);
        let inner = Arc::new(EffectInner {
            callback: Box::new(callback),
            stale: AtomicBool::new(true),
            disposed: AtomicBool::new(false),
            running: Mutex::new(()),
            runs: AtomicUsize::new(0),
            handle,
        });

        let reactive: Arc<dyn Reactive> = inner.clone();
        Runtime::register(&reactive);

        if let Err(err) = inner.execute() {
            error!(node = %inner.id(), %err, "effect flush failed after first run");
        }

        Self { inner }
    }

    pub fn id(&self) -> NodeId {
        self.inner.id()
    }

    /// Run the callback now, regardless of staleness.
    pub fn try_run(&self) -> Result<()> {
        if self.is_disposed() {
            return Err(ReactiveError::Disposed { node: self.id() });
        }
        self.inner.execute()
    }

    /// Dispose of the effect.
    ///
    /// The effect never runs again and its subscriptions are released.
    pub fn dispose(&self) {
        if !self.inner.disposed.swap(true, Ordering::SeqCst) {
            Runtime::unregister(self.id());
            debug!(node = %self.id(), "effect disposed");
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// Check whether a dependency changed since the last run.
    pub fn is_stale(&self) -> bool {
        self.inner.stale.load(Ordering::SeqCst)
    }

    /// Get the number of times the effect has run.
    pub fn run_count(&self) -> usize {
        self.inner.runs.load(Ordering::SeqCst)
    }

    /// Number of cells read during the last run.
    pub fn dependency_count(&self) -> usize {
        Runtime::dependency_count(self.id())
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.id())
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
