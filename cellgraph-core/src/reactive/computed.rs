//! Computed Implementation
//!
//! A Computed cell is a cached derived value that re-evaluates only when
//! one of its dependencies changes.
//!
//! # How Computed Cells Work
//!
//! 1. On first read, the cell runs its derivation and caches the result.
//!
//! 2. Later reads return the cached value while the cell is clean.
//!
//! 3. When a dependency changes, the runtime marks the cell stale. Nothing
//!    is recomputed yet.
//!
//! 4. The next read re-runs the derivation, records a fresh dependency set
//!    and caches the new value.
//!
//! Cells that are never read stay stale and cost nothing.
//!
//! # Thread Safety
//!
//! The cached value sits behind a `parking_lot::RwLock`. A recompute holds
//! the write lock, so readers on other threads wait for the fresh value
//! instead of seeing the old cache. The derivation may read other cells but
//! must not inspect its own cell except through [`Computed::try_get`].

use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use super::context::ReactiveContext;
use super::runtime::{Reactive, ReactiveHandle, Runtime};
use crate::error::{ReactiveError, Result};
use crate::graph::{NodeId, NodeKind};

struct ComputedInner<T> {
    derive: Box<dyn Fn() -> T + Send + Sync>,

    /// `None` until the first successful derivation.
    value: RwLock<Option<T>>,

    /// The cached value is valid only while this is false.
    stale: AtomicBool,

    recomputes: AtomicUsize,
    handle: ReactiveHandle,
}

impl<T> Reactive for ComputedInner<T>
where
    T: Send + Sync + 'static,
{
    fn node_id(&self) -> NodeId {
        self.handle.node_id()
    }

    fn mark_stale(&self) {
        self.stale.store(true, Ordering::SeqCst);
    }
}

/// Marks the cell stale again if its derivation panics.
struct StaleOnUnwind<'a>(&'a AtomicBool);

impl Drop for StaleOnUnwind<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.store(true, Ordering::SeqCst);
        }
    }
}

/// A cached derived value that recomputes only when dependencies change.
///
/// # Example
///
/// ```rust
/// use cellgraph_core::reactive::{Computed, Signal};
///
/// let count = Signal::new(1);
/// let doubled = {
///     let count = count.clone();
///     Computed::new(move || count.get() * 2)
/// };
///
/// assert_eq!(doubled.get(), 2);
/// count.set(4);
/// assert_eq!(doubled.get(), 8);
/// ```
pub struct Computed<T>
where
    T: Clone + Send + Sync + 'static,
{
    inner: Arc<ComputedInner<T>>,
}

impl<T> Computed<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a new computed cell.
    ///
    /// The derivation does not run until the first read.
    pub fn new<F>(derive: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let handle = Runtime::add_node(NodeId::new(), NodeKind::Derived);
        let inner = Arc::new(ComputedInner {
            derive: Box::new(derive),
            value: RwLock::new(None),
            stale: AtomicBool::new(true),
            recomputes: AtomicUsize::new(0),
            handle,
        });

        let reactive: Arc<dyn Reactive> = inner.clone();
        Runtime::register(&reactive);

        Self { inner }
    }

    pub fn id(&self) -> NodeId {
        self.inner.handle.node_id()
    }

    /// Get the current value, recomputing if necessary.
    ///
    /// # Panics
    ///
    /// Panics if the cell is read during its own derivation, and propagates
    /// any panic raised by the derivation.
    pub fn get(&self) -> T {
        match self.try_get() {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }

    /// Get the current value, reporting a dependency cycle as an error.
    pub fn try_get(&self) -> Result<T> {
        let id = self.id();
        ReactiveContext::track_dependency(id);

        if ReactiveContext::is_running(id) {
            return Err(ReactiveError::Cycle { node: id });
        }

        {
            let value = self.inner.value.read();
            if let Some(value) = value.as_ref().filter(|_| !self.is_stale()) {
                return Ok(value.clone());
            }
        }

        Ok(self.recompute())
    }

    /// Get the current value without tracking the read.
    pub fn get_untracked(&self) -> T {
        super::context::untracked(|| self.get())
    }

    /// Run the derivation inside a fresh tracking context.
    ///
    /// The stale flag is cleared before the derivation starts, so a write
    /// landing mid-run leaves the new cache stale.
    fn recompute(&self) -> T {
        let id = self.id();
        let mut slot = self.inner.value.write();

        // Another thread refreshed the cache while we waited for the lock.
        if let Some(value) = slot.as_ref().filter(|_| !self.is_stale()) {
            return value.clone();
        }

        self.inner.stale.store(false, Ordering::SeqCst);
        let _unwind = StaleOnUnwind(&self.inner.stale);

        let (value, dependencies) = {
            let _ctx = ReactiveContext::enter(id);
            let value = (self.inner.derive)();
            (value, ReactiveContext::get_dependencies())
        };

        trace!(node = %id, dependencies = dependencies.len(), "computed recomputed");
        Runtime::set_dependencies(id, dependencies);

        *slot = Some(value.clone());
        self.inner.recomputes.fetch_add(1, Ordering::SeqCst);

        value
    }

    /// Check whether the next read will recompute.
    pub fn is_stale(&self) -> bool {
        self.inner.stale.load(Ordering::SeqCst)
    }

    /// Check if the cell has a cached value.
    pub fn has_value(&self) -> bool {
        self.inner.value.read().is_some()
    }

    /// Number of times the derivation has completed.
    pub fn recompute_count(&self) -> usize {
        self.inner.recomputes.load(Ordering::SeqCst)
    }

    /// Number of cells read during the last derivation.
    pub fn dependency_count(&self) -> usize {
        Runtime::dependency_count(self.id())
    }

    /// Number of cells that read this one during their last run.
    pub fn subscriber_count(&self) -> usize {
        Runtime::dependent_count(self.id())
    }
}

impl<T> Clone for Computed<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Debug for Computed<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Computed")
            .field("id", &self.id())
            .field("stale", &self.is_stale())
            .field("value", &*self.inner.value.read())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
