//! Signal Implementation
//!
//! A Signal is the fundamental reactive primitive. It holds a value and
//! tracks which computations depend on it.
//!
//! # How Signals Work
//!
//! 1. When a signal is read within a reactive context (computed/effect), the
//!    reader becomes a subscriber immediately, even before its run completes.
//!
//! 2. When a signal's value changes, every downstream computed cell is
//!    marked stale and every downstream effect runs.
//!
//! 3. Writing a value equal to the current one changes nothing.
//!
//! # Thread Safety
//!
//! The value is protected by a `parking_lot::RwLock`. The lock is never held
//! while subscribers run.

use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::error;

use super::context::ReactiveContext;
use super::runtime::{ReactiveHandle, Runtime};
use crate::error::Result;
use crate::graph::{NodeId, NodeKind};

struct SignalInner<T> {
    value: RwLock<T>,
    handle: ReactiveHandle,
}

/// A reactive signal holding a value of type T.
///
/// Cloning a signal yields another handle to the same cell. The node leaves
/// the graph when the last handle is dropped.
///
/// # Example
///
/// ```rust
/// use cellgraph_core::reactive::Signal;
///
/// let count = Signal::new(0);
/// count.set(5);
/// assert_eq!(count.get(), 5);
/// ```
pub struct Signal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    inner: Arc<SignalInner<T>>,
}

impl<T> Signal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a new signal with the given initial value.
    pub fn new(value: T) -> Self {
        let handle = Runtime::add_node(NodeId::new(), NodeKind::Source);
        Self {
            inner: Arc::new(SignalInner {
                value: RwLock::new(value),
                handle,
            }),
        }
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> NodeId {
        self.inner.handle.node_id()
    }

    /// Get the current value.
    ///
    /// If called within a reactive context, the running computation becomes
    /// a subscriber.
    pub fn get(&self) -> T {
        ReactiveContext::track_dependency(self.id());
        self.inner.value.read().clone()
    }

    /// Get the current value without tracking dependencies.
    pub fn get_untracked(&self) -> T {
        self.inner.value.read().clone()
    }

    /// Borrow the current value, tracking the read.
    ///
    /// The value is read-locked while `f` runs; `f` must not write to this
    /// signal.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        ReactiveContext::track_dependency(self.id());
        f(&*self.inner.value.read())
    }

    /// Set a new value and notify subscribers.
    ///
    /// Flush failures are logged; use [`try_set`](Self::try_set) to handle
    /// them.
    pub fn set(&self, value: T) {
        if let Err(err) = self.try_set(value) {
            error!(signal = %self.id(), %err, "signal update failed");
        }
    }

    /// Set a new value and notify subscribers, reporting flush failures.
    ///
    /// Returns `Ok(())` without notifying when `value` equals the current
    /// value.
    pub fn try_set(&self, value: T) -> Result<()> {
        {
            let mut guard = self.inner.value.write();
            if *guard == value {
                return Ok(());
            }
            *guard = value;
        }

        Runtime::notify_changed(self.id())
    }

    /// Update the value using a function of the current value.
    ///
    /// The read and the write happen under one write lock, so concurrent
    /// updates never lose each other's changes. `f` must not touch this
    /// signal.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        if let Err(err) = self.try_update(f) {
            error!(signal = %self.id(), %err, "signal update failed");
        }
    }

    /// Like [`update`](Self::update), reporting flush failures.
    pub fn try_update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&T) -> T,
    {
        {
            let mut guard = self.inner.value.write();
            let new_value = f(&*guard);
            if *guard == new_value {
                return Ok(());
            }
            *guard = new_value;
        }

        Runtime::notify_changed(self.id())
    }

    /// Notify subscribers without changing the value.
    pub fn notify(&self) {
        if let Err(err) = Runtime::notify_changed(self.id()) {
            error!(signal = %self.id(), %err, "signal notification failed");
        }
    }

    /// Get the number of cells that read this signal during their last run.
    pub fn subscriber_count(&self) -> usize {
        Runtime::dependent_count(self.id())
    }
}

impl<T> Clone for Signal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Debug for Signal<T>
where
    T: Clone + PartialEq + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.id())
            .field("value", &*self.inner.value.read())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Effect;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[test]
    fn signal_get_and_set() {
        let signal = Signal::new(0);
        assert_eq!(signal.get(), 0);

        signal.set(42);
        assert_eq!(signal.get(), 42);
    }

    #[test]
    fn signal_update() {
        let signal = Signal::new(10);
        signal.update(|v| v + 5);
        assert_eq!(signal.get(), 15);
    }

    #[test]
    fn concurrent_updates_are_not_lost() {
        let counter = Signal::new(0u64);

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let counter = counter.clone();
                std::thread::spawn(move || {
                    for _ in 0..5000 {
                        counter.update(|v| v + 1);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(counter.get(), 40_000);
    }

    #[test]
    fn signal_with_borrows_value() {
        let signal = Signal::new(vec![1, 2, 3]);
        assert_eq!(signal.with(|items| items.len()), 3);
    }

    #[test]
    fn equal_value_does_not_notify() {
        let signal = Signal::new(7);
        let runs = Arc::new(AtomicI32::new(0));

        let _effect = {
            let signal = signal.clone();
            let runs = runs.clone();
            Effect::new(move || {
                signal.get();
                runs.fetch_add(1, Ordering::SeqCst);
            })
        };
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        signal.set(7);
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        signal.notify();
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn subscriber_count_follows_readers() {
        let signal = Signal::new(0);
        assert_eq!(signal.subscriber_count(), 0);

        let effect = {
            let signal = signal.clone();
            Effect::new(move || {
                signal.get();
            })
        };
        assert_eq!(signal.subscriber_count(), 1);

        effect.dispose();
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn untracked_read_does_not_subscribe() {
        let signal = Signal::new(0);
        let _effect = {
            let signal = signal.clone();
            Effect::new(move || {
                signal.get_untracked();
            })
        };
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn signal_clone_shares_state() {
        let signal1 = Signal::new(0);
        let signal2 = signal1.clone();

        signal1.set(42);
        assert_eq!(signal2.get(), 42);
        assert_eq!(signal1.id(), signal2.id());
    }

    #[test]
    fn dropping_last_handle_removes_node() {
        let signal = Signal::new(0);
        let id = signal.id();
        let clone = signal.clone();

        drop(signal);
        assert!(Runtime::contains(id));

        drop(clone);
        assert!(!Runtime::contains(id));
    }
}
