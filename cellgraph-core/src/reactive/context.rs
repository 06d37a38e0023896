//! Reactive Context
//!
//! The reactive context tracks which computation is currently running.
//! When a cell is read, the current computation is recorded as a dependent.
//!
//! # Implementation
//!
//! A thread-local stack holds one entry per running computation. Entering a
//! computed cell or effect pushes an entry; the returned guard pops it on
//! drop, including during unwinding. Nested entries support a computed cell
//! that reads another computed cell.
//!
//! An untracked entry carries no tracker. Reads under it record nothing,
//! even when an outer tracker is running.

use std::cell::RefCell;

use smallvec::SmallVec;

use super::runtime::Runtime;
use crate::graph::NodeId;

/// Dependency list collected during a single run.
pub type Dependencies = SmallVec<[NodeId; 8]>;

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<ContextEntry>> = const { RefCell::new(Vec::new()) };
}

#[derive(Debug)]
struct ContextEntry {
    /// `None` for an untracked scope.
    tracker: Option<NodeId>,
    /// Cells read during this run, in first-read order.
    dependencies: Dependencies,
}

/// Guard that pops the context when dropped.
#[must_use = "the context is exited as soon as the guard is dropped"]
pub struct ReactiveContext {
    tracker: Option<NodeId>,
}

impl ReactiveContext {
    /// Enter a new reactive context for the given tracker.
    ///
    /// While the guard lives, every cell read on this thread is recorded as
    /// a dependency of `tracker`.
    pub fn enter(tracker: NodeId) -> Self {
        Self::push(Some(tracker))
    }

    /// Enter a scope in which reads are not tracked.
    pub fn untracked() -> Self {
        Self::push(None)
    }

    fn push(tracker: Option<NodeId>) -> Self {
        CONTEXT_STACK.with(|stack| {
            stack.borrow_mut().push(ContextEntry {
                tracker,
                dependencies: Dependencies::new(),
            });
        });

        Self { tracker }
    }

    /// Check if reads are currently being tracked.
    pub fn is_active() -> bool {
        Self::current_subscriber().is_some()
    }

    /// Get the current tracker, if any.
    pub fn current_subscriber() -> Option<NodeId> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().and_then(|entry| entry.tracker))
    }

    /// Check whether `tracker` is anywhere on this thread's stack.
    pub fn is_running(tracker: NodeId) -> bool {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .iter()
                .any(|entry| entry.tracker == Some(tracker))
        })
    }

    /// Record a read of `source` on the innermost tracker.
    ///
    /// Repeated reads of the same cell are recorded once. The first read
    /// also adds the graph edge right away, so a write landing before the
    /// run finishes still marks the tracker stale.
    pub fn track_dependency(source: NodeId) {
        let tracker = CONTEXT_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            let entry = stack.last_mut()?;
            let tracker = entry.tracker?;
            if entry.dependencies.contains(&source) {
                return None;
            }
            entry.dependencies.push(source);
            Some(tracker)
        });

        if let Some(tracker) = tracker {
            Runtime::add_dependency(tracker, source);
        }
    }

    /// Get the dependencies collected in the current context.
    pub fn get_dependencies() -> Dependencies {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .map(|entry| entry.dependencies.clone())
                .unwrap_or_default()
        })
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        CONTEXT_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            if let Some(entry) = popped {
                debug_assert_eq!(
                    entry.tracker, self.tracker,
                    "ReactiveContext mismatch: expected {:?}, got {:?}",
                    self.tracker, entry.tracker
                );
            }
        });
    }
}

/// Run `f` without recording any cell reads as dependencies.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    let _ctx = ReactiveContext::untracked();
    f()
}
