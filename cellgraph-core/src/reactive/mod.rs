//! Reactive Primitives
//!
//! This module implements the reactive cell graph: signals, computed cells
//! and effects.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. When a signal's value is read
//! within a tracking context (a computed cell or effect), the reader becomes
//! a dependent. When the value changes, dependents are marked stale.
//!
//! ## Computed
//!
//! A Computed cell is a derived value that caches its result. It re-runs
//! its derivation only when read after one of its dependencies changed.
//!
//! ## Effects
//!
//! An Effect is a side-effecting computation that re-runs whenever its
//! dependencies change. Effects keep external systems in sync with the
//! graph: a renderer, a log, a socket.
//!
//! # Implementation Notes
//!
//! Dependencies are discovered at read time through a thread-local tracking
//! stack, and rebuilt on every run. Graphs may therefore change shape as
//! values change.

mod batch;
mod computed;
mod context;
mod effect;
mod runtime;
mod scope;
mod signal;

pub use batch::Batch;
pub use computed::Computed;
pub use context::{untracked, Dependencies, ReactiveContext};
pub use effect::Effect;
pub use runtime::{Reactive, ReactiveHandle, Runtime};
pub use scope::Scope;
pub use signal::Signal;
