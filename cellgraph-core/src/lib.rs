//! cellgraph Core
//!
//! This crate provides a small fine-grained reactivity runtime and two demo
//! components built on it. It implements:
//!
//! - Reactive primitives (signals, computed cells, effects)
//! - Dynamic dependency tracking and lazy staleness propagation
//! - Batched updates and owner scopes for effects and timers
//! - A timer-driven counter and a shopping cart
//!
//! # Architecture
//!
//! - `reactive`: cells, tracking context, runtime, batches and scopes
//! - `graph`: the dependency graph the runtime walks on every change
//! - `components`: the counter and shopping cart
//! - `config`: runtime limits and demo settings
//!
//! # Example
//!
//! ```rust
//! use cellgraph_core::reactive::{Computed, Effect, Signal};
//!
//! let count = Signal::new(0);
//!
//! let doubled = {
//!     let count = count.clone();
//!     Computed::new(move || count.get() * 2)
//! };
//!
//! let effect = {
//!     let (count, doubled) = (count.clone(), doubled.clone());
//!     Effect::new(move || {
//!         println!("Count: {}, Doubled: {}", count.get(), doubled.get());
//!     })
//! };
//!
//! count.set(5);
//! // The effect ran again and printed "Count: 5, Doubled: 10".
//! assert_eq!(effect.run_count(), 2);
//! assert_eq!(doubled.get(), 10);
//! ```

pub mod components;
pub mod config;
pub mod error;
pub mod graph;
pub mod reactive;

pub use config::{DemoConfig, RuntimeConfig};
pub use error::{CatalogError, ReactiveError, Result};
