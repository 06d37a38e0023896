//! Demo components built on the reactive cell graph.
//!
//! - [`Counter`]: a signal incremented by a timer, plus its doubled value.
//! - [`ShoppingCart`]: a list of products, its total, and a change log.

mod cart;
mod counter;

pub use cart::{CartObserver, Catalog, Product, RecordingObserver, ShoppingCart, TracingObserver};
pub use counter::Counter;
