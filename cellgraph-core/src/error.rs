//! Error types.

use thiserror::Error;

use crate::graph::NodeId;

/// Failures of the cell graph itself.
///
/// Panics raised inside user derivations or effect callbacks are not
/// wrapped; they unwind to whoever triggered the run.
#[derive(Debug, Error)]
pub enum ReactiveError {
    #[error("dependency cycle: computed {node} was read during its own derivation")]
    Cycle { node: NodeId },

    #[error("effect flush did not settle after {limit} runs")]
    FlushLimitExceeded { limit: usize },

    #[error("effect {node} has been disposed")]
    Disposed { node: NodeId },

    #[error("timer interval must be greater than zero")]
    ZeroInterval,

    #[error("no tokio runtime available to drive the timer")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

pub type Result<T> = std::result::Result<T, ReactiveError>;

/// Failures while loading a product catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog must contain at least one product")]
    Empty,

    #[error("invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("cannot read catalog: {0}")]
    Io(#[from] std::io::Error),
}
