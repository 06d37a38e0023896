//! Batched updates.
//!
//! Inside a batch, signal writes still mark dependents stale right away,
//! but queued effects wait until the outermost batch closes. An effect
//! touched by several writes then runs once.

use tracing::error;

use super::runtime::Runtime;
use crate::error::{ReactiveError, Result};

/// Closes the batch even if the body panics.
struct BatchGuard;

impl BatchGuard {
    fn enter() -> Self {
        Runtime::enter_batch();
        Self
    }
}

impl Drop for BatchGuard {
    fn drop(&mut self) {
        Runtime::exit_batch();
    }
}

/// Groups writes so dependent effects run once at the end.
///
/// ```rust
/// use cellgraph_core::reactive::{Batch, Effect, Signal};
///
/// let a = Signal::new(0);
/// let b = Signal::new(0);
/// let effect = {
///     let (a, b) = (a.clone(), b.clone());
///     Effect::new(move || {
///         a.get();
///         b.get();
///     })
/// };
///
/// Batch::run(|| {
///     a.set(1);
///     b.set(2);
/// });
/// assert_eq!(effect.run_count(), 2);
/// ```
pub struct Batch;

impl Batch {
    /// Run `f` as a batch. Flush failures are logged.
    pub fn run<R>(f: impl FnOnce() -> R) -> R {
        match Self::try_run(f) {
            Ok(value) => value,
            Err((value, err)) => {
                error!(%err, "batched flush failed");
                value
            }
        }
    }

    /// Run `f` as a batch and report flush failures along with its result.
    pub fn try_run<R>(f: impl FnOnce() -> R) -> std::result::Result<R, (R, ReactiveError)> {
        let value = {
            let _guard = BatchGuard::enter();
            f()
        };

        match Self::flush_if_outermost() {
            Ok(()) => Ok(value),
            Err(err) => Err((value, err)),
        }
    }

    fn flush_if_outermost() -> Result<()> {
        if Runtime::is_batching() {
            return Ok(());
        }
        Runtime::flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{Effect, Signal};

    #[test]
    fn batch_coalesces_effect_runs() {
        let signal = Signal::new(0);
        let effect = {
            let signal = signal.clone();
            Effect::new(move || {
                signal.get();
            })
        };

        Batch::run(|| {
            signal.set(1);
            signal.set(2);
            signal.set(3);
            assert_eq!(effect.run_count(), 1);
            assert!(effect.is_stale());
        });

        assert_eq!(effect.run_count(), 2);
        assert!(!effect.is_stale());
    }

    #[test]
    fn nested_batches_flush_once_at_the_end() {
        let signal = Signal::new(0);
        let effect = {
            let signal = signal.clone();
            Effect::new(move || {
                signal.get();
            })
        };

        Batch::run(|| {
            signal.set(1);
            Batch::run(|| signal.set(2));
            assert_eq!(effect.run_count(), 1);
            assert!(Runtime::is_batching());
        });

        assert!(!Runtime::is_batching());
        assert_eq!(effect.run_count(), 2);
    }

    #[test]
    fn batch_returns_body_value() {
        let signal = Signal::new(1);
        let value = Batch::run(|| {
            signal.set(2);
            signal.get() * 10
        });
        assert_eq!(value, 20);
    }

    #[test]
    fn panicking_batch_closes() {
        let result = std::panic::catch_unwind(|| Batch::run(|| panic!("boom")));
        assert!(result.is_err());
        assert!(!Runtime::is_batching());
    }
}
