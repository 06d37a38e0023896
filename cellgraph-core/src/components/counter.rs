//! Timer-driven counter.

use std::time::Duration;

use tracing::trace;

use crate::error::Result;
use crate::reactive::{Computed, Scope, Signal};

/// A counter that increments on a timer and exposes its doubled value.
///
/// The timer belongs to the counter: dropping the counter stops it.
#[derive(Debug)]
pub struct Counter {
    value: Signal<u64>,
    doubled: Computed<u64>,
    scope: Scope,
}

impl Counter {
    pub fn new() -> Self {
        let value = Signal::new(0);
        let doubled = {
            let value = value.clone();
            Computed::new(move || value.get() * 2)
        };

        Self {
            value,
            doubled,
            scope: Scope::new(),
        }
    }

    /// Current count.
    pub fn value(&self) -> u64 {
        self.value.get()
    }

    /// Twice the current count.
    pub fn doubled(&self) -> u64 {
        self.doubled.get()
    }

    /// The underlying signal, for renderers that want to subscribe.
    pub fn value_signal(&self) -> &Signal<u64> {
        &self.value
    }

    pub fn doubled_cell(&self) -> &Computed<u64> {
        &self.doubled
    }

    /// Increment once.
    pub fn tick(&self) {
        increment(&self.value);
    }

    /// Increment every `interval` on the current tokio runtime.
    ///
    /// The first increment happens one full interval after this call. A
    /// running timer is replaced, so the counter never ticks twice per period.
    pub fn start(&self, interval: Duration) -> Result<()> {
        self.scope.cancel_timers();
        let value = self.value.clone();
        self.scope.interval(interval, move || increment(&value))
    }

    /// Stop the timer. The count is kept.
    pub fn stop(&self) {
        self.scope.cancel_timers();
    }

    pub fn is_running(&self) -> bool {
        self.scope.timer_count() > 0
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self::new()
    }
}

fn increment(value: &Signal<u64>) {
    value.update(|v| v + 1);
    trace!(value = value.get_untracked(), "counter ticked");
}
