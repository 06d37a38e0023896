//! Ownership scopes.
//!
//! A [`Scope`] owns the effects and timers of one component. Disposing the
//! scope, or dropping it, disposes every effect and aborts every timer it
//! holds, so nothing outlives the component that created it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

use super::effect::Effect;
use crate::error::{ReactiveError, Result};

/// Owner of effects and timers.
#[derive(Default)]
pub struct Scope {
    effects: Mutex<Vec<Effect>>,
    timers: Mutex<Vec<JoinHandle<()>>>,
    disposed: AtomicBool,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an effect owned by this scope.
    pub fn effect<F>(&self, callback: F) -> Effect
    where
        F: Fn() + Send + Sync + 'static,
    {
        let effect = Effect::new(callback);
        self.adopt(effect.clone());
        effect
    }

    /// Take ownership of an existing effect.
    ///
    /// Adopting into a disposed scope disposes the effect immediately.
    pub fn adopt(&self, effect: Effect) {
        if self.is_disposed() {
            effect.dispose();
            return;
        }
        self.effects.lock().push(effect);
    }

    /// Call `tick` every `period` on the current tokio runtime.
    ///
    /// The first call happens one full period after spawning. The timer
    /// runs until the scope is disposed.
    pub fn interval<F>(&self, period: Duration, mut tick: F) -> Result<()>
    where
        F: FnMut() + Send + 'static,
    {
        if period.is_zero() {
            return Err(ReactiveError::ZeroInterval);
        }
        let runtime = Handle::try_current()?;

        let task = runtime.spawn(async move {
            let mut ticks = time::interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                tick();
            }
        });

        if self.is_disposed() {
            task.abort();
            return Ok(());
        }
        self.timers.lock().push(task);
        debug!(?period, "interval started");
        Ok(())
    }

    /// Abort every timer without touching the effects.
    pub fn cancel_timers(&self) {
        for task in self.timers.lock().drain(..) {
            task.abort();
        }
    }

    /// Release everything the scope owns.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }

        self.cancel_timers();

        let effects = std::mem::take(&mut *self.effects.lock());
        let released = effects.len();
        for effect in effects {
            effect.dispose();
        }

        debug!(effects = released, "scope disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    pub fn effect_count(&self) -> usize {
        self.effects.lock().len()
    }

    pub fn timer_count(&self) -> usize {
        self.timers.lock().len()
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("effects", &self.effect_count())
            .field("timers", &self.timer_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Signal;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn dispose_releases_effects() {
        let signal = Signal::new(0);
        let scope = Scope::new();

        let effect = {
            let signal = signal.clone();
            scope.effect(move || {
                signal.get();
            })
        };
        assert_eq!(scope.effect_count(), 1);

        scope.dispose();
        assert!(effect.is_disposed());
        assert_eq!(scope.effect_count(), 0);

        signal.set(1);
        assert_eq!(effect.run_count(), 1);
    }

    #[test]
    fn drop_releases_effects() {
        let signal = Signal::new(0);
        let effect = {
            let scope = Scope::new();
            let signal = signal.clone();
            scope.effect(move || {
                signal.get();
            })
        };

        assert!(effect.is_disposed());
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn adopt_into_disposed_scope() {
        let scope = Scope::new();
        scope.dispose();

        let effect = Effect::new(|| {});
        scope.adopt(effect.clone());
        assert!(effect.is_disposed());
    }

    #[test]
    fn interval_requires_runtime() {
        let scope = Scope::new();
        let result = scope.interval(Duration::from_millis(10), || {});
        assert!(matches!(result, Err(ReactiveError::NoRuntime(_))));
    }

    #[test]
    fn interval_rejects_zero_period() {
        let scope = Scope::new();
        let result = scope.interval(Duration::ZERO, || {});
        assert!(matches!(result, Err(ReactiveError::ZeroInterval)));
    }

    #[tokio::test(start_paused = true)]
    async fn interval_ticks_until_disposed() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let scope = Scope::new();

        {
            let ticks = ticks.clone();
            scope
                .interval(Duration::from_millis(100), move || {
                    ticks.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }
        assert_eq!(scope.timer_count(), 1);

        time::sleep(Duration::from_millis(350)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);

        scope.dispose();
        time::sleep(Duration::from_millis(500)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
    }
}
