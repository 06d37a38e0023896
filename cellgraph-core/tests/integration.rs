//! Integration Tests for the Reactive System
//!
//! These tests verify that signals, computed cells and effects work together
//! through the public API.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;

use cellgraph_core::components::{Catalog, RecordingObserver, ShoppingCart};
use cellgraph_core::reactive::{Batch, Computed, Effect, Runtime, Scope, Signal};

/// After any sequence of writes, a computed cell reflects the final value.
#[test]
fn computed_matches_final_signal_value() {
    let signal = Signal::new(0i64);
    let derived = {
        let signal = signal.clone();
        Computed::new(move || signal.get() * 3 - 1)
    };

    let writes = [4, -2, 9, 9, 0, 17];
    for (index, value) in writes.iter().enumerate() {
        signal.set(*value);
        if index % 2 == 0 {
            assert_eq!(derived.get(), value * 3 - 1);
        }
    }

    assert_eq!(derived.get(), 17 * 3 - 1);
}

/// Two reads with no write in between derive once and agree.
#[test]
fn computed_cache_hit() {
    let derive_count = Arc::new(AtomicI32::new(0));
    let signal = Signal::new(vec![1, 2, 3]);

    let sum = {
        let (signal, derive_count) = (signal.clone(), derive_count.clone());
        Computed::new(move || {
            derive_count.fetch_add(1, Ordering::SeqCst);
            signal.with(|values| values.iter().sum::<i32>())
        })
    };

    let first = sum.get();
    let second = sum.get();
    assert_eq!(first, second);
    assert_eq!(derive_count.load(Ordering::SeqCst), 1);
}

/// An effect on a fresh signal runs exactly once at creation.
#[test]
fn effect_runs_once_on_creation() {
    let signal = Signal::new(0);
    let runs = Arc::new(AtomicI32::new(0));

    let effect = {
        let (signal, runs) = (signal.clone(), runs.clone());
        Effect::new(move || {
            signal.get();
            runs.fetch_add(1, Ordering::SeqCst);
        })
    };

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(effect.run_count(), 1);
}

/// Signal 0, set(1), doubled reads 2.
#[test]
fn doubled_after_one_set() {
    let signal = Signal::new(0);
    let doubled = {
        let signal = signal.clone();
        Computed::new(move || signal.get() * 2)
    };

    signal.set(1);
    assert_eq!(doubled.get(), 2);
}

/// Computed cells can depend on other computed cells.
#[test]
fn computed_depends_on_computed() {
    let base = Signal::new(5);

    let doubled = {
        let base = base.clone();
        Computed::new(move || base.get() * 2)
    };
    let plus_ten = {
        let doubled = doubled.clone();
        Computed::new(move || doubled.get() + 10)
    };

    assert_eq!(plus_ten.get(), 20);

    base.set(10);
    assert!(doubled.is_stale());
    assert!(plus_ten.is_stale());

    assert_eq!(plus_ten.get(), 30);
    assert_eq!(doubled.get(), 20);
}

/// A diamond-shaped graph runs its effect once per write.
#[test]
fn diamond_runs_effect_once() {
    let base = Signal::new(1);
    let left = {
        let base = base.clone();
        Computed::new(move || base.get() + 1)
    };
    let right = {
        let base = base.clone();
        Computed::new(move || base.get() * 10)
    };
    let seen = Arc::new(Mutex::new(Vec::new()));

    let effect = {
        let (left, right, seen) = (left.clone(), right.clone(), seen.clone());
        Effect::new(move || seen.lock().push(left.get() + right.get()))
    };

    base.set(2);
    assert_eq!(effect.run_count(), 2);
    assert_eq!(*seen.lock(), vec![12, 23]);
}

/// A batch of writes reruns dependent effects once.
#[test]
fn batch_coalesces_writes() {
    let first = Signal::new(String::from("Ada"));
    let last = Signal::new(String::from("Lovelace"));
    let seen = Arc::new(Mutex::new(Vec::new()));

    let _effect = {
        let (first, last, seen) = (first.clone(), last.clone(), seen.clone());
        Effect::new(move || seen.lock().push(format!("{} {}", first.get(), last.get())))
    };

    Batch::run(|| {
        first.set(String::from("Grace"));
        last.set(String::from("Hopper"));
    });

    assert_eq!(*seen.lock(), vec!["Ada Lovelace", "Grace Hopper"]);
    assert_eq!(Runtime::pending_count(), 0);
}

/// A disposed scope releases its effects.
#[test]
fn scope_teardown_stops_effects() {
    let signal = Signal::new(0);
    let runs = Arc::new(AtomicI32::new(0));

    let scope = Scope::new();
    {
        let (signal, runs) = (signal.clone(), runs.clone());
        scope.effect(move || {
            signal.get();
            runs.fetch_add(1, Ordering::SeqCst);
        });
    }

    signal.set(1);
    drop(scope);
    signal.set(2);

    assert_eq!(runs.load(Ordering::SeqCst), 2);
    assert_eq!(signal.subscriber_count(), 0);
}

/// One add puts exactly one catalog product in the cart.
#[test]
fn cart_single_add() {
    let observer = Arc::new(RecordingObserver::new());
    let cart = ShoppingCart::new(Catalog::default(), observer.clone());

    let picked = cart.add_to_cart();

    let items = cart.items();
    assert_eq!(items.len(), 1);
    assert!(Catalog::default().products().contains(&items[0]));
    assert_eq!(items[0], picked);
    assert_eq!(cart.total(), u64::from(picked.price));
}

/// Three adds: total is the sum and the last logged list has three items.
#[test]
fn cart_three_adds() {
    let observer = Arc::new(RecordingObserver::new());
    let cart = ShoppingCart::new(Catalog::default(), observer.clone());
    let mut rng = StdRng::seed_from_u64(2024);

    let mut expected = 0u64;
    for _ in 0..3 {
        expected += u64::from(cart.add_to_cart_with(&mut rng).price);
    }

    assert_eq!(cart.total(), expected);
    assert_eq!(observer.last().map(|items| items.len()), Some(3));
}

/// Reading the total repeatedly without writes returns the same value.
#[test]
fn cart_total_is_stable() {
    let cart = ShoppingCart::new(Catalog::default(), Arc::new(RecordingObserver::new()));
    let mut rng = StdRng::seed_from_u64(1);
    cart.add_to_cart_with(&mut rng);
    cart.add_to_cart_with(&mut rng);

    let first = cart.total();
    for _ in 0..10 {
        assert_eq!(cart.total(), first);
    }
    assert_eq!(cart.total_cell().recompute_count(), 1);
}
