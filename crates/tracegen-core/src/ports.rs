//! Port traits.
//!
//! Randomness is injected so handlers and the self-traffic generator can be
//! made deterministic under test.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};

/// Source of the random values behind simulated work and payloads.
pub trait RandomSource: Send + Sync {
    /// Uniform integer in `[low, high]`.
    fn int_in(&self, low: i64, high: i64) -> i64;

    /// Uniform float in `[low, high]`.
    fn float_in(&self, low: f64, high: f64) -> f64;

    /// Uniform index into a collection of `len` items, `None` when empty.
    fn index(&self, len: usize) -> Option<usize>;
}

/// Thread-local OS-seeded generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn int_in(&self, low: i64, high: i64) -> i64 {
        rand::thread_rng().gen_range(low..=high)
    }

    fn float_in(&self, low: f64, high: f64) -> f64 {
        rand::thread_rng().gen_range(low..=high)
    }

    fn index(&self, len: usize) -> Option<usize> {
        (len > 0).then(|| rand::thread_rng().gen_range(0..len))
    }
}

/// Reproducible generator for tests.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }
}

impl RandomSource for SeededRandom {
    fn int_in(&self, low: i64, high: i64) -> i64 {
        self.with_rng(|rng| rng.gen_range(low..=high))
    }

    fn float_in(&self, low: f64, high: f64) -> f64 {
        self.with_rng(|rng| rng.gen_range(low..=high))
    }

    fn index(&self, len: usize) -> Option<usize> {
        (len > 0).then(|| self.with_rng(|rng| rng.gen_range(0..len)))
    }
}
