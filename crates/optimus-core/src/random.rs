//! Randomness used for backoff jitter and synthetic price variation.

use std::sync::{Mutex, PoisonError};

/// Source of uniform samples in `[0, 1)`.
pub trait RandomSource: Send + Sync {
    fn unit(&self) -> f64;

    /// Uniform sample in `[low, high]`.
    fn uniform(&self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.unit()
    }
}

/// `fastrand`-backed source. Seed it for reproducible runs.
#[derive(Debug)]
pub struct FastrandSource {
    rng: Mutex<fastrand::Rng>,
}

impl FastrandSource {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::new()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::with_seed(seed)),
        }
    }
}

impl Default for FastrandSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for FastrandSource {
    fn unit(&self) -> f64 {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).f64()
    }
}

/// Always returns the same sample. Handy for pinning jitter in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom(pub f64);

impl RandomSource for FixedRandom {
    fn unit(&self) -> f64 {
        self.0.clamp(0.0, 1.0)
    }
}
