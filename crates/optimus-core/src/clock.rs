//! Time source used by the cache and the normalizer.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::UtcDateTime;

/// Wall-clock abstraction so freshness can be tested without sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> UtcDateTime;
}

/// Reads the system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> UtcDateTime {
        UtcDateTime::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<UtcDateTime>,
}

impl ManualClock {
    pub fn new(start: UtcDateTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now = now.saturating_add(by);
    }

    pub fn set(&self, to: UtcDateTime) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> UtcDateTime {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
