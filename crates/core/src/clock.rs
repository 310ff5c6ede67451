//! Monotonic millisecond clock and identifier generation.
//!
//! Creation timestamps double as ordering keys (`createdAt DESC`), so two
//! entities created within the same millisecond must still receive distinct
//! values. [`MonotonicClock`] hands out strictly increasing epoch
//! milliseconds: the wall clock when it has moved on, otherwise the previous
//! value plus one.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::error::CoreError;
use crate::types::{now_millis, EntityId, EpochMillis};

/// Strictly increasing epoch-millisecond source.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: AtomicI64,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the next tick, never equal to or below any tick handed out
    /// before (or any value passed to [`observe`](Self::observe)).
    ///
    /// Fails once the floor has reached `i64::MAX`.
    pub fn tick(&self) -> Result<EpochMillis, CoreError> {
        self.tick_at(now_millis())
    }

    /// Raise the floor so subsequent ticks are strictly above `value`.
    ///
    /// Used after loading persisted entities whose timestamps may be ahead
    /// of the local wall clock.
    pub fn observe(&self, value: EpochMillis) {
        self.last.fetch_max(value, Ordering::SeqCst);
    }

    fn tick_at(&self, wall: EpochMillis) -> Result<EpochMillis, CoreError> {
        let mut current = self.last.load(Ordering::SeqCst);
        loop {
            let bumped = current
                .checked_add(1)
                .ok_or_else(|| CoreError::Internal("monotonic clock exhausted".into()))?;
            let next = wall.max(bumped);
            match self
                .last
                .compare_exchange(current, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return Ok(next),
                Err(actual) => current = actual,
            }
        }
    }
}

/// Generate a fresh, time-ordered entity id (UUID v7).
pub fn new_entity_id() -> EntityId {
    uuid::Uuid::now_v7().to_string()
}
