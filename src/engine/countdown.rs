//! Countdown to a server-issued deadline.
//!
//! Remaining time is always recomputed from the clock rather than
//! decremented, so a stalled ticker never drifts.

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

/// Source of the current wall-clock time.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.lock() = at;
    }

    /// Move the clock. An advance past chrono's range leaves it unchanged.
    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.lock();
        match now.checked_add_signed(by) {
            Some(next) => *now = next,
            None => warn!(?by, "ManualClock advance out of range, ignored"),
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.lock()
    }
}

/// Emitted by [`CountdownTimer::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEvent {
    Tick { remaining_secs: u64 },
    /// Reported once per deadline; the timer then yields nothing until the
    /// deadline moves later.
    Expired,
}

#[derive(Debug, Clone, Default)]
pub struct CountdownTimer {
    deadline: Option<DateTime<Utc>>,
    expired: bool,
}

impl CountdownTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: DateTime<Utc>) -> Self {
        Self {
            deadline: Some(deadline),
            expired: false,
        }
    }

    /// Record the server's deadline. Moving it later re-arms an expired timer.
    pub fn set_deadline(&mut self, deadline: DateTime<Utc>) {
        if self.deadline.is_some_and(|current| deadline > current) {
            self.expired = false;
        }
        self.deadline = Some(deadline);
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    /// Whole seconds left, clamped at zero. `None` until a deadline is known.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> Option<u64> {
        self.deadline
            .map(|deadline| (deadline - now).num_seconds().max(0) as u64)
    }

    /// True once the deadline is reached or expiry has already been signalled.
    pub fn has_passed(&self, now: DateTime<Utc>) -> bool {
        self.expired || self.deadline.is_some_and(|deadline| now >= deadline)
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Advance the countdown to `now`.
    ///
    /// Returns `None` before a deadline is known and after expiry.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<CountdownEvent> {
        if self.expired {
            return None;
        }
        let remaining_secs = self.remaining_secs(now)?;
        if remaining_secs == 0 {
            self.expired = true;
            Some(CountdownEvent::Expired)
        } else {
            Some(CountdownEvent::Tick { remaining_secs })
        }
    }
}
