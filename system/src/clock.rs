use crate::types::Timestamp;
use chrono::{DurationRound, TimeZone, Utc};
use std::sync::Mutex;

pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<Timestamp>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn starting_at_epoch_millis(millis: i64) -> Self {
        Self::new(
            Utc.timestamp_millis_opt(millis)
                .single()
                .unwrap_or_else(Utc::now),
        )
    }

    pub fn advance_millis(&self, millis: i64) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now = *now + chrono::Duration::milliseconds(millis);
    }

    pub fn set(&self, to: Timestamp) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Millisecond precision, strictly after `previous`.
pub(crate) fn next_stamp(now: Timestamp, previous: Option<Timestamp>) -> Timestamp {
    let now = now
        .duration_trunc(chrono::Duration::milliseconds(1))
        .unwrap_or(now);
    match previous {
        Some(previous) if now <= previous => previous + chrono::Duration::milliseconds(1),
        _ => now,
    }
}
