//! Implementations of the time and randomness ports.
//!
//! `SystemClock` and `ThreadRngSource` are wired in production;
//! `FixedClock` and `FixedRandom` make billing windows reproducible in tests.

use std::sync::atomic::{AtomicU32, Ordering};

use rand::Rng;
use uuid::Uuid;

use crate::domain::foundation::Timestamp;
use crate::ports::{Clock, RandomSource};

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Thread-local RNG for charge minutes, UUID v4 for schedule payment ids.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngSource;

impl RandomSource for ThreadRngSource {
    fn charge_minute(&self) -> u32 {
        rand::thread_rng().gen_range(0..60)
    }

    fn schedule_payment_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

/// Fixed charge minute and sequential schedule payment ids
/// (`{prefix}_1`, `{prefix}_2`, ...).
#[derive(Debug)]
pub struct FixedRandom {
    minute: u32,
    prefix: String,
    issued: AtomicU32,
}

impl FixedRandom {
    pub fn new(minute: u32, prefix: impl Into<String>) -> Self {
        Self {
            minute,
            prefix: prefix.into(),
            issued: AtomicU32::new(0),
        }
    }
}

impl RandomSource for FixedRandom {
    fn charge_minute(&self) -> u32 {
        self.minute
    }

    fn schedule_payment_id(&self) -> String {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}_{}", self.prefix, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charge_minute_stays_in_range() {
        let source = ThreadRngSource;
        for _ in 0..500 {
            assert!(source.charge_minute() < 60);
        }
    }

    #[test]
    fn schedule_payment_ids_are_distinct() {
        let source = ThreadRngSource;
        assert_ne!(source.schedule_payment_id(), source.schedule_payment_id());
    }

    #[test]
    fn system_clock_tracks_wall_time() {
        let before = Timestamp::now();
        let now = SystemClock.now();
        assert!(!now.is_before(&before));
    }

    #[test]
    fn fixed_random_issues_sequential_ids() {
        let source = FixedRandom::new(15, "sched");
        assert_eq!(source.charge_minute(), 15);
        assert_eq!(source.schedule_payment_id(), "sched_1");
        assert_eq!(source.schedule_payment_id(), "sched_2");
    }
}
