//! Billing window arithmetic.
//!
//! Pure functions: the caller supplies `now` and the charge minute, so the
//! results are deterministic under test.

use chrono::{Duration, NaiveTime};

use crate::domain::foundation::Timestamp;

/// Length of one paid period.
pub const PERIOD_DAYS: i64 = 30;

/// Grace after the nominal end while the next charge is expected to clear.
pub const GRACE_DAYS: i64 = 1;

/// Hour (UTC) on the grace day at which the next charge is scheduled.
pub const CHARGE_HOUR: u32 = 10;

/// Half-width of the window used to look up a pending schedule.
pub const SCHEDULE_SEARCH_MARGIN_DAYS: i64 = 1;

/// One billing period and the time its successor is charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingPeriod {
    pub start_at: Timestamp,
    pub end_at: Timestamp,
    pub end_grace_at: Timestamp,
    pub next_schedule_at: Timestamp,
}

impl BillingPeriod {
    /// Period starting at `now`.
    ///
    /// `next_schedule_at` lands on the grace day at `CHARGE_HOUR:charge_minute:00`.
    /// Minutes outside `0..60` wrap.
    pub fn starting_at(now: Timestamp, charge_minute: u32) -> Self {
        let end_at = now.add_days(PERIOD_DAYS);
        let end_grace_at = end_at.add_days(GRACE_DAYS);
        let charge_time = NaiveTime::MIN
            + Duration::minutes(i64::from(CHARGE_HOUR * 60 + charge_minute % 60));

        Self {
            start_at: now,
            end_at,
            end_grace_at,
            next_schedule_at: end_grace_at.at_time_of_day(charge_time),
        }
    }
}

/// Time window used to find the gateway schedule created for a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleSearchWindow {
    pub from: Timestamp,
    pub until: Timestamp,
}

impl ScheduleSearchWindow {
    /// `[next_schedule_at - 1 day, next_schedule_at + 1 day]`.
    pub fn around(next_schedule_at: Timestamp) -> Self {
        Self {
            from: next_schedule_at.minus_days(SCHEDULE_SEARCH_MARGIN_DAYS),
            until: next_schedule_at.add_days(SCHEDULE_SEARCH_MARGIN_DAYS),
        }
    }

    pub fn contains(&self, at: Timestamp) -> bool {
        self.from <= at && at <= self.until
    }
}
