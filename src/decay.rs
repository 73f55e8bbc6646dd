//! Decay - relaxing the score toward the neutral baseline
//!
//! Each invocation closes a fraction `rate` of the gap between the previous
//! value and the baseline:
//!
//! ```text
//! cooled = prev * (1 - rate) + baseline * rate
//! ```
//!
//! The rate itself comes from a [`CalendarPolicy`]: quiet calendar days
//! (weekends, holidays) cool faster because no new information is expected.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Neutral resting value of the index
pub const BASELINE: f64 = 50.0;

/// Pulls a value toward a fixed baseline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecayModel {
    pub baseline: f64,
}

impl Default for DecayModel {
    fn default() -> Self {
        Self { baseline: BASELINE }
    }
}

impl DecayModel {
    pub fn new(baseline: f64) -> Self {
        Self { baseline }
    }

    /// Apply one decay step. `rate` is clamped to [0, 1] so the step can never
    /// overshoot the baseline.
    pub fn apply(&self, prev: f64, rate: f64) -> f64 {
        let rate = if rate.is_finite() { rate.clamp(0.0, 1.0) } else { 0.0 };
        prev * (1.0 - rate) + self.baseline * rate
    }
}

/// Chooses the decay rate for a calendar date
pub trait CalendarPolicy {
    fn rate_for(&self, date: NaiveDate) -> f64;
}

impl<F> CalendarPolicy for F
where
    F: Fn(NaiveDate) -> f64,
{
    fn rate_for(&self, date: NaiveDate) -> f64 {
        self(date)
    }
}

/// Same rate every day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedRate(pub f64);

impl CalendarPolicy for FixedRate {
    fn rate_for(&self, _date: NaiveDate) -> f64 {
        self.0
    }
}

/// Weekday/weekend policy: Saturday and Sunday are quiet days
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeekendPolicy {
    pub weekday_rate: f64,
    pub quiet_rate: f64,
}

impl Default for WeekendPolicy {
    fn default() -> Self {
        Self {
            weekday_rate: 0.05,
            quiet_rate: 0.08,
        }
    }
}

impl WeekendPolicy {
    pub fn new(weekday_rate: f64, quiet_rate: f64) -> Self {
        Self {
            weekday_rate,
            quiet_rate,
        }
    }
}

impl CalendarPolicy for WeekendPolicy {
    fn rate_for(&self, date: NaiveDate) -> f64 {
        if is_weekend(date) {
            self.quiet_rate
        } else {
            self.weekday_rate
        }
    }
}

/// Saturday or Sunday
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Adds market holidays on top of another policy
#[derive(Debug, Clone)]
pub struct HolidayCalendar<P> {
    inner: P,
    holidays: BTreeSet<NaiveDate>,
    holiday_rate: f64,
}

impl<P: CalendarPolicy> HolidayCalendar<P> {
    pub fn new(inner: P, holiday_rate: f64) -> Self {
        Self {
            inner,
            holidays: BTreeSet::new(),
            holiday_rate,
        }
    }

    pub fn with_holidays(mut self, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.holidays.extend(dates);
        self
    }

    pub fn add_holiday(&mut self, date: NaiveDate) {
        self.holidays.insert(date);
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }
}

impl<P: CalendarPolicy> CalendarPolicy for HolidayCalendar<P> {
    fn rate_for(&self, date: NaiveDate) -> f64 {
        if self.is_holiday(date) {
            self.holiday_rate
        } else {
            self.inner.rate_for(date)
        }
    }
}
