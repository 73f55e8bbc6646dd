//! Readings - the published output of one scoring run

use crate::label::Label;
use crate::normalize::round1;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// Format of `updated_at` in reading files
pub const UPDATED_AT_FORMAT: &str = "%Y/%m/%d %H:%M";

/// At most this many factors are published
pub const MAX_FACTORS: usize = 2;

/// Offset the site reports times in (UTC+9)
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 9;

/// One scoring result, as written to `<key>.json` and `<key>_daily.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexReading {
    /// Score in [0, 100], one decimal
    pub value: f64,

    /// `round(value_new - value_prev, 1)`
    pub delta: f64,

    pub main_factors: Vec<String>,

    /// `YYYY/MM/DD HH:MM` in the index's local offset
    pub updated_at: String,

    pub label: Label,
}

impl IndexReading {
    /// Assemble a reading from unrounded before/after values
    pub fn new(
        prev: f64,
        value: f64,
        mut factors: Vec<String>,
        now: DateTime<FixedOffset>,
    ) -> Self {
        factors.truncate(MAX_FACTORS);
        Self {
            value: round1(value),
            delta: round1(value - prev),
            main_factors: factors,
            updated_at: now.format(UPDATED_AT_FORMAT).to_string(),
            label: Label::classify(value),
        }
    }
}

/// Fixed offset for `hours` east of UTC, if representable
pub fn utc_offset(hours: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(hours.checked_mul(3600)?)
}

/// Current time in the given offset
pub fn now_in(offset: FixedOffset) -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&offset)
}
