use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Round to the two decimal places every figure in a schedule is reported at.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One day of weather input: a reference evapotranspiration proxy and rainfall.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyObservation {
    pub date: NaiveDate,
    /// Unadjusted ET₀ in mm/day. Never negative.
    pub et0_raw: f64,
    /// Rainfall in mm. Never negative.
    pub rain: f64,
}

impl DailyObservation {
    pub fn new(date: NaiveDate, et0_raw: f64, rain: f64) -> Self {
        Self {
            date,
            et0_raw,
            rain,
        }
    }
}

/// Inclusive calendar range `[start, end]`.
///
/// A range whose end precedes its start is empty rather than invalid, so a
/// reversed selection simply produces nothing to schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// Number of calendar days covered, both ends included.
    pub fn day_count(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            ((self.end - self.start).num_days() + 1) as usize
        }
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take(self.day_count())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Shorten the range to at most `max_days` days by pulling the end date in.
    ///
    /// Returns `None` when the range already fits.
    pub fn clamped_to(&self, max_days: usize) -> Option<DateRange> {
        if max_days == 0 || self.day_count() <= max_days {
            return None;
        }
        let end = self.start + Duration::days(max_days as i64 - 1);
        Some(DateRange::new(self.start, end))
    }
}
