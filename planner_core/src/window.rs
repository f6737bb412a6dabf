//! Shared UTC window and the selected range
//!
//! Every panel receives the same `UtcWindow` and `SelectedRange` values, which
//! is what keeps independently drawn timelines aligned.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Number of hour slots in a timeline (24 hours plus the next midnight)
pub const SLOT_COUNT: usize = 25;

/// One hour in milliseconds
pub const HOUR_MS: i64 = 60 * 60 * 1000;

/// The 25-hour absolute interval shared by all panels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtcWindow {
    /// Midnight UTC of the selected date, in milliseconds
    pub start_ms: i64,
    /// `start_ms` plus 25 hours
    pub end_ms: i64,
}

impl UtcWindow {
    /// Window anchored at the UTC midnight of `date`
    pub fn for_date(date: NaiveDate) -> Self {
        let start_ms = date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp_millis();
        Self::starting_at(start_ms)
    }

    pub fn starting_at(start_ms: i64) -> Self {
        Self {
            start_ms,
            end_ms: start_ms.saturating_add(SLOT_COUNT as i64 * HOUR_MS),
        }
    }

    pub fn duration_ms(&self) -> i64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    /// Absolute start of slot `index`
    pub fn slot_start_ms(&self, index: usize) -> i64 {
        self.start_ms.saturating_add(index as i64 * HOUR_MS)
    }

    pub fn slot_start(&self, index: usize) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.slot_start_ms(index))
    }

    /// Unclamped position of `time_ms` within the window, in percent
    pub fn percent_of(&self, time_ms: i64) -> f64 {
        // Multiply before dividing so whole-hour offsets come out exact
        let offset = time_ms as i128 - self.start_ms as i128;
        offset as f64 * 100.0 / self.duration_ms() as f64
    }

    /// Absolute range covered by the inclusive slot span `a..=b` (any order)
    pub fn range_for_slots(&self, a: usize, b: usize) -> Option<SelectedRange> {
        let lo = a.min(b);
        let hi = a.max(b);
        SelectedRange::new(self.slot_start_ms(lo), self.slot_start_ms(hi + 1))
    }
}

/// The single selected meeting range, in absolute UTC milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedRange {
    pub start_utc: i64,
    pub end_utc: i64,
}

impl SelectedRange {
    /// Returns `None` unless `start_utc < end_utc`
    pub fn new(start_utc: i64, end_utc: i64) -> Option<Self> {
        (start_utc < end_utc).then_some(Self { start_utc, end_utc })
    }

    pub fn duration_ms(&self) -> i64 {
        self.end_utc.saturating_sub(self.start_utc)
    }

    /// Both ends are instants chrono can represent
    pub fn is_representable(&self) -> bool {
        DateTime::from_timestamp_millis(self.start_utc).is_some()
            && DateTime::from_timestamp_millis(self.end_utc).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_window_for_date() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 27).unwrap();
        let window = UtcWindow::for_date(date);
        let midnight = Utc.with_ymd_and_hms(2025, 1, 27, 0, 0, 0).unwrap();
        assert_eq!(window.start_ms, midnight.timestamp_millis());
        assert_eq!(window.end_ms - window.start_ms, 25 * HOUR_MS);
    }

    #[test]
    fn test_range_for_slots() {
        let window = UtcWindow::starting_at(0);
        let range = window.range_for_slots(7, 3).unwrap();
        assert_eq!(range.start_utc, 3 * HOUR_MS);
        assert_eq!(range.end_utc, 8 * HOUR_MS);

        let single = window.range_for_slots(24, 24).unwrap();
        assert_eq!(single.duration_ms(), HOUR_MS);
        assert_eq!(single.end_utc, window.end_ms);
    }

    #[test]
    fn test_selected_range_requires_order() {
        assert!(SelectedRange::new(10, 10).is_none());
        assert!(SelectedRange::new(10, 5).is_none());
        assert!(SelectedRange::new(5, 10).is_some());
    }

    #[test]
    fn test_extreme_values_do_not_overflow() {
        let window = UtcWindow::starting_at(0);
        assert_eq!(window.percent_of(i64::MIN), i64::MIN as f64 * 100.0 / (25 * HOUR_MS) as f64);
        assert!(window.percent_of(i64::MAX) > 100.0);

        let huge = SelectedRange::new(-i64::MAX, i64::MAX).unwrap();
        assert_eq!(huge.duration_ms(), i64::MAX);
        assert!(!huge.is_representable());
        assert!(SelectedRange::new(0, HOUR_MS).unwrap().is_representable());

        let late = UtcWindow::starting_at(i64::MAX - HOUR_MS);
        assert_eq!(late.end_ms, i64::MAX);
    }

    #[test]
    fn test_selected_range_json_shape() {
        let range = SelectedRange::new(1, 2).unwrap();
        let json = serde_json::to_string(&range).unwrap();
        assert_eq!(json, r#"{"startUtc":1,"endUtc":2}"#);
    }
}
