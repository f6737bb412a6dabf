//! Slot model - the 25 hour slots of one timezone's timeline
//!
//! Slot `i` is the absolute instant `window.start + i hours` seen from the
//! panel's timezone. Building slots is a pure function of the window, the
//! zone and the availability pattern.

use chrono::Timelike;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::time_engine::{to_hour12, Meridiem};
use crate::window::{UtcWindow, SLOT_COUNT};

/// Availability of a local hour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Available,
    Limited,
    Unavailable,
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Availability::Available => write!(f, "available"),
            Availability::Limited => write!(f, "limited"),
            Availability::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Availability by local hour (0-23)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilityPattern([Availability; 24]);

impl AvailabilityPattern {
    pub fn new(hours: [Availability; 24]) -> Self {
        Self(hours)
    }

    /// Build from a list that must hold exactly 24 entries
    pub fn from_slice(hours: &[Availability]) -> Option<Self> {
        <[Availability; 24]>::try_from(hours).ok().map(Self)
    }

    pub fn at(&self, local_hour: u32) -> Availability {
        self.0
            .get(local_hour as usize)
            .copied()
            .unwrap_or(Availability::Unavailable)
    }
}

impl Default for AvailabilityPattern {
    /// Mock pattern: mornings available, afternoons and evenings limited,
    /// nights unavailable
    fn default() -> Self {
        let mut hours = [Availability::Unavailable; 24];
        for (hour, slot) in hours.iter_mut().enumerate() {
            *slot = match hour {
                8..=12 => Availability::Available,
                13..=23 => Availability::Limited,
                _ => Availability::Unavailable,
            };
        }
        Self(hours)
    }
}

/// One hour column of a timeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    /// Position in the window (0-24)
    pub index: usize,
    /// Local hour in the panel's zone (0-23)
    pub local_hour: u32,
    /// "3" for hour slots, "TUE JAN 28" for day boundaries
    pub label: String,
    pub meridiem: Meridiem,
    /// Local calendar date differs from the previous slot's
    pub is_day_boundary: bool,
    pub availability: Availability,
}

impl Slot {
    /// Tooltip text such as "3 pm: limited"
    pub fn describe(&self) -> String {
        format!(
            "{} {}: {}",
            to_hour12(self.local_hour),
            self.meridiem.lowercase(),
            self.availability
        )
    }
}

/// Build the 25 slots of `window` as seen from `tz`
pub fn build_slots(window: &UtcWindow, tz: Tz, availability: &AvailabilityPattern) -> Vec<Slot> {
    let mut slots = Vec::with_capacity(SLOT_COUNT);
    let mut prev_date = None;

    for index in 0..SLOT_COUNT {
        let Some(instant) = window.slot_start(index) else {
            continue;
        };
        let local = instant.with_timezone(&tz);
        let local_hour = local.hour();
        let date = local.date_naive();

        let is_day_boundary = prev_date.is_some_and(|prev| prev != date);
        prev_date = Some(date);

        let label = if is_day_boundary {
            local.format("%a %b %-d").to_string().to_uppercase()
        } else {
            to_hour12(local_hour).to_string()
        };

        slots.push(Slot {
            index,
            local_hour,
            label,
            meridiem: Meridiem::from_hour(local_hour),
            is_day_boundary,
            availability: availability.at(local_hour),
        });
    }

    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn window() -> UtcWindow {
        UtcWindow::for_date(NaiveDate::from_ymd_opt(2025, 1, 27).unwrap())
    }

    #[test]
    fn test_build_slots_is_deterministic() {
        let tz: Tz = "America/Los_Angeles".parse().unwrap();
        let pattern = AvailabilityPattern::default();
        let first = build_slots(&window(), tz, &pattern);
        let second = build_slots(&window(), tz, &pattern);
        assert_eq!(first.len(), SLOT_COUNT);
        assert_eq!(first, second);
    }

    #[test]
    fn test_utc_slots_cross_midnight_at_last_slot() {
        let slots = build_slots(&window(), chrono_tz::UTC, &AvailabilityPattern::default());
        assert!(!slots[0].is_day_boundary);
        assert_eq!(slots[0].label, "12");
        assert_eq!(slots[0].meridiem, Meridiem::AM);
        assert_eq!(slots[13].label, "1");
        assert_eq!(slots[13].meridiem, Meridiem::PM);
        assert!(slots[24].is_day_boundary);
        assert_eq!(slots[24].label, "TUE JAN 28");
        assert_eq!(slots.iter().filter(|slot| slot.is_day_boundary).count(), 1);
    }

    #[test]
    fn test_manila_slots_shift_local_hours() {
        // Manila is UTC+8: slot 0 is 8 am local, midnight falls on slot 16
        let slots = build_slots(&window(), chrono_tz::Asia::Manila, &AvailabilityPattern::default());
        assert_eq!(slots[0].local_hour, 8);
        assert_eq!(slots[0].availability, Availability::Available);
        assert_eq!(slots[5].local_hour, 13);
        assert_eq!(slots[5].availability, Availability::Limited);
        assert!(slots[..16].iter().all(|slot| !slot.is_day_boundary));
        assert!(slots[16].is_day_boundary);
        assert_eq!(slots[16].local_hour, 0);
        assert_eq!(slots[16].availability, Availability::Unavailable);
    }

    #[test]
    fn test_default_availability_pattern() {
        let pattern = AvailabilityPattern::default();
        assert_eq!(pattern.at(7), Availability::Unavailable);
        assert_eq!(pattern.at(8), Availability::Available);
        assert_eq!(pattern.at(12), Availability::Available);
        assert_eq!(pattern.at(13), Availability::Limited);
        assert_eq!(pattern.at(23), Availability::Limited);
        assert_eq!(pattern.at(99), Availability::Unavailable);
    }

    #[test]
    fn test_pattern_from_slice_requires_24() {
        assert!(AvailabilityPattern::from_slice(&[Availability::Limited; 23]).is_none());
        let pattern = AvailabilityPattern::from_slice(&[Availability::Limited; 24]).unwrap();
        assert_eq!(pattern.at(3), Availability::Limited);
    }

    #[test]
    fn test_slot_describe() {
        let slots = build_slots(&window(), chrono_tz::UTC, &AvailabilityPattern::default());
        assert_eq!(slots[15].describe(), "3 pm: limited");
    }
}
