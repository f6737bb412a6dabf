//! Time Engine - timezone lookup, live clock readings and label formatting
//!
//! Everything the panels need from the timezone database goes through here:
//! "current instant in zone X" and "format instant in zone X".

use chrono::{DateTime, Offset, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::location::Location;

/// AM/PM indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Meridiem {
    AM,
    PM,
}

impl Meridiem {
    pub fn from_hour(hour24: u32) -> Self {
        if hour24 < 12 {
            Meridiem::AM
        } else {
            Meridiem::PM
        }
    }

    /// Lowercase form used under timeline hour labels
    pub fn lowercase(&self) -> &'static str {
        match self {
            Meridiem::AM => "am",
            Meridiem::PM => "pm",
        }
    }
}

impl std::fmt::Display for Meridiem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Meridiem::AM => write!(f, "AM"),
            Meridiem::PM => write!(f, "PM"),
        }
    }
}

/// Error returned when a timezone id is not in the IANA database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimezoneError {
    pub id: String,
}

impl std::fmt::Display for TimezoneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid timezone: {}", self.id)
    }
}

impl std::error::Error for TimezoneError {}

/// A live clock reading for one panel header
#[derive(Debug, Clone)]
pub struct ClockReading {
    /// Hour in 12-hour format (1-12)
    pub hour12: u32,
    /// Hour in 24-hour format (0-23)
    pub hour24: u32,
    /// Minute (0-59)
    pub minute: u32,
    /// Second (0-59)
    pub second: u32,
    /// AM/PM indicator
    pub meridiem: Meridiem,
    /// UTC offset in minutes (e.g., -480 for UTC-8)
    pub utc_offset_minutes: i32,
    /// The raw DateTime for additional formatting needs
    pub local_datetime: DateTime<Tz>,
}

impl ClockReading {
    /// Format the clock as "h:mm AM"
    pub fn format_clock(&self) -> String {
        format!("{}:{:02} {}", self.hour12, self.minute, self.meridiem)
    }

    /// Format the offset as "GMT+8" or "GMT-3.5"
    pub fn format_gmt_offset(&self) -> String {
        format!("GMT{}", format_offset_hours(self.utc_offset_minutes))
    }

    /// Format the date as "27 Jan"
    pub fn format_short_date(&self) -> String {
        self.local_datetime.format("%-d %b").to_string()
    }
}

/// Read the clock for a given timezone at a specific instant
pub fn read_clock_at(tz: Tz, now_utc: DateTime<Utc>) -> ClockReading {
    let local = now_utc.with_timezone(&tz);

    let hour24 = local.hour();
    ClockReading {
        hour12: to_hour12(hour24),
        hour24,
        minute: local.minute(),
        second: local.second(),
        meridiem: Meridiem::from_hour(hour24),
        utc_offset_minutes: utc_offset_minutes(tz, now_utc),
        local_datetime: local,
    }
}

/// Convert a 24-hour value to the 12-hour dial (0 and 12 both read as 12)
pub fn to_hour12(hour24: u32) -> u32 {
    match hour24 {
        0 => 12,
        1..=12 => hour24,
        _ => hour24 - 12,
    }
}

/// Offset of `tz` from UTC at `instant`, in minutes
pub fn utc_offset_minutes(tz: Tz, instant: DateTime<Utc>) -> i32 {
    instant.with_timezone(&tz).offset().fix().local_minus_utc() / 60
}

/// Format an offset in minutes as signed hours: "+8", "-5", "+5.5", "+5.75"
pub fn format_offset_hours(offset_minutes: i32) -> String {
    let hours = offset_minutes as f64 / 60.0;
    if offset_minutes >= 0 {
        format!("+{}", hours)
    } else {
        format!("{}", hours)
    }
}

/// Convert absolute milliseconds into a UTC instant
pub fn instant_from_ms(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
}

/// Format absolute milliseconds as "h:mm AM" in the given zone
pub fn format_time_of_day(tz: Tz, ms: i64) -> String {
    match instant_from_ms(ms) {
        Some(instant) => instant.with_timezone(&tz).format("%-I:%M %p").to_string(),
        None => String::new(),
    }
}

/// Parse a timezone string into a Tz
pub fn parse_timezone(tz_str: &str) -> Result<Tz, TimezoneError> {
    tz_str.parse::<Tz>().map_err(|_| TimezoneError {
        id: tz_str.to_string(),
    })
}

/// Zones offered before the user types anything
pub const POPULAR_TIMEZONES: [&str; 14] = [
    "America/New_York",
    "America/Los_Angeles",
    "America/Chicago",
    "Europe/London",
    "Europe/Paris",
    "Europe/Berlin",
    "Asia/Tokyo",
    "Asia/Shanghai",
    "Asia/Singapore",
    "Asia/Dubai",
    "Asia/Kolkata",
    "Asia/Manila",
    "Australia/Sydney",
    "Pacific/Auckland",
];

/// Search timezones by name (case-insensitive partial match).
///
/// Underscores in zone names match spaces in the query, so "new york" finds
/// `America/New_York`. An empty query returns the popular zones.
pub fn search_timezones(query: &str) -> Vec<Tz> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return POPULAR_TIMEZONES
            .iter()
            .filter_map(|id| id.parse().ok())
            .collect();
    }
    chrono_tz::TZ_VARIANTS
        .iter()
        .filter(|tz| {
            let name = tz.name().to_lowercase();
            name.contains(&query) || name.replace('_', " ").contains(&query)
        })
        .copied()
        .collect()
}

/// Human label for a zone: "Manila, Asia", "Indiana, America" for deeper ids
pub fn zone_label(tz: Tz) -> String {
    let parts: Vec<String> = tz
        .name()
        .split('/')
        .map(|part| part.replace('_', " "))
        .collect();
    match parts.as_slice() {
        [region, city, ..] => format!("{}, {}", city, region),
        _ => tz.name().to_string(),
    }
}

/// Subtitle shown in search results: "Asia/Manila (GMT+8)"
pub fn zone_subtitle(tz: Tz, now_utc: DateTime<Utc>) -> String {
    format!(
        "{} (GMT{})",
        tz.name(),
        format_offset_hours(utc_offset_minutes(tz, now_utc))
    )
}

/// Build the location a search result adds when picked
pub fn location_for(tz: Tz) -> Location {
    Location::new(tz, zone_label(tz))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_read_clock_at() {
        let tz: Tz = "Asia/Manila".parse().unwrap();
        let now = Utc.with_ymd_and_hms(2025, 1, 27, 6, 5, 9).unwrap();
        let reading = read_clock_at(tz, now);
        assert_eq!(reading.hour24, 14);
        assert_eq!(reading.hour12, 2);
        assert_eq!(reading.meridiem, Meridiem::PM);
        assert_eq!(reading.format_clock(), "2:05 PM");
        assert_eq!(reading.format_gmt_offset(), "GMT+8");
        assert_eq!(reading.format_short_date(), "27 Jan");
    }

    #[test]
    fn test_format_offset_hours() {
        assert_eq!(format_offset_hours(0), "+0");
        assert_eq!(format_offset_hours(480), "+8");
        assert_eq!(format_offset_hours(-300), "-5");
        assert_eq!(format_offset_hours(330), "+5.5");
        assert_eq!(format_offset_hours(-210), "-3.5");
    }

    #[test]
    fn test_format_time_of_day() {
        let tz: Tz = "America/New_York".parse().unwrap();
        let ms = Utc
            .with_ymd_and_hms(2025, 1, 27, 3, 0, 0)
            .unwrap()
            .timestamp_millis();
        assert_eq!(format_time_of_day(tz, ms), "10:00 PM");
    }

    #[test]
    fn test_parse_timezone() {
        assert!(parse_timezone("Europe/London").is_ok());
        let err = parse_timezone("Mars/Olympus").unwrap_err();
        assert_eq!(err.to_string(), "Invalid timezone: Mars/Olympus");
    }

    #[test]
    fn test_search_timezones() {
        let results = search_timezones("new york");
        assert!(results.iter().any(|tz| tz.name() == "America/New_York"));

        let popular = search_timezones("  ");
        assert_eq!(popular.len(), POPULAR_TIMEZONES.len());
    }

    #[test]
    fn test_zone_label() {
        assert_eq!(zone_label(chrono_tz::Asia::Manila), "Manila, Asia");
        assert_eq!(zone_label(chrono_tz::America::Los_Angeles), "Los Angeles, America");
        assert_eq!(zone_label(chrono_tz::UTC), "UTC");
    }

    #[test]
    fn test_zone_subtitle() {
        let now = Utc.with_ymd_and_hms(2025, 1, 27, 0, 0, 0).unwrap();
        assert_eq!(
            zone_subtitle(chrono_tz::Asia::Manila, now),
            "Asia/Manila (GMT+8)"
        );
    }
}
