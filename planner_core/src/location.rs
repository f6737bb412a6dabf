//! Locations - one timezone per panel

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::time_engine::{parse_timezone, TimezoneError};

/// A location shown as one panel
///
/// Serializes as `{ "id": "Asia/Manila", "label": "Manila, Philippines" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LocationRecord", into = "LocationRecord")]
pub struct Location {
    pub timezone: Tz,
    pub label: String,
}

impl Location {
    pub fn new(timezone: Tz, label: impl Into<String>) -> Self {
        Self {
            timezone,
            label: label.into(),
        }
    }

    /// IANA id, which is also the uniqueness key of a location
    pub fn id(&self) -> &'static str {
        self.timezone.name()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LocationRecord {
    id: String,
    label: String,
}

impl TryFrom<LocationRecord> for Location {
    type Error = TimezoneError;

    fn try_from(record: LocationRecord) -> Result<Self, Self::Error> {
        Ok(Location::new(parse_timezone(&record.id)?, record.label))
    }
}

impl From<Location> for LocationRecord {
    fn from(location: Location) -> Self {
        LocationRecord {
            id: location.timezone.name().to_string(),
            label: location.label,
        }
    }
}
