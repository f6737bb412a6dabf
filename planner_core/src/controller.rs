//! Controller - owner of the shared window, locations and selection
//!
//! The controller is the single writer of the selected range. Panels never
//! see each other; they get `PanelProps` from here and report back with
//! `PanelMessage`s.

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::clock::Ticker;
use crate::gesture::{GestureEvent, StripGeometry};
use crate::location::Location;
use crate::panel::{Panel, PanelMessage, PanelProps, PanelResponse, PanelSettings, PanelView};
use crate::store::StateStore;
use crate::window::{SelectedRange, UtcWindow};

/// Store key of the selected date ("2025-01-27")
pub const KEY_SELECTED_DATE: &str = "selectedDate";
/// Store key of the location list
pub const KEY_LOCATIONS: &str = "locations";
/// Store key of the selected range
pub const KEY_SELECTED_RANGE: &str = "selectedRange";

/// Keys that make up a share link
pub const SHARED_KEYS: [&str; 3] = [KEY_SELECTED_DATE, KEY_LOCATIONS, KEY_SELECTED_RANGE];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Error for date input that is not `YYYY-MM-DD`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateParseError {
    pub input: String,
}

impl std::fmt::Display for DateParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid date: {:?}", self.input)
    }
}

impl std::error::Error for DateParseError {}

/// A one-click date choice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickDate {
    pub date: NaiveDate,
    /// "Jan 27"
    pub label: String,
    /// "Today", "Tomorrow" or the weekday
    pub sub_label: String,
}

/// Today, tomorrow and the day after
pub fn quick_dates(today: NaiveDate) -> Vec<QuickDate> {
    (0..3u64)
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .enumerate()
        .map(|(offset, date)| QuickDate {
            date,
            label: date.format("%b %-d").to_string(),
            sub_label: match offset {
                0 => "Today".to_string(),
                1 => "Tomorrow".to_string(),
                _ => date.weekday().to_string(),
            },
        })
        .collect()
}

pub fn parse_date(input: &str) -> Result<NaiveDate, DateParseError> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).map_err(|_| DateParseError {
        input: input.to_string(),
    })
}

pub struct Controller {
    selected_date: NaiveDate,
    window: UtcWindow,
    panels: Vec<Panel>,
    selected: Option<SelectedRange>,
    ticker: Ticker,
    settings: PanelSettings,
}

impl Controller {
    /// Build a controller; duplicate locations are dropped
    pub fn new(
        selected_date: NaiveDate,
        locations: impl IntoIterator<Item = Location>,
        settings: PanelSettings,
        now: DateTime<Utc>,
    ) -> Self {
        let mut controller = Self {
            selected_date,
            window: UtcWindow::for_date(selected_date),
            panels: Vec::new(),
            selected: None,
            ticker: Ticker::new(),
            settings,
        };
        for location in locations {
            controller.add_location_at(location, now);
        }
        controller
    }

    /// Rebuild from persisted state, using `fallback` for anything missing
    pub fn restore<S: StateStore + ?Sized>(
        store: &S,
        fallback_locations: &[Location],
        settings: PanelSettings,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Self {
        let date = read_key::<String, _>(store, KEY_SELECTED_DATE)
            .and_then(|s| parse_date(&s).ok())
            .unwrap_or(today);
        let locations = read_key::<Vec<Location>, _>(store, KEY_LOCATIONS)
            .filter(|locations| !locations.is_empty())
            .unwrap_or_else(|| fallback_locations.to_vec());

        let mut controller = Self::new(date, locations, settings, now);
        controller.selected = read_key::<Option<SelectedRange>, _>(store, KEY_SELECTED_RANGE)
            .flatten()
            .and_then(|r| SelectedRange::new(r.start_utc, r.end_utc))
            .filter(|r| {
                let ok = r.is_representable();
                if !ok {
                    warn!(start = r.start_utc, end = r.end_utc, "Ignoring out-of-range selection");
                }
                ok
            });
        controller
    }

    /// Write the shareable state into `store`
    pub fn persist<S: StateStore + ?Sized>(&self, store: &mut S) {
        let locations: Vec<&Location> = self.panels.iter().map(Panel::location).collect();
        let entries = [
            (
                KEY_SELECTED_DATE,
                serde_json::to_string(&self.selected_date.format(DATE_FORMAT).to_string()),
            ),
            (KEY_LOCATIONS, serde_json::to_string(&locations)),
            (KEY_SELECTED_RANGE, serde_json::to_string(&self.selected)),
        ];
        for (key, value) in entries {
            match value {
                Ok(json) => store.set(key, json),
                Err(e) => warn!(key, "Failed to serialize state: {}", e),
            }
        }
    }

    pub fn selected_date(&self) -> NaiveDate {
        self.selected_date
    }

    pub fn window(&self) -> UtcWindow {
        self.window
    }

    pub fn selected_range(&self) -> Option<SelectedRange> {
        self.selected
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn locations(&self) -> impl Iterator<Item = &Location> {
        self.panels.iter().map(Panel::location)
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    pub fn contains(&self, timezone_id: &str) -> bool {
        self.panels.iter().any(|panel| panel.id() == timezone_id)
    }

    /// Props every panel receives; identical for all of them
    pub fn props(&self) -> PanelProps {
        PanelProps {
            window: self.window,
            selected: self.selected,
            removable: self.panels.len() > 1,
        }
    }

    /// Switch the date; the window follows. Returns false if unchanged.
    pub fn set_date(&mut self, date: NaiveDate) -> bool {
        if date == self.selected_date {
            return false;
        }
        self.selected_date = date;
        self.window = UtcWindow::for_date(date);
        debug!(%date, start = self.window.start_ms, "window moved");
        true
    }

    /// Parse and apply a date; invalid input keeps the previous date
    pub fn set_date_str(&mut self, input: &str) -> Result<bool, DateParseError> {
        let date = parse_date(input)?;
        Ok(self.set_date(date))
    }

    /// Add a panel; duplicates are ignored. Returns true if added.
    pub fn add_location(&mut self, location: Location) -> bool {
        self.add_location_at(location, Utc::now())
    }

    fn add_location_at(&mut self, location: Location, now: DateTime<Utc>) -> bool {
        if self.contains(location.id()) {
            debug!(zone = location.id(), "duplicate location ignored");
            return false;
        }
        info!(zone = location.id(), label = %location.label, "location added");
        self.panels
            .push(Panel::new(location, &self.ticker, &self.settings, now));
        true
    }

    /// Remove a panel; the last one is never removed
    pub fn remove_location(&mut self, timezone_id: &str) -> bool {
        if self.panels.len() <= 1 {
            debug!(zone = timezone_id, "refusing to remove the last location");
            return false;
        }
        let before = self.panels.len();
        self.panels.retain(|panel| panel.id() != timezone_id);
        let removed = self.panels.len() != before;
        if removed {
            info!(zone = timezone_id, "location removed");
        }
        removed
    }

    /// Overwrite the shared selection (last writer wins)
    pub fn select_range(&mut self, start_utc: i64, end_utc: i64) -> bool {
        match SelectedRange::new(start_utc, end_utc).filter(SelectedRange::is_representable) {
            Some(range) => {
                self.selected = Some(range);
                true
            }
            None => false,
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Apply a message sent by the panel at `index`
    pub fn apply(&mut self, index: usize, message: PanelMessage) {
        match message {
            PanelMessage::SelectRange(range) => {
                self.selected = Some(range);
            }
            PanelMessage::Remove => {
                if let Some(id) = self.panels.get(index).map(Panel::id) {
                    self.remove_location(id);
                }
            }
        }
    }

    /// Panel currently holding a gesture, which receives moves and releases
    pub fn active_panel(&self) -> Option<usize> {
        self.panels.iter().position(Panel::is_gesture_active)
    }

    /// Route an input event to the panel at `index` and apply its message
    pub fn handle_input(
        &mut self,
        index: usize,
        event: GestureEvent,
        strip: &StripGeometry,
    ) -> Option<PanelResponse> {
        let props = self.props();
        let response = self.panels.get_mut(index)?.handle_input(event, strip, &props);
        if let Some(message) = response.message {
            self.apply(index, message);
        }
        Some(response)
    }

    /// Cancel every in-progress gesture
    pub fn abort_gestures(&mut self) {
        for panel in &mut self.panels {
            panel.abort_gesture();
        }
    }

    /// Advance every panel clock
    pub fn tick(&mut self, now: DateTime<Utc>) {
        for panel in &mut self.panels {
            panel.tick(now);
        }
    }

    pub fn views(&self) -> Vec<PanelView> {
        let props = self.props();
        self.panels.iter().map(|panel| panel.view(&props)).collect()
    }
}

fn read_key<T: DeserializeOwned, S: StateStore + ?Sized>(store: &S, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, "Ignoring unreadable stored value: {}", e);
            None
        }
    }
}
