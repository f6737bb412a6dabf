//! Selection projector - UTC ranges to percentage offsets within a strip
//!
//! Percentages depend only on the shared window and the shared range, never
//! on the panel's timezone, so every panel draws the overlay at the same
//! horizontal position.

use chrono_tz::Tz;

use crate::gesture::{SlotSpan, StripGeometry};
use crate::time_engine::format_time_of_day;
use crate::window::{SelectedRange, UtcWindow, SLOT_COUNT};

/// Overlay geometry in percent of the strip width
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub start_percent: f64,
    pub end_percent: f64,
    pub has_selection: bool,
}

impl Projection {
    pub const NONE: Projection = Projection {
        start_percent: 0.0,
        end_percent: 0.0,
        has_selection: false,
    };

    fn from_percents(start_percent: f64, end_percent: f64) -> Self {
        let start_percent = start_percent.clamp(0.0, 100.0);
        let end_percent = end_percent.clamp(0.0, 100.0);
        Self {
            start_percent,
            end_percent,
            has_selection: end_percent > start_percent,
        }
    }

    /// Overlay edges in window coordinates
    pub fn x_bounds(&self, strip: &StripGeometry) -> (f32, f32) {
        let to_x = |percent: f64| strip.left + strip.width * (percent / 100.0) as f32;
        (to_x(self.start_percent), to_x(self.end_percent))
    }
}

/// Project a committed range onto the window
pub fn project_range(range: &SelectedRange, window: &UtcWindow) -> Projection {
    if range.end_utc <= range.start_utc || window.duration_ms() <= 0 {
        return Projection::NONE;
    }
    Projection::from_percents(
        window.percent_of(range.start_utc),
        window.percent_of(range.end_utc),
    )
}

/// Project an in-progress slot span
pub fn project_span(span: SlotSpan) -> Projection {
    Projection::from_percents(
        span.lo as f64 * 100.0 / SLOT_COUNT as f64,
        (span.hi + 1) as f64 * 100.0 / SLOT_COUNT as f64,
    )
}

/// What a panel draws over its strip
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionOverlay {
    pub projection: Projection,
    /// Panel-local "h:mm AM" of the range start
    pub start_label: String,
    /// Panel-local "h:mm AM" of the range end
    pub end_label: String,
    /// True while the panel's own drag is in progress
    pub live: bool,
}

impl SelectionOverlay {
    pub fn is_visible(&self) -> bool {
        self.projection.has_selection
    }
}

/// Choose between the panel's live drag and the shared committed range.
///
/// The originating panel shows its drag as it happens; every other panel
/// (and the originator once idle) shows the committed range.
pub fn overlay_for(
    live_span: Option<SlotSpan>,
    committed: Option<&SelectedRange>,
    window: &UtcWindow,
    tz: Tz,
) -> SelectionOverlay {
    if let Some(span) = live_span {
        let range = span.to_range(window);
        return SelectionOverlay {
            projection: project_span(span),
            start_label: range.map(|r| format_time_of_day(tz, r.start_utc)).unwrap_or_default(),
            end_label: range.map(|r| format_time_of_day(tz, r.end_utc)).unwrap_or_default(),
            live: true,
        };
    }

    match committed {
        Some(range) => SelectionOverlay {
            projection: project_range(range, window),
            start_label: format_time_of_day(tz, range.start_utc),
            end_label: format_time_of_day(tz, range.end_utc),
            live: false,
        },
        None => SelectionOverlay {
            projection: Projection::NONE,
            start_label: String::new(),
            end_label: String::new(),
            live: false,
        },
    }
}
