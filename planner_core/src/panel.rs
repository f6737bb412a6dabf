//! Panel - one timezone's clock and interactive timeline
//!
//! A panel owns only what is private to it: its live clock, its gesture
//! machine and its location. The shared window and selection arrive as
//! `PanelProps` on every call, and the panel answers with `PanelMessage`s
//! for the controller to apply.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::clock::{ClockSubscription, Ticker, DEFAULT_CLOCK_INTERVAL};
use crate::gesture::{GestureEvent, GestureMachine, GestureOutcome, GestureThresholds, StripGeometry};
use crate::location::Location;
use crate::projector::{overlay_for, SelectionOverlay};
use crate::slots::{build_slots, AvailabilityPattern, Slot};
use crate::window::{SelectedRange, UtcWindow};

/// Settings shared by every panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelSettings {
    pub clock_interval: Duration,
    pub thresholds: GestureThresholds,
    pub availability: AvailabilityPattern,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            clock_interval: DEFAULT_CLOCK_INTERVAL,
            thresholds: GestureThresholds::default(),
            availability: AvailabilityPattern::default(),
        }
    }
}

/// Shared state handed down by the controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelProps {
    pub window: UtcWindow,
    pub selected: Option<SelectedRange>,
    /// False for the last remaining panel
    pub removable: bool,
}

/// Messages a panel sends up to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelMessage {
    SelectRange(SelectedRange),
    Remove,
}

/// Header text of a panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelHeader {
    /// "2:05 PM"
    pub clock: String,
    pub label: String,
    /// "GMT+8"
    pub offset: String,
    /// "27 Jan"
    pub date: String,
}

/// Everything needed to draw a panel
#[derive(Debug, Clone, PartialEq)]
pub struct PanelView {
    pub header: PanelHeader,
    pub slots: Vec<Slot>,
    pub overlay: SelectionOverlay,
    pub removable: bool,
    pub dragging: bool,
}

/// Outcome of routing one input event into a panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelResponse {
    pub outcome: GestureOutcome,
    pub message: Option<PanelMessage>,
}

#[derive(Debug)]
pub struct Panel {
    location: Location,
    clock: ClockSubscription,
    gesture: GestureMachine,
    availability: AvailabilityPattern,
}

impl Panel {
    pub fn new(location: Location, ticker: &Ticker, settings: &PanelSettings, now: DateTime<Utc>) -> Self {
        let clock = ticker.subscribe(location.timezone, settings.clock_interval, now);
        Self {
            location,
            clock,
            gesture: GestureMachine::new(settings.thresholds),
            availability: settings.availability,
        }
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn id(&self) -> &'static str {
        self.location.id()
    }

    pub fn is_gesture_active(&self) -> bool {
        self.gesture.is_active()
    }

    /// Advance the live clock
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        self.clock.tick(now)
    }

    /// Feed one input event to the gesture machine
    pub fn handle_input(
        &mut self,
        event: GestureEvent,
        strip: &StripGeometry,
        props: &PanelProps,
    ) -> PanelResponse {
        let outcome = self.gesture.handle(event, strip);
        let message = match outcome {
            GestureOutcome::Committed(span) => match span.to_range(&props.window) {
                Some(range) => {
                    info!(
                        zone = self.id(),
                        start = range.start_utc,
                        end = range.end_utc,
                        "range selected"
                    );
                    Some(PanelMessage::SelectRange(range))
                }
                None => None,
            },
            _ => None,
        };
        PanelResponse { outcome, message }
    }

    /// Drop any in-progress gesture without emitting a range
    pub fn abort_gesture(&mut self) {
        let outcome = self.gesture.handle(GestureEvent::Abort, &StripGeometry::new(0.0, 0.0));
        if outcome != GestureOutcome::Ignored {
            debug!(zone = self.id(), "gesture aborted");
        }
    }

    /// Remove button; the last remaining panel offers none
    pub fn request_remove(&self, props: &PanelProps) -> Option<PanelMessage> {
        props.removable.then_some(PanelMessage::Remove)
    }

    pub fn view(&self, props: &PanelProps) -> PanelView {
        let reading = self.clock.reading();
        PanelView {
            header: PanelHeader {
                clock: reading.format_clock(),
                label: self.location.label.clone(),
                offset: reading.format_gmt_offset(),
                date: reading.format_short_date(),
            },
            slots: build_slots(&props.window, self.location.timezone, &self.availability),
            overlay: overlay_for(
                self.gesture.live_span(),
                props.selected.as_ref(),
                &props.window,
                self.location.timezone,
            ),
            removable: props.removable,
            dragging: self.gesture.is_active(),
        }
    }
}
