//! Gesture state machine - pointer and touch input to a committed slot span
//!
//! One machine lives in every panel. Mouse input commits on release, even
//! without movement. Touch input first has to prove it is a selection drag
//! rather than a horizontal scroll: a fast swipe right after touch-start
//! cancels the gesture and leaves scrolling to the platform.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::window::{SelectedRange, UtcWindow, SLOT_COUNT};

/// Touch classification thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureThresholds {
    /// Only moves this soon after touch-start can be classified as a scroll
    pub scroll_window_ms: f64,
    /// Speed above which an early move counts as a swipe
    pub scroll_speed_px_per_ms: f64,
    /// Horizontal travel a swipe must exceed
    pub scroll_min_dx_px: f32,
}

impl Default for GestureThresholds {
    fn default() -> Self {
        Self {
            scroll_window_ms: 150.0,
            scroll_speed_px_per_ms: 1.0,
            scroll_min_dx_px: 20.0,
        }
    }
}

/// Horizontal extent of a panel's interactive strip, in window coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StripGeometry {
    pub left: f32,
    pub width: f32,
}

impl StripGeometry {
    pub fn new(left: f32, width: f32) -> Self {
        Self { left, width }
    }

    /// Slot under `x`, or `None` when `x` lies outside the strip
    pub fn slot_at(&self, x: f32) -> Option<usize> {
        let relative_x = x - self.left;
        if self.width.is_nan() || self.width <= 0.0 || relative_x < 0.0 || relative_x > self.width {
            return None;
        }
        let slot_width = self.width / SLOT_COUNT as f32;
        let index = (relative_x / slot_width).floor() as usize;
        Some(index.min(SLOT_COUNT - 1))
    }

    /// Left edge of slot `index`
    pub fn slot_left(&self, index: usize) -> f32 {
        self.left + self.width * index as f32 / SLOT_COUNT as f32
    }
}

/// Input device that started a gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Mouse,
    Touch,
}

/// Where and when a touch started
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchOrigin {
    pub x: f32,
    pub y: f32,
    pub at: Duration,
}

/// Timestamps input events as they arrive, relative to a fixed origin
#[derive(Debug, Clone, Copy)]
pub struct EventClock {
    origin: Instant,
}

impl EventClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(origin: Instant) -> Self {
        Self { origin }
    }

    /// Time since the origin, read now
    pub fn stamp(&self) -> Duration {
        self.stamp_at(Instant::now())
    }

    pub fn stamp_at(&self, instant: Instant) -> Duration {
        instant.saturating_duration_since(self.origin)
    }
}

impl Default for EventClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Raw input delivered to a panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    PointerDown { x: f32 },
    PointerMove { x: f32 },
    PointerUp,
    TouchStart { x: f32, y: f32, at: Duration },
    TouchMove { x: f32, y: f32, at: Duration },
    TouchEnd,
    TouchCancel,
    /// Listeners went away mid-gesture (panel removed, window lost focus)
    Abort,
}

/// Per-panel gesture state
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    /// Down captured a slot, no movement registered yet
    Armed {
        kind: InputKind,
        anchor: usize,
        current: usize,
        origin: Option<TouchOrigin>,
    },
    /// Movement registered; touch scrolling is suppressed
    Dragging {
        kind: InputKind,
        anchor: usize,
        current: usize,
        origin: Option<TouchOrigin>,
    },
}

/// Inclusive span of slots `lo..=hi`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotSpan {
    pub lo: usize,
    pub hi: usize,
}

impl SlotSpan {
    pub fn between(a: usize, b: usize) -> Self {
        Self {
            lo: a.min(b),
            hi: a.max(b),
        }
    }

    /// Absolute range `[start + lo h, start + (hi + 1) h)`
    pub fn to_range(&self, window: &UtcWindow) -> Option<SelectedRange> {
        window.range_for_slots(self.lo, self.hi)
    }
}

/// Why a gesture ended without a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// Fast horizontal swipe right after touch-start
    ScrollDetected,
    /// Touch released without moving
    TapWithoutMovement,
    TouchCancelled,
    Aborted,
}

/// Result of feeding one event to the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    /// Event did not apply to the current state
    Ignored,
    Armed { slot: usize },
    /// Drag continues. `suppress_scroll` asks the host to swallow the
    /// platform's default touch scrolling for this event.
    Updated {
        slot: Option<usize>,
        suppress_scroll: bool,
    },
    Committed(SlotSpan),
    Cancelled(CancelReason),
}

/// Translates raw input into committed slot spans
#[derive(Debug, Clone, Default)]
pub struct GestureMachine {
    state: GestureState,
    thresholds: GestureThresholds,
}

impl GestureMachine {
    pub fn new(thresholds: GestureThresholds) -> Self {
        Self {
            state: GestureState::Idle,
            thresholds,
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn thresholds(&self) -> GestureThresholds {
        self.thresholds
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.state, GestureState::Idle)
    }

    /// Span currently covered by an in-progress gesture
    pub fn live_span(&self) -> Option<SlotSpan> {
        match self.state {
            GestureState::Idle => None,
            GestureState::Armed { anchor, current, .. }
            | GestureState::Dragging { anchor, current, .. } => {
                Some(SlotSpan::between(anchor, current))
            }
        }
    }

    /// Apply one event. Positions are resolved against `strip`.
    pub fn handle(&mut self, event: GestureEvent, strip: &StripGeometry) -> GestureOutcome {
        match event {
            GestureEvent::PointerDown { x } => self.arm(InputKind::Mouse, strip.slot_at(x), None),
            GestureEvent::TouchStart { x, y, at } => {
                self.arm(InputKind::Touch, strip.slot_at(x), Some(TouchOrigin { x, y, at }))
            }
            GestureEvent::PointerMove { x } => self.pointer_move(strip.slot_at(x)),
            GestureEvent::TouchMove { x, y, at } => self.touch_move(x, y, at, strip),
            GestureEvent::PointerUp | GestureEvent::TouchEnd => self.release(),
            GestureEvent::TouchCancel => self.cancel(CancelReason::TouchCancelled),
            GestureEvent::Abort => self.cancel(CancelReason::Aborted),
        }
    }

    fn arm(&mut self, kind: InputKind, slot: Option<usize>, origin: Option<TouchOrigin>) -> GestureOutcome {
        if self.is_active() {
            return GestureOutcome::Ignored;
        }
        let Some(slot) = slot else {
            return GestureOutcome::Ignored;
        };
        self.state = GestureState::Armed {
            kind,
            anchor: slot,
            current: slot,
            origin,
        };
        GestureOutcome::Armed { slot }
    }

    fn pointer_move(&mut self, slot: Option<usize>) -> GestureOutcome {
        match self.state {
            GestureState::Armed {
                kind: InputKind::Mouse,
                anchor,
                current,
                origin,
            }
            | GestureState::Dragging {
                kind: InputKind::Mouse,
                anchor,
                current,
                origin,
            } => {
                self.state = GestureState::Dragging {
                    kind: InputKind::Mouse,
                    anchor,
                    current: slot.unwrap_or(current),
                    origin,
                };
                GestureOutcome::Updated {
                    slot,
                    suppress_scroll: false,
                }
            }
            _ => GestureOutcome::Ignored,
        }
    }

    fn touch_move(&mut self, x: f32, y: f32, at: Duration, strip: &StripGeometry) -> GestureOutcome {
        let (anchor, current, origin, moved) = match self.state {
            GestureState::Armed {
                kind: InputKind::Touch,
                anchor,
                current,
                origin: Some(origin),
            } => (anchor, current, origin, false),
            GestureState::Dragging {
                kind: InputKind::Touch,
                anchor,
                current,
                origin: Some(origin),
            } => (anchor, current, origin, true),
            _ => return GestureOutcome::Ignored,
        };

        if !moved && self.looks_like_scroll(&origin, x, y, at) {
            return self.cancel(CancelReason::ScrollDetected);
        }

        let slot = strip.slot_at(x);
        self.state = GestureState::Dragging {
            kind: InputKind::Touch,
            anchor,
            current: slot.unwrap_or(current),
            origin: Some(origin),
        };
        GestureOutcome::Updated {
            slot,
            suppress_scroll: true,
        }
    }

    fn looks_like_scroll(&self, origin: &TouchOrigin, x: f32, y: f32, at: Duration) -> bool {
        let elapsed_ms = at.saturating_sub(origin.at).as_nanos() as f64 / 1_000_000.0;
        if elapsed_ms >= self.thresholds.scroll_window_ms {
            return false;
        }

        let dx = (x - origin.x).abs();
        let dy = (y - origin.y).abs();
        let distance = (dx as f64).hypot(dy as f64);
        let speed = if elapsed_ms > 0.0 {
            distance / elapsed_ms
        } else if distance > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        speed > self.thresholds.scroll_speed_px_per_ms && dx > self.thresholds.scroll_min_dx_px
    }

    fn release(&mut self) -> GestureOutcome {
        let state = std::mem::take(&mut self.state);
        match state {
            GestureState::Idle => GestureOutcome::Ignored,
            GestureState::Armed {
                kind: InputKind::Touch,
                ..
            } => {
                debug!("touch released without movement, discarding");
                GestureOutcome::Cancelled(CancelReason::TapWithoutMovement)
            }
            GestureState::Armed { anchor, current, .. }
            | GestureState::Dragging { anchor, current, .. } => {
                let span = SlotSpan::between(anchor, current);
                debug!(lo = span.lo, hi = span.hi, "gesture committed");
                GestureOutcome::Committed(span)
            }
        }
    }

    fn cancel(&mut self, reason: CancelReason) -> GestureOutcome {
        if std::mem::take(&mut self.state) == GestureState::Idle {
            return GestureOutcome::Ignored;
        }
        debug!(?reason, "gesture cancelled");
        GestureOutcome::Cancelled(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::HOUR_MS;

    /// 25 slots of 10 px starting at x = 100
    fn strip() -> StripGeometry {
        StripGeometry::new(100.0, 250.0)
    }

    fn x_of(slot: usize) -> f32 {
        100.0 + slot as f32 * 10.0 + 5.0
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_slot_at() {
        let strip = strip();
        assert_eq!(strip.slot_at(100.0), Some(0));
        assert_eq!(strip.slot_at(109.9), Some(0));
        assert_eq!(strip.slot_at(110.0), Some(1));
        assert_eq!(strip.slot_at(350.0), Some(24));
        assert_eq!(strip.slot_at(99.0), None);
        assert_eq!(strip.slot_at(351.0), None);
        assert_eq!(StripGeometry::new(0.0, 0.0).slot_at(0.0), None);
    }

    #[test]
    fn test_mouse_click_commits_single_slot() {
        let mut machine = GestureMachine::default();
        assert_eq!(
            machine.handle(GestureEvent::PointerDown { x: x_of(4) }, &strip()),
            GestureOutcome::Armed { slot: 4 }
        );
        let outcome = machine.handle(GestureEvent::PointerUp, &strip());
        assert_eq!(outcome, GestureOutcome::Committed(SlotSpan { lo: 4, hi: 4 }));
        assert_eq!(machine.state(), GestureState::Idle);
    }

    #[test]
    fn test_mouse_drag_backwards_orders_span() {
        let mut machine = GestureMachine::default();
        machine.handle(GestureEvent::PointerDown { x: x_of(7) }, &strip());
        machine.handle(GestureEvent::PointerMove { x: x_of(5) }, &strip());
        machine.handle(GestureEvent::PointerMove { x: x_of(3) }, &strip());
        assert_eq!(machine.live_span(), Some(SlotSpan { lo: 3, hi: 7 }));

        let outcome = machine.handle(GestureEvent::PointerUp, &strip());
        let GestureOutcome::Committed(span) = outcome else {
            panic!("expected commit, got {:?}", outcome);
        };
        let window = UtcWindow::starting_at(1_000);
        let range = span.to_range(&window).unwrap();
        assert_eq!(range.start_utc, 1_000 + 3 * HOUR_MS);
        assert_eq!(range.end_utc, 1_000 + 8 * HOUR_MS);
    }

    #[test]
    fn test_mouse_move_outside_strip_keeps_last_slot() {
        let mut machine = GestureMachine::default();
        machine.handle(GestureEvent::PointerDown { x: x_of(2) }, &strip());
        machine.handle(GestureEvent::PointerMove { x: x_of(6) }, &strip());
        let outcome = machine.handle(GestureEvent::PointerMove { x: 900.0 }, &strip());
        assert_eq!(
            outcome,
            GestureOutcome::Updated {
                slot: None,
                suppress_scroll: false
            }
        );
        assert_eq!(machine.live_span(), Some(SlotSpan { lo: 2, hi: 6 }));
    }

    #[test]
    fn test_down_outside_strip_stays_idle() {
        let mut machine = GestureMachine::default();
        let outcome = machine.handle(GestureEvent::PointerDown { x: 10.0 }, &strip());
        assert_eq!(outcome, GestureOutcome::Ignored);
        assert!(!machine.is_active());
        assert_eq!(machine.handle(GestureEvent::PointerUp, &strip()), GestureOutcome::Ignored);
    }

    #[test]
    fn test_second_down_while_armed_is_ignored() {
        let mut machine = GestureMachine::default();
        machine.handle(GestureEvent::PointerDown { x: x_of(1) }, &strip());
        let outcome = machine.handle(GestureEvent::PointerDown { x: x_of(9) }, &strip());
        assert_eq!(outcome, GestureOutcome::Ignored);
        assert_eq!(machine.live_span(), Some(SlotSpan { lo: 1, hi: 1 }));
    }

    #[test]
    fn test_fast_touch_swipe_cancels_as_scroll() {
        let mut machine = GestureMachine::default();
        machine.handle(
            GestureEvent::TouchStart {
                x: x_of(5),
                y: 0.0,
                at: ms(1_000),
            },
            &strip(),
        );
        // 30 px in one 16 ms frame
        let outcome = machine.handle(
            GestureEvent::TouchMove {
                x: x_of(5) + 30.0,
                y: 0.0,
                at: ms(1_016),
            },
            &strip(),
        );
        assert_eq!(outcome, GestureOutcome::Cancelled(CancelReason::ScrollDetected));
        assert!(!machine.is_active());
        assert_eq!(machine.handle(GestureEvent::TouchEnd, &strip()), GestureOutcome::Ignored);
    }

    #[test]
    fn test_vertical_swipe_is_a_drag() {
        let mut machine = GestureMachine::default();
        machine.handle(
            GestureEvent::TouchStart {
                x: x_of(5),
                y: 0.0,
                at: ms(0),
            },
            &strip(),
        );
        let outcome = machine.handle(
            GestureEvent::TouchMove {
                x: x_of(5) + 5.0,
                y: 60.0,
                at: ms(10),
            },
            &strip(),
        );
        assert_eq!(
            outcome,
            GestureOutcome::Updated {
                slot: Some(6),
                suppress_scroll: true
            }
        );
    }

    #[test]
    fn test_slow_touch_drag_commits() {
        let mut machine = GestureMachine::default();
        machine.handle(
            GestureEvent::TouchStart {
                x: x_of(3),
                y: 0.0,
                at: ms(0),
            },
            &strip(),
        );
        machine.handle(
            GestureEvent::TouchMove {
                x: x_of(5),
                y: 0.0,
                at: ms(200),
            },
            &strip(),
        );
        // After the first accepted move no further scroll check happens
        machine.handle(
            GestureEvent::TouchMove {
                x: x_of(8),
                y: 0.0,
                at: ms(201),
            },
            &strip(),
        );
        let outcome = machine.handle(GestureEvent::TouchEnd, &strip());
        assert_eq!(outcome, GestureOutcome::Committed(SlotSpan { lo: 3, hi: 8 }));
    }

    #[test]
    fn test_touch_tap_is_discarded() {
        let mut machine = GestureMachine::default();
        machine.handle(
            GestureEvent::TouchStart {
                x: x_of(3),
                y: 0.0,
                at: ms(0),
            },
            &strip(),
        );
        let outcome = machine.handle(GestureEvent::TouchEnd, &strip());
        assert_eq!(outcome, GestureOutcome::Cancelled(CancelReason::TapWithoutMovement));
        assert!(!machine.is_active());
    }

    #[test]
    fn test_touch_cancel_never_commits() {
        let mut machine = GestureMachine::default();
        machine.handle(
            GestureEvent::TouchStart {
                x: x_of(3),
                y: 0.0,
                at: ms(0),
            },
            &strip(),
        );
        machine.handle(
            GestureEvent::TouchMove {
                x: x_of(4),
                y: 0.0,
                at: ms(400),
            },
            &strip(),
        );
        let outcome = machine.handle(GestureEvent::TouchCancel, &strip());
        assert_eq!(outcome, GestureOutcome::Cancelled(CancelReason::TouchCancelled));
        assert_eq!(machine.state(), GestureState::Idle);
    }

    #[test]
    fn test_thresholds_are_configurable() {
        let mut machine = GestureMachine::new(GestureThresholds {
            scroll_speed_px_per_ms: 5.0,
            ..GestureThresholds::default()
        });
        machine.handle(
            GestureEvent::TouchStart {
                x: x_of(5),
                y: 0.0,
                at: ms(0),
            },
            &strip(),
        );
        let outcome = machine.handle(
            GestureEvent::TouchMove {
                x: x_of(5) + 30.0,
                y: 0.0,
                at: ms(16),
            },
            &strip(),
        );
        assert!(matches!(outcome, GestureOutcome::Updated { .. }));
    }

    #[test]
    fn test_slower_swipe_cancels_with_lower_speed_threshold() {
        let mut machine = GestureMachine::new(GestureThresholds {
            scroll_speed_px_per_ms: 0.25,
            ..GestureThresholds::default()
        });
        machine.handle(
            GestureEvent::TouchStart {
                x: x_of(5),
                y: 0.0,
                at: ms(0),
            },
            &strip(),
        );
        // 30 px in 100 ms
        let outcome = machine.handle(
            GestureEvent::TouchMove {
                x: x_of(5) + 30.0,
                y: 0.0,
                at: ms(100),
            },
            &strip(),
        );
        assert_eq!(outcome, GestureOutcome::Cancelled(CancelReason::ScrollDetected));
        assert_eq!(machine.handle(GestureEvent::TouchEnd, &strip()), GestureOutcome::Ignored);
    }

    #[test]
    fn test_same_timestamp_move_is_a_scroll() {
        let mut machine = GestureMachine::default();
        machine.handle(
            GestureEvent::TouchStart {
                x: x_of(5),
                y: 0.0,
                at: ms(500),
            },
            &strip(),
        );
        let outcome = machine.handle(
            GestureEvent::TouchMove {
                x: x_of(5) + 25.0,
                y: 0.0,
                at: ms(500),
            },
            &strip(),
        );
        assert_eq!(outcome, GestureOutcome::Cancelled(CancelReason::ScrollDetected));
    }

    #[test]
    fn test_same_timestamp_move_without_travel_drags() {
        let mut machine = GestureMachine::default();
        machine.handle(
            GestureEvent::TouchStart {
                x: x_of(5),
                y: 0.0,
                at: ms(500),
            },
            &strip(),
        );
        let outcome = machine.handle(
            GestureEvent::TouchMove {
                x: x_of(5),
                y: 0.0,
                at: ms(500),
            },
            &strip(),
        );
        assert_eq!(
            outcome,
            GestureOutcome::Updated {
                slot: Some(5),
                suppress_scroll: true
            }
        );
    }

    #[test]
    fn test_touch_move_off_strip_keeps_last_slot() {
        let mut machine = GestureMachine::default();
        machine.handle(
            GestureEvent::TouchStart {
                x: x_of(3),
                y: 0.0,
                at: ms(0),
            },
            &strip(),
        );
        let outcome = machine.handle(
            GestureEvent::TouchMove {
                x: 900.0,
                y: 0.0,
                at: ms(400),
            },
            &strip(),
        );
        assert_eq!(
            outcome,
            GestureOutcome::Updated {
                slot: None,
                suppress_scroll: true
            }
        );
        assert!(matches!(machine.state(), GestureState::Dragging { current: 3, .. }));
        assert_eq!(
            machine.handle(GestureEvent::TouchEnd, &strip()),
            GestureOutcome::Committed(SlotSpan { lo: 3, hi: 3 })
        );
    }

    #[test]
    fn test_move_at_end_of_scroll_window_is_a_drag() {
        // 200 px is fast enough to be a swipe inside the window
        let mut early = GestureMachine::default();
        early.handle(
            GestureEvent::TouchStart {
                x: x_of(0),
                y: 0.0,
                at: ms(0),
            },
            &strip(),
        );
        let outcome = early.handle(
            GestureEvent::TouchMove {
                x: x_of(0) + 200.0,
                y: 0.0,
                at: ms(149),
            },
            &strip(),
        );
        assert_eq!(outcome, GestureOutcome::Cancelled(CancelReason::ScrollDetected));

        let mut machine = GestureMachine::default();
        machine.handle(
            GestureEvent::TouchStart {
                x: x_of(0),
                y: 0.0,
                at: ms(0),
            },
            &strip(),
        );
        let outcome = machine.handle(
            GestureEvent::TouchMove {
                x: x_of(0) + 200.0,
                y: 0.0,
                at: ms(150),
            },
            &strip(),
        );
        assert_eq!(
            outcome,
            GestureOutcome::Updated {
                slot: Some(20),
                suppress_scroll: true
            }
        );
    }

    #[test]
    fn test_event_clock_stamps_each_event() {
        let origin = Instant::now();
        let clock = EventClock::starting_at(origin);
        assert_eq!(clock.stamp_at(origin + ms(37)), ms(37));
        assert_eq!(clock.stamp_at(origin + ms(41)) - clock.stamp_at(origin + ms(37)), ms(4));

        let first = clock.stamp();
        let second = clock.stamp();
        assert!(second >= first);
    }

    #[test]
    fn test_abort_resets_to_idle() {
        let mut machine = GestureMachine::default();
        machine.handle(GestureEvent::PointerDown { x: x_of(1) }, &strip());
        assert_eq!(
            machine.handle(GestureEvent::Abort, &strip()),
            GestureOutcome::Cancelled(CancelReason::Aborted)
        );
        assert_eq!(machine.handle(GestureEvent::Abort, &strip()), GestureOutcome::Ignored);
    }
}
