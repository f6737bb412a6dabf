//! Drawing module - panel cards, hour strips and the selection overlay
//!
//! Panels are stacked top to bottom in the area right of the sidebar. Each
//! card shows its header above a 25-slot strip; all strips share the same
//! horizontal geometry so the selection lines up across panels.

use nannou::prelude::*;
use planner_core::panel::PanelView;
use planner_core::slots::{Availability, Slot};
use planner_core::StripGeometry;

/// Color palette
pub mod colors {
    use nannou::prelude::*;

    /// Deep background
    pub const BACKGROUND: Srgb<u8> = Srgb {
        red: 18,
        green: 22,
        blue: 28,
        standard: std::marker::PhantomData,
    };

    pub const CARD_BG: Srgb<u8> = Srgb {
        red: 35,
        green: 40,
        blue: 50,
        standard: std::marker::PhantomData,
    };

    /// Card border while a drag is in progress
    pub const CARD_BORDER_ACTIVE: Srgb<u8> = Srgb {
        red: 120,
        green: 140,
        blue: 180,
        standard: std::marker::PhantomData,
    };

    pub const SLOT_AVAILABLE: Srgb<u8> = Srgb {
        red: 52,
        green: 110,
        blue: 86,
        standard: std::marker::PhantomData,
    };

    pub const SLOT_LIMITED: Srgb<u8> = Srgb {
        red: 112,
        green: 96,
        blue: 52,
        standard: std::marker::PhantomData,
    };

    pub const SLOT_UNAVAILABLE: Srgb<u8> = Srgb {
        red: 48,
        green: 52,
        blue: 62,
        standard: std::marker::PhantomData,
    };

    /// Local midnight marker
    pub const DAY_BOUNDARY: Srgb<u8> = Srgb {
        red: 255,
        green: 179,
        blue: 71,
        standard: std::marker::PhantomData,
    };

    pub const SELECTION: Srgb<u8> = Srgb {
        red: 110,
        green: 170,
        blue: 255,
        standard: std::marker::PhantomData,
    };

    /// Time text color
    pub const TIME_TEXT: Srgb<u8> = Srgb {
        red: 245,
        green: 240,
        blue: 235,
        standard: std::marker::PhantomData,
    };

    /// Date/secondary text
    pub const SECONDARY_TEXT: Srgb<u8> = Srgb {
        red: 160,
        green: 165,
        blue: 175,
        standard: std::marker::PhantomData,
    };

    /// Primary text
    pub const TEXT_PRIMARY: Srgb<u8> = Srgb {
        red: 220,
        green: 225,
        blue: 235,
        standard: std::marker::PhantomData,
    };
}

const MARGIN: f32 = 20.0;
const TITLE_HEIGHT: f32 = 60.0;
const CARD_HEIGHT: f32 = 130.0;
const CARD_GAP: f32 = 16.0;
const STRIP_HEIGHT: f32 = 46.0;
const CARD_PADDING: f32 = 14.0;

/// Screen rectangles of one panel
#[derive(Debug, Clone, Copy)]
pub struct PanelLayout {
    pub card: Rect,
    pub strip: Rect,
}

impl PanelLayout {
    /// Stack `count` cards in the area right of the sidebar
    pub fn calculate(window_rect: Rect, sidebar_width: f32, count: usize) -> Vec<Self> {
        let left = window_rect.left() + sidebar_width + MARGIN;
        let right = window_rect.right() - MARGIN;
        let width = (right - left).max(1.0);
        let top = window_rect.top() - TITLE_HEIGHT;

        (0..count)
            .map(|i| {
                let card_top = top - i as f32 * (CARD_HEIGHT + CARD_GAP);
                let card = Rect::from_x_y_w_h(
                    left + width / 2.0,
                    card_top - CARD_HEIGHT / 2.0,
                    width,
                    CARD_HEIGHT,
                );
                let strip = Rect::from_x_y_w_h(
                    card.x(),
                    card.bottom() + CARD_PADDING + STRIP_HEIGHT / 2.0,
                    width - CARD_PADDING * 2.0,
                    STRIP_HEIGHT,
                );
                Self { card, strip }
            })
            .collect()
    }

    pub fn strip_geometry(&self) -> StripGeometry {
        StripGeometry::new(self.strip.left(), self.strip.w())
    }

    /// Whether a pointer at `pos` lands on the strip
    pub fn hits_strip(&self, pos: Point2) -> bool {
        self.strip.contains(pos)
    }
}

/// Index of the panel whose strip is under `pos`
pub fn strip_under(layouts: &[PanelLayout], pos: Point2) -> Option<usize> {
    layouts.iter().position(|layout| layout.hits_strip(pos))
}

/// Convert a touch location in physical pixels to window coordinates
pub fn touch_point(x: f64, y: f64, scale_factor: f64, window_rect: Rect) -> Point2 {
    let scale = if scale_factor > 0.0 { scale_factor } else { 1.0 };
    let logical_x = (x / scale) as f32;
    let logical_y = (y / scale) as f32;
    pt2(
        logical_x - window_rect.w() / 2.0,
        window_rect.h() / 2.0 - logical_y,
    )
}

pub fn draw_title(draw: &Draw, window_rect: Rect, sidebar_width: f32) {
    let center_x = window_rect.left() + sidebar_width + (window_rect.w() - sidebar_width) / 2.0;
    draw.text("FIND A TIME")
        .x_y(center_x, window_rect.top() - 30.0)
        .color(colors::TEXT_PRIMARY)
        .font_size(18)
        .w(400.0);
}

/// Draw one panel card
pub fn draw_panel(draw: &Draw, layout: &PanelLayout, view: &PanelView, hovered: Option<usize>) {
    let card = layout.card;

    draw.rect()
        .xy(card.xy())
        .wh(card.wh())
        .color(colors::CARD_BG);
    if view.dragging {
        draw.rect()
            .xy(card.xy())
            .wh(card.wh())
            .no_fill()
            .stroke(colors::CARD_BORDER_ACTIVE)
            .stroke_weight(2.0);
    }

    draw_header(draw, layout, view);
    draw_strip(draw, layout, &view.slots);
    draw_overlay(draw, layout, view);

    if let Some(slot) = hovered.and_then(|i| view.slots.get(i)) {
        draw.text(&slot.describe())
            .x_y(card.right() - CARD_PADDING - 80.0, layout.strip.top() + 12.0)
            .color(colors::SECONDARY_TEXT)
            .font_size(11)
            .w(160.0)
            .right_justify();
    }
}

fn draw_header(draw: &Draw, layout: &PanelLayout, view: &PanelView) {
    let card = layout.card;
    let text_left = card.left() + CARD_PADDING;
    let header_y = card.top() - 24.0;

    draw.text(&view.header.clock)
        .x_y(text_left + 70.0, header_y)
        .color(colors::TIME_TEXT)
        .font_size(22)
        .w(140.0)
        .left_justify();

    draw.text(&view.header.label)
        .x_y(text_left + 150.0 + 300.0 / 2.0, header_y)
        .color(colors::TEXT_PRIMARY)
        .font_size(14)
        .w(300.0)
        .left_justify();

    let meta = format!("{}  ·  {}", view.header.offset, view.header.date);
    draw.text(&meta)
        .x_y(card.right() - CARD_PADDING - 90.0, header_y)
        .color(colors::SECONDARY_TEXT)
        .font_size(12)
        .w(180.0)
        .right_justify();
}

fn draw_strip(draw: &Draw, layout: &PanelLayout, slots: &[Slot]) {
    let geometry = layout.strip_geometry();
    let slot_w = layout.strip.w() / slots.len().max(1) as f32;
    let y = layout.strip.y();

    for slot in slots {
        let x = geometry.slot_left(slot.index) + slot_w / 2.0;
        let fill = match slot.availability {
            Availability::Available => colors::SLOT_AVAILABLE,
            Availability::Limited => colors::SLOT_LIMITED,
            Availability::Unavailable => colors::SLOT_UNAVAILABLE,
        };
        draw.rect()
            .x_y(x, y)
            .w_h(slot_w - 2.0, layout.strip.h())
            .color(fill);

        if slot.is_day_boundary {
            let left = geometry.slot_left(slot.index);
            draw.line()
                .start(pt2(left, layout.strip.bottom()))
                .end(pt2(left, layout.strip.top() + 6.0))
                .color(colors::DAY_BOUNDARY)
                .weight(2.0);
            draw.text(&slot.label)
                .x_y(left + 50.0, layout.strip.top() + 12.0)
                .color(colors::DAY_BOUNDARY)
                .font_size(10)
                .w(100.0)
                .left_justify();
        } else {
            draw.text(&slot.label)
                .x_y(x, y + 6.0)
                .color(colors::TIME_TEXT)
                .font_size(13)
                .w(slot_w);
        }
        draw.text(slot.meridiem.lowercase())
            .x_y(x, y - 12.0)
            .color(colors::SECONDARY_TEXT)
            .font_size(9)
            .w(slot_w);
    }
}

fn draw_overlay(draw: &Draw, layout: &PanelLayout, view: &PanelView) {
    if !view.overlay.is_visible() {
        return;
    }
    let (x0, x1) = view.overlay.projection.x_bounds(&layout.strip_geometry());
    let strip = layout.strip;
    let alpha: u8 = if view.overlay.live { 110 } else { 80 };
    let c = colors::SELECTION;

    draw.rect()
        .x_y((x0 + x1) / 2.0, strip.y())
        .w_h(x1 - x0, strip.h() + 6.0)
        .color(srgba(c.red, c.green, c.blue, alpha));
    draw.rect()
        .x_y((x0 + x1) / 2.0, strip.y())
        .w_h(x1 - x0, strip.h() + 6.0)
        .no_fill()
        .stroke(c)
        .stroke_weight(2.0);

    let label = format!("{} – {}", view.overlay.start_label, view.overlay.end_label);
    draw.text(&label)
        .x_y((x0 + x1) / 2.0, strip.bottom() - 10.0)
        .color(c)
        .font_size(11)
        .w((x1 - x0).max(140.0));
}
