//! Meeting Planner
//!
//! Stacked timelines, one per location, all showing the same 25 hours of
//! absolute time. Dragging across any timeline selects a range that every
//! other timeline shows in its own local hours.
//!
//! Usage: `meeting_planner [SHARE_LINK]`

mod drawing;
mod ui;

use chrono::{Local, Utc};
use nannou::prelude::*;
use nannou::winit::event::{TouchPhase as WinitTouchPhase, WindowEvent};
use nannou_egui::{self, Egui};
use planner_core::config::{load_or_create_planner_config, PlannerConfig};
use planner_core::controller::quick_dates;
use planner_core::panel::PanelSettings;
use planner_core::share::{create_share_link, create_share_link_all, restore_from_url};
use planner_core::store::{FileStore, MemoryStore, StateStore};
use planner_core::time_engine::{format_time_of_day, location_for, zone_label};
use planner_core::window::HOUR_MS;
use planner_core::gesture::EventClock;
use planner_core::{Controller, GestureEvent, SHARED_KEYS};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::drawing::{colors, draw_panel, draw_title, strip_under, touch_point, PanelLayout};
use crate::ui::{draw_sidebar, LocationRow, SidebarResult, SidebarState};

const SIDEBAR_WIDTH: f32 = 280.0;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    nannou::app(model).update(update).run();
}

/// Application state
pub struct Model {
    controller: Controller,
    config: PlannerConfig,
    settings: PanelSettings,
    /// Persisted shared state
    store: Box<dyn StateStore>,
    sidebar: SidebarState,
    /// Panel rectangles from the last update
    layouts: Vec<PanelLayout>,
    mouse_position: Option<Point2>,
    /// Touch currently driving a gesture
    active_touch: Option<u64>,
    /// Stamps touch events on arrival
    touch_clock: EventClock,
    egui: Egui,
}

impl Model {
    fn save(&mut self) {
        self.controller.persist(self.store.as_mut());
    }

    /// Rebuild the controller from whatever the store holds now
    fn reload(&mut self) {
        self.controller = Controller::restore(
            self.store.as_ref(),
            &self.config.default_locations,
            self.settings,
            Local::now().date_naive(),
            Utc::now(),
        );
        self.sidebar.date_text = self.controller.selected_date().format("%Y-%m-%d").to_string();
        self.active_touch = None;
    }

    /// Feed an event to panel `index`, saving if it committed a range
    fn route(&mut self, index: usize, event: GestureEvent) {
        let Some(strip) = self.layouts.get(index).map(PanelLayout::strip_geometry) else {
            return;
        };
        let committed = self
            .controller
            .handle_input(index, event, &strip)
            .is_some_and(|response| response.message.is_some());
        if committed {
            self.save();
        }
    }

    fn apply_sidebar(&mut self, result: SidebarResult) {
        let mut changed = false;

        if let Some(date) = result.set_date {
            changed |= self.controller.set_date(date);
        }
        if let Some(text) = result.date_text {
            match self.controller.set_date_str(&text) {
                Ok(moved) => changed |= moved,
                Err(e) => debug!("{}", e),
            }
        }
        if changed {
            self.sidebar.date_text = self.controller.selected_date().format("%Y-%m-%d").to_string();
        }

        if let Some(tz) = result.add_location {
            if self.controller.add_location(location_for(tz)) {
                self.sidebar.search.reset();
                changed = true;
            }
        }
        if let Some(index) = result.remove_panel {
            let props = self.controller.props();
            let message = self
                .controller
                .panels()
                .get(index)
                .and_then(|panel| panel.request_remove(&props));
            if let Some(message) = message {
                self.controller.apply(index, message);
                changed = true;
            }
        }
        if result.clear_selection {
            self.controller.clear_selection();
            changed = true;
        }
        if changed {
            self.save();
        }

        if result.share || result.share_all {
            self.save();
            let link = if result.share_all {
                create_share_link_all(self.store.as_ref(), &self.config.share_base_url)
            } else {
                create_share_link(self.store.as_ref(), &SHARED_KEYS, &self.config.share_base_url)
            };
            match link {
                Ok(link) => {
                    self.sidebar.share_link = link;
                    self.sidebar.status = Some("Link ready to copy".to_string());
                }
                Err(e) => {
                    warn!("Failed to create share link: {}", e);
                    self.sidebar.status = Some(format!("Could not create link: {}", e));
                }
            }
        }

        if let Some(link) = result.restore {
            match restore_from_url(&link, self.store.as_mut()) {
                Some(restored) => {
                    self.reload();
                    self.sidebar.restore_text = restored.cleaned_url;
                    self.sidebar.status = Some(format!("Restored {} values", restored.data.len()));
                }
                None => {
                    self.sidebar.status = Some("Link carries no shared state".to_string());
                }
            }
        }
    }
}

fn open_store() -> Box<dyn StateStore> {
    match FileStore::open_default() {
        Ok(store) => {
            info!(path = %store.path().display(), "Opened shared state");
            Box::new(store)
        }
        Err(e) => {
            warn!("Falling back to in-memory state: {}", e);
            Box::new(MemoryStore::new())
        }
    }
}

fn model(app: &App) -> Model {
    // Create window
    let window_id = app
        .new_window()
        .title("Meeting Planner")
        .size(1400, 800)
        .min_size(1000, 500)
        .view(view)
        .key_pressed(key_pressed)
        .mouse_pressed(mouse_pressed)
        .mouse_released(mouse_released)
        .mouse_moved(mouse_moved)
        .raw_event(raw_window_event)
        .build()
        .expect("failed to build window");

    let window = app.window(window_id).expect("window was just built");
    let egui = Egui::from_window(&window);

    // Load configuration
    let config = load_or_create_planner_config().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        PlannerConfig::default()
    });
    let settings = config.panel_settings().unwrap_or_else(|e| {
        warn!("{}", e);
        PanelSettings::default()
    });

    let mut store = open_store();
    if let Some(link) = std::env::args().nth(1) {
        if let Some(restored) = restore_from_url(&link, store.as_mut()) {
            info!(url = %restored.cleaned_url, "Opened shared link");
        }
    }

    let controller = Controller::restore(
        store.as_ref(),
        &config.default_locations,
        settings,
        Local::now().date_naive(),
        Utc::now(),
    );
    controller.persist(store.as_mut());

    let layouts = PanelLayout::calculate(app.window_rect(), SIDEBAR_WIDTH, controller.panels().len());
    let sidebar = SidebarState::new(controller.selected_date());

    Model {
        controller,
        config,
        settings,
        store,
        sidebar,
        layouts,
        mouse_position: None,
        active_touch: None,
        touch_clock: EventClock::new(),
        egui,
    }
}

fn update(app: &App, model: &mut Model, update: Update) {
    model.controller.tick(Utc::now());

    // Collect state for UI (before borrowing egui)
    let selected_date = model.controller.selected_date();
    let quick = quick_dates(Local::now().date_naive());
    let rows: Vec<LocationRow> = model
        .controller
        .panels()
        .iter()
        .zip(model.controller.views())
        .map(|(panel, view)| LocationRow {
            timezone: panel.location().timezone,
            label: panel.location().label.clone(),
            clock: view.header.clock,
        })
        .collect();
    let removable = model.controller.props().removable;
    let summary = selection_summary(&model.controller);

    // Begin egui frame
    model.egui.set_elapsed_time(update.since_start);
    let ctx = model.egui.begin_frame();
    let result = draw_sidebar(
        &ctx,
        &mut model.sidebar,
        selected_date,
        &quick,
        &rows,
        removable,
        summary.as_deref(),
    );
    drop(ctx);

    model.apply_sidebar(result);

    model.layouts = PanelLayout::calculate(
        app.window_rect(),
        SIDEBAR_WIDTH,
        model.controller.panels().len(),
    );
}

/// "9:00 AM – 11:00 AM Manila, Asia (2h)" in the first location's zone
fn selection_summary(controller: &Controller) -> Option<String> {
    let range = controller.selected_range()?;
    let tz = controller.locations().next()?.timezone;
    let hours = range.duration_ms() as f64 / HOUR_MS as f64;
    Some(format!(
        "{} – {}\n{} ({}h)",
        format_time_of_day(tz, range.start_utc),
        format_time_of_day(tz, range.end_utc),
        zone_label(tz),
        hours
    ))
}

fn view(app: &App, model: &Model, frame: Frame) {
    let draw = app.draw();
    let window_rect = app.window_rect();

    // Clear background
    draw.background().color(colors::BACKGROUND);
    draw_title(&draw, window_rect, SIDEBAR_WIDTH);

    let hovered_panel = model
        .mouse_position
        .and_then(|pos| strip_under(&model.layouts, pos).map(|i| (i, pos)));

    for (i, (layout, panel_view)) in model
        .layouts
        .iter()
        .zip(model.controller.views())
        .enumerate()
    {
        let hovered_slot = hovered_panel
            .filter(|(index, _)| *index == i)
            .and_then(|(_, pos)| layout.strip_geometry().slot_at(pos.x));
        draw_panel(&draw, layout, &panel_view, hovered_slot);
    }

    // Render to frame
    if let Err(e) = draw.to_frame(app, &frame) {
        error!("Failed to render frame: {:?}", e);
    }

    // Render egui on top
    if let Err(e) = model.egui.draw_to_frame(&frame) {
        error!("Failed to render ui: {}", e);
    }
}

fn key_pressed(_app: &App, model: &mut Model, key: Key) {
    if key == Key::Escape {
        model.controller.abort_gestures();
        model.active_touch = None;
    }
}

fn mouse_pressed(app: &App, model: &mut Model, button: MouseButton) {
    if button != MouseButton::Left {
        return;
    }
    let pos = app.mouse.position();
    if let Some(index) = strip_under(&model.layouts, pos) {
        model.route(index, GestureEvent::PointerDown { x: pos.x });
    }
}

fn mouse_moved(_app: &App, model: &mut Model, pos: Point2) {
    model.mouse_position = Some(pos);
    if let Some(index) = model.controller.active_panel() {
        model.route(index, GestureEvent::PointerMove { x: pos.x });
    }
}

fn mouse_released(_app: &App, model: &mut Model, button: MouseButton) {
    if button != MouseButton::Left {
        return;
    }
    if let Some(index) = model.controller.active_panel() {
        model.route(index, GestureEvent::PointerUp);
    }
}

fn raw_window_event(app: &App, model: &mut Model, event: &WindowEvent) {
    model.egui.handle_raw_event(event);

    match event {
        WindowEvent::Focused(false) => {
            model.controller.abort_gestures();
            model.active_touch = None;
        }
        // Handle touch events
        WindowEvent::Touch(touch) => {
            let at = model.touch_clock.stamp();
            let window_rect = app.window_rect();
            let scale_factor = app.main_window().scale_factor() as f64;

            // Convert touch position to nannou coordinates
            let pos = touch_point(touch.location.x, touch.location.y, scale_factor, window_rect);
            let (pos_x, pos_y) = (pos.x, pos.y);

            match touch.phase {
                WinitTouchPhase::Started => {
                    if model.active_touch.is_some() {
                        return;
                    }
                    if let Some(index) = strip_under(&model.layouts, pos) {
                        model.active_touch = Some(touch.id);
                        model.route(index, GestureEvent::TouchStart { x: pos_x, y: pos_y, at });
                    }
                }
                WinitTouchPhase::Moved => {
                    if model.active_touch != Some(touch.id) {
                        return;
                    }
                    if let Some(index) = model.controller.active_panel() {
                        model.route(index, GestureEvent::TouchMove { x: pos_x, y: pos_y, at });
                    }
                }
                WinitTouchPhase::Ended | WinitTouchPhase::Cancelled => {
                    if model.active_touch != Some(touch.id) {
                        return;
                    }
                    model.active_touch = None;
                    let event = if touch.phase == WinitTouchPhase::Ended {
                        GestureEvent::TouchEnd
                    } else {
                        GestureEvent::TouchCancel
                    };
                    if let Some(index) = model.controller.active_panel() {
                        model.route(index, event);
                    }
                }
            }
        }
        _ => {}
    }
}
