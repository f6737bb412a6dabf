//! UI module - egui sidebar for dates, locations and share links
//!
//! Provides:
//! - Date picker: quick dates plus a free-form `YYYY-MM-DD` field
//! - Location list with timezone search and remove buttons
//! - Share link creation and restore

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use nannou_egui::egui;
use planner_core::time_engine::{search_timezones, zone_label, zone_subtitle};
use planner_core::QuickDate;

/// State of the timezone search box
#[derive(Default)]
pub struct SearchState {
    pub query: String,
    pub results: Vec<Tz>,
}

impl SearchState {
    pub fn new() -> Self {
        Self {
            query: String::new(),
            results: search_timezones(""),
        }
    }

    pub fn update(&mut self) {
        self.results = search_timezones(&self.query);
    }

    pub fn reset(&mut self) {
        self.query.clear();
        self.update();
    }
}

/// Text fields and messages owned by the sidebar
#[derive(Default)]
pub struct SidebarState {
    pub search: SearchState,
    /// Free-form date input
    pub date_text: String,
    /// Last generated share link
    pub share_link: String,
    /// Link pasted for restore
    pub restore_text: String,
    /// One-line feedback under the share section
    pub status: Option<String>,
}

impl SidebarState {
    pub fn new(selected_date: NaiveDate) -> Self {
        Self {
            search: SearchState::new(),
            date_text: selected_date.format("%Y-%m-%d").to_string(),
            ..Self::default()
        }
    }
}

/// One row of the location list
pub struct LocationRow {
    pub timezone: Tz,
    pub label: String,
    /// "2:05 PM"
    pub clock: String,
}

/// Result of sidebar interactions
#[derive(Default)]
pub struct SidebarResult {
    /// A quick date was clicked
    pub set_date: Option<NaiveDate>,
    /// The date field was submitted
    pub date_text: Option<String>,
    /// Add a location for this zone
    pub add_location: Option<Tz>,
    /// Remove the panel at this index
    pub remove_panel: Option<usize>,
    pub clear_selection: bool,
    pub share: bool,
    pub share_all: bool,
    /// Restore from this link
    pub restore: Option<String>,
}

/// Draw the sidebar (left side)
pub fn draw_sidebar(
    ctx: &egui::Context,
    state: &mut SidebarState,
    selected_date: NaiveDate,
    quick_dates: &[QuickDate],
    locations: &[LocationRow],
    removable: bool,
    selection: Option<&str>,
) -> SidebarResult {
    let mut result = SidebarResult::default();

    egui::SidePanel::left("planner_sidebar")
        .resizable(false)
        .default_width(280.0)
        .show(ctx, |ui| {
            ui.add_space(10.0);
            ui.heading("Meeting Planner");
            ui.add_space(10.0);

            draw_date_section(ui, state, selected_date, quick_dates, &mut result);

            ui.add_space(10.0);
            ui.separator();
            ui.add_space(10.0);

            draw_location_section(ui, state, locations, removable, &mut result);

            ui.add_space(10.0);
            ui.separator();
            ui.add_space(10.0);

            ui.label(section_title("Selected time"));
            match selection {
                Some(text) => {
                    ui.label(egui::RichText::new(text).color(egui::Color32::from_rgb(245, 240, 235)));
                    if ui.small_button("Clear").clicked() {
                        result.clear_selection = true;
                    }
                }
                None => {
                    ui.label(hint("Drag across a timeline to pick a range"));
                }
            }

            ui.add_space(10.0);
            ui.separator();
            ui.add_space(10.0);

            draw_share_section(ui, state, &mut result);
        });

    result
}

fn draw_date_section(
    ui: &mut egui::Ui,
    state: &mut SidebarState,
    selected_date: NaiveDate,
    quick_dates: &[QuickDate],
    result: &mut SidebarResult,
) {
    ui.label(section_title("Date"));
    ui.add_space(5.0);

    ui.horizontal(|ui| {
        for quick in quick_dates {
            let text = format!("{}\n{}", quick.label, quick.sub_label);
            if ui
                .selectable_label(quick.date == selected_date, text)
                .clicked()
            {
                result.set_date = Some(quick.date);
            }
        }
    });

    ui.add_space(5.0);
    ui.horizontal(|ui| {
        let response = ui.text_edit_singleline(&mut state.date_text);
        let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if ui.button("Go").clicked() || submitted {
            result.date_text = Some(state.date_text.clone());
        }
    });
}

fn draw_location_section(
    ui: &mut egui::Ui,
    state: &mut SidebarState,
    locations: &[LocationRow],
    removable: bool,
    result: &mut SidebarResult,
) {
    ui.label(section_title(&format!("Locations ({})", locations.len())));
    ui.add_space(5.0);

    for (index, row) in locations.iter().enumerate() {
        ui.horizontal(|ui| {
            ui.vertical(|ui| {
                ui.label(egui::RichText::new(&row.label).color(egui::Color32::from_rgb(220, 225, 235)));
                ui.label(hint(&format!("{}  {}", row.clock, row.timezone.name())));
            });

            if removable {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .small_button("×")
                        .on_hover_text("Remove location")
                        .clicked()
                    {
                        result.remove_panel = Some(index);
                    }
                });
            }
        });
        ui.add_space(4.0);
    }

    ui.add_space(8.0);
    ui.label(hint("Add a location"));
    let response = ui.text_edit_singleline(&mut state.search.query);
    if response.changed() {
        state.search.update();
    }

    let now = Utc::now();
    egui::ScrollArea::vertical()
        .id_source("zone_search_results")
        .max_height(180.0)
        .show(ui, |ui| {
            if state.search.results.is_empty() {
                ui.label(hint("No matching timezones"));
            }
            for &tz in &state.search.results {
                let already_added = locations.iter().any(|row| row.timezone == tz);
                ui.add_enabled_ui(!already_added, |ui| {
                    let response = ui.selectable_label(false, zone_label(tz));
                    if response.on_hover_text(zone_subtitle(tz, now)).clicked() {
                        result.add_location = Some(tz);
                    }
                });
            }
        });
}

fn draw_share_section(ui: &mut egui::Ui, state: &mut SidebarState, result: &mut SidebarResult) {
    ui.label(section_title("Share"));
    ui.add_space(5.0);

    ui.horizontal(|ui| {
        if ui.button("Create link").clicked() {
            result.share = true;
        }
        if ui
            .small_button("All keys")
            .on_hover_text("Include every stored value")
            .clicked()
        {
            result.share_all = true;
        }
    });
    if !state.share_link.is_empty() {
        ui.text_edit_singleline(&mut state.share_link);
    }

    ui.add_space(8.0);
    ui.label(hint("Open a shared link"));
    ui.horizontal(|ui| {
        ui.text_edit_singleline(&mut state.restore_text);
        if ui.button("Open").clicked() && !state.restore_text.trim().is_empty() {
            result.restore = Some(state.restore_text.trim().to_string());
        }
    });

    if let Some(status) = &state.status {
        ui.add_space(5.0);
        ui.label(hint(status));
    }
}

fn section_title(text: &str) -> egui::RichText {
    egui::RichText::new(text)
        .size(12.0)
        .color(egui::Color32::from_rgb(160, 165, 175))
}

fn hint(text: &str) -> egui::RichText {
    egui::RichText::new(text)
        .size(11.0)
        .color(egui::Color32::from_rgb(140, 145, 155))
}
