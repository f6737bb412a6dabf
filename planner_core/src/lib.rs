//! Core of the meeting planner: the shared UTC window, per-location hour
//! slots, drag selection and share links.

pub mod clock;
pub mod config;
pub mod controller;
pub mod gesture;
pub mod location;
pub mod panel;
pub mod projector;
pub mod share;
pub mod slots;
pub mod store;
pub mod time_engine;
pub mod window;

pub use controller::{Controller, DateParseError, QuickDate, SHARED_KEYS};
pub use gesture::{GestureEvent, StripGeometry};
pub use location::Location;
pub use panel::{PanelMessage, PanelView};
pub use window::{SelectedRange, UtcWindow, SLOT_COUNT};
