//! Configuration persistence utilities
//!
//! Provides functions for loading and saving planner configuration to disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use tracing::{info, warn};

use crate::gesture::GestureThresholds;
use crate::location::Location;
use crate::panel::PanelSettings;
use crate::slots::{Availability, AvailabilityPattern};

/// Error type for configuration operations
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to determine config directory
    NoConfigDir,
    /// IO error while reading/writing config
    Io(io::Error),
    /// Failed to parse config file
    Parse(toml::de::Error),
    /// Failed to serialize config
    Serialize(toml::ser::Error),
    /// Config parsed but holds an unusable value
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NoConfigDir => write!(f, "Could not determine config directory"),
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Serialize(e) => write!(f, "Serialize error: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(e: toml::ser::Error) -> Self {
        ConfigError::Serialize(e)
    }
}

/// Name of the planner's config file (without extension)
pub const CONFIG_NAME: &str = "meeting_planner";

/// Planner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Panel clock refresh interval
    pub clock_interval_ms: u64,
    /// Page that share links point at
    pub share_base_url: String,
    /// Availability by local hour; must hold 24 entries when set
    pub availability: Option<Vec<Availability>>,
    pub gesture: GestureThresholds,
    /// Locations shown when nothing was persisted or shared
    pub default_locations: Vec<Location>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            clock_interval_ms: 1000,
            share_base_url: "http://localhost:3000/".to_string(),
            availability: None,
            gesture: GestureThresholds::default(),
            default_locations: vec![Location::new(
                chrono_tz::Asia::Manila,
                "Manila, Philippines",
            )],
        }
    }
}

impl PlannerConfig {
    /// Validate and turn into the settings every panel is built with
    pub fn panel_settings(&self) -> Result<PanelSettings, ConfigError> {
        if self.clock_interval_ms == 0 {
            return Err(ConfigError::Invalid("clock_interval_ms must be positive".into()));
        }
        let gesture = self.gesture;
        for (name, value) in [
            ("scroll_window_ms", gesture.scroll_window_ms),
            ("scroll_speed_px_per_ms", gesture.scroll_speed_px_per_ms),
            ("scroll_min_dx_px", gesture.scroll_min_dx_px as f64),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "gesture.{} must be a finite non-negative number, found {}",
                    name, value
                )));
            }
        }
        let availability = match &self.availability {
            Some(hours) => AvailabilityPattern::from_slice(hours).ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "availability needs 24 entries, found {}",
                    hours.len()
                ))
            })?,
            None => AvailabilityPattern::default(),
        };
        Ok(PanelSettings {
            clock_interval: Duration::from_millis(self.clock_interval_ms),
            thresholds: self.gesture,
            availability,
        })
    }
}

/// Get the base configuration directory of the planner
pub fn config_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "meeting-planner", "planner")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the configuration file path for a named config
pub fn config_path(name: &str) -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(format!("{}.toml", name)))
}

/// Load a named configuration
///
/// Returns `None` if the config file doesn't exist yet.
/// Returns an error if the file exists but can't be parsed.
pub fn load_config<T: DeserializeOwned>(name: &str) -> Result<Option<T>, ConfigError> {
    let path = config_path(name).ok_or(ConfigError::NoConfigDir)?;
    load_config_from(&path)
}

/// Load a configuration file at `path`, `None` if it doesn't exist
pub fn load_config_from<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path)?;
    let config: T = toml::from_str(&contents)?;
    Ok(Some(config))
}

/// Save a named configuration
pub fn save_config<T: Serialize>(name: &str, config: &T) -> Result<(), ConfigError> {
    let path = config_path(name).ok_or(ConfigError::NoConfigDir)?;
    save_config_to(&path, config)
}

pub fn save_config_to<T: Serialize>(path: &Path, config: &T) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let contents = toml::to_string_pretty(config)?;
    fs::write(path, contents)?;
    Ok(())
}

/// Load the planner config, writing the defaults out on first run
pub fn load_or_create_planner_config() -> Result<PlannerConfig, ConfigError> {
    let path = config_path(CONFIG_NAME).ok_or(ConfigError::NoConfigDir)?;
    load_or_create_config_at(&path)
}

/// Load the planner config at `path`, creating it with defaults when absent
pub fn load_or_create_config_at(path: &Path) -> Result<PlannerConfig, ConfigError> {
    if let Some(config) = load_config_from(path)? {
        return Ok(config);
    }
    let config = PlannerConfig::default();
    match save_config_to(path, &config) {
        Ok(()) => info!(path = %path.display(), "Wrote default config"),
        Err(e) => warn!("Could not write default config: {}", e),
    }
    Ok(config)
}
