use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::controller::classifier::BORDER_DEAD_ZONE;

const CONFIG_DIR: &str = "opentyper";
const CONFIG_FILE: &str = "config.toml";

/// Runtime settings.
///
/// Only knobs live here; the tile tables and button bindings are compiled-in
/// immutable data.
#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(default)]
pub struct Settings {
    /// Deadzone around the stick border; see the classifier.
    pub border_dead_zone: f32,

    /// Optional word list replacing the embedded dictionary.
    pub dictionary_path: Option<PathBuf>,

    /// Capacity of the event channels between subsystems.
    pub channel_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            border_dead_zone: BORDER_DEAD_ZONE,
            dictionary_path: None,
            channel_capacity: 1000,
        }
    }
}

impl Settings {
    /// Loads settings from the user config file, falling back to defaults
    /// when the file is absent or unreadable.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            info!("No config directory available, using default settings");
            return Self::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(settings) => {
                    info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    warn!("Ignoring malformed config {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                info!("No config file at {}, using defaults", path.display());
                Self::default()
            }
        }
    }

    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }
}
