//! Configuration loading and management

mod io;
mod listen;
mod search;

pub(crate) use io::write_atomic;
pub use listen::ListenSettings;
pub use search::{QUERY_PLACEHOLDER, SearchEngine, default_search_engines};

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Main configuration structure, stored as TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Global hotkey that toggles listening
    /// Format: "modifier+key" e.g. "f8", "ctrl+shift+l"
    #[serde(default = "default_hotkey")]
    pub hotkey: String,

    /// Where the keyword table is persisted.
    /// Defaults to ~/.voxcmd/command_map.json
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commands_file: Option<PathBuf>,

    /// Speech capture settings
    #[serde(default)]
    pub listen: ListenSettings,

    /// Search engines, checked in order
    #[serde(default = "default_search_engines")]
    pub search: Vec<SearchEngine>,
}

fn default_hotkey() -> String {
    "f8".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hotkey: default_hotkey(),
            commands_file: None,
            listen: ListenSettings::default(),
            search: default_search_engines(),
        }
    }
}

impl Config {
    /// Path of the persisted keyword table
    pub fn commands_path(&self) -> PathBuf {
        self.commands_file
            .clone()
            .unwrap_or_else(|| Self::global_config_dir().join("command_map.json"))
    }

    /// Directory holding whisper models
    pub fn model_dir(&self) -> PathBuf {
        self.listen
            .model_dir
            .clone()
            .unwrap_or_else(|| Self::global_config_dir().join("whisper-models"))
    }
}
