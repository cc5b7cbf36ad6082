//! CLI command implementations

pub mod hotkey;
pub mod init;
pub mod listen;
pub mod run;
pub mod table;

use anyhow::{Context as _, Result};
use std::path::PathBuf;
use std::sync::Arc;

use voxcmd::config::Config;
use voxcmd::table::{CommandTable, JsonFileStore};

/// Resolved configuration shared by every command
pub struct Context {
    pub config: Config,
    pub config_path: PathBuf,
    /// `--commands` for this run only; never written back to the config
    pub commands_override: Option<PathBuf>,
}

impl Context {
    /// Load the config from `--config` (or the global path) and remember
    /// a `--commands` override
    pub fn load(config: Option<PathBuf>, commands: Option<PathBuf>) -> Result<Self> {
        let config_path = config.unwrap_or_else(Config::global_config_path);
        let config = Config::load_or_default(&config_path)?;
        Ok(Self {
            config,
            config_path,
            commands_override: commands,
        })
    }

    /// Command table file in effect for this run
    pub fn commands_path(&self) -> PathBuf {
        self.commands_override
            .clone()
            .unwrap_or_else(|| self.config.commands_path())
    }

    /// Open the persisted keyword table
    pub fn open_table(&self) -> Result<CommandTable> {
        let path = self.commands_path();
        let store = Arc::new(JsonFileStore::new(&path));
        CommandTable::load(store)
            .with_context(|| format!("Failed to load command table: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_override_is_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        let override_path = dir.path().join("other.json");

        let mut ctx = Context::load(Some(config_path.clone()), Some(override_path.clone())).unwrap();
        assert_eq!(ctx.commands_path(), override_path);

        hotkey::hotkey_command(&mut ctx, Some("ctrl+f9".to_string())).unwrap();

        let saved = Config::from_file(&config_path).unwrap();
        assert_eq!(saved.hotkey, "ctrl+f9");
        assert_eq!(saved.commands_file, None);
        assert!(!std::fs::read_to_string(&config_path).unwrap().contains("other.json"));
    }

    #[test]
    fn test_commands_path_defaults_to_config() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::load(Some(dir.path().join("config.toml")), None).unwrap();
        assert_eq!(ctx.commands_path(), ctx.config.commands_path());
    }
}
