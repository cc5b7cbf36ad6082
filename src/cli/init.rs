//! Init command implementation

use anyhow::{Result, bail};
use std::path::Path;
use tracing::info;

/// Default configuration content for voxcmd init
pub const DEFAULT_CONFIG: &str = r#"# voxcmd configuration
# ====================
#
# Say (or type) a keyword and voxcmd runs the action stored for it.
# Keywords live in the command table (see `commands_file`).

# Global hotkey that starts/stops listening, e.g. "f8" or "ctrl+shift+l"
hotkey = "f8"

# Where the keyword table is stored (JSON). Default: ~/.voxcmd/command_map.json
# commands_file = "/path/to/command_map.json"

[listen]
# Seconds to wait for speech to begin
timeout_secs = 5.0
# Maximum length of one phrase in seconds
phrase_limit_secs = 5.0
# Transcription language: zh, en, auto, ...
language = "zh"
# Whisper model (tiny, base, small, medium, large); expects ggml-<model>.bin
whisper_model = "base"
# Sox silence detection
silence_threshold = "1%"
silence_duration = 1.0

# Search engines. An utterance starting with a trigger searches the rest.
[[search]]
name = "AI"
triggers = ["搜索", "search"]
url_template = "https://www.perplexity.ai/search?q={query}"

[[search]]
name = "Google"
triggers = ["谷歌搜索", "查找", "google"]
url_template = "https://www.google.com/search?q={query}"
"#;

/// Write the default configuration to `config_path`
pub fn init_command(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        bail!(
            "Config already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(config_path, DEFAULT_CONFIG)?;

    info!("Created {}", config_path.display());
    println!("Created {}", config_path.display());
    println!();
    println!("Next steps:");
    println!("  voxcmd add 浏览器 --program /usr/bin/firefox");
    println!("  voxcmd listen");

    Ok(())
}
