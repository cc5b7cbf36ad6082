//! Hotkey command: show or change the configured global hotkey

use anyhow::{Context as _, Result};

use super::Context;
use voxcmd::hotkey::parse_hotkey_string;

pub fn hotkey_command(ctx: &mut Context, combo: Option<String>) -> Result<()> {
    let Some(combo) = combo else {
        println!("{}", ctx.config.hotkey);
        return Ok(());
    };

    parse_hotkey_string(&combo).with_context(|| format!("Invalid hotkey: {}", combo))?;

    ctx.config.hotkey = combo.trim().to_string();
    ctx.config.save_to_file(&ctx.config_path)?;
    println!(
        "Hotkey set to {} (saved to {})",
        ctx.config.hotkey,
        ctx.config_path.display()
    );
    Ok(())
}
