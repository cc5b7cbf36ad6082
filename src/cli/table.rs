//! Command table management: list, add, remove, rename, import

use anyhow::{Context as _, Result, bail};
use std::path::{Path, PathBuf};

use super::Context;
use voxcmd::ActionDescriptor;
use voxcmd::table::decode_entries;

/// Which kind of action `add` stores
pub enum AddTarget {
    Program(PathBuf),
    Url(String),
    Folder(PathBuf),
    File(PathBuf),
}

impl AddTarget {
    fn into_descriptor(self) -> Result<ActionDescriptor> {
        let descriptor = match self {
            AddTarget::Program(path) => ActionDescriptor::program(path)?,
            AddTarget::Url(address) => ActionDescriptor::url(address)?,
            AddTarget::Folder(path) => ActionDescriptor::folder(path)?,
            AddTarget::File(path) => ActionDescriptor::file(path)?,
        };
        Ok(descriptor)
    }
}

/// Print every entry as `[kind] keyword → target`
pub fn list_command(ctx: &Context) -> Result<()> {
    let table = ctx.open_table()?;
    if table.is_empty() {
        println!("No commands yet. Add one with: voxcmd add <keyword> --program <path>");
        return Ok(());
    }

    println!("Commands ({}):\n", table.len());
    for entry in table.entries() {
        println!(
            "  [{}] {} → {}",
            entry.action.label(),
            entry.keyword,
            entry.action.target()
        );
    }
    Ok(())
}

pub fn add_command(ctx: &Context, keyword: &str, target: AddTarget) -> Result<()> {
    let mut table = ctx.open_table()?;
    let descriptor = target.into_descriptor()?;
    let replaced = table.contains(keyword);
    table.put(keyword, descriptor)?;

    if replaced {
        println!("Updated \"{}\"", keyword.trim());
    } else {
        println!("Added \"{}\"", keyword.trim());
    }
    Ok(())
}

pub fn remove_command(ctx: &Context, keyword: &str) -> Result<()> {
    let mut table = ctx.open_table()?;
    let removed = table.remove(keyword)?;
    println!("Removed \"{}\" ({})", keyword, removed.target());
    Ok(())
}

pub fn rename_command(ctx: &Context, old: &str, new: &str) -> Result<()> {
    let mut table = ctx.open_table()?;
    table.rename(old, new)?;
    println!("Renamed \"{}\" to \"{}\"", old, new.trim());
    Ok(())
}

/// Merge another command map into the table. Existing keywords win.
pub fn import_command(ctx: &Context, file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let entries = decode_entries(&content)
        .with_context(|| format!("Failed to parse {}", file.display()))?;
    if entries.is_empty() {
        bail!("{} contains no commands", file.display());
    }

    let total = entries.len();
    let mut table = ctx.open_table()?;
    let added = table.merge(entries)?;
    println!(
        "Imported {} of {} commands ({} already present)",
        added,
        total,
        total - added
    );
    Ok(())
}
