//! Keyword table edits typed into a running listener.
//!
//! ```text
//! :add <program|url|folder|file> <keyword> = <target>
//! :remove <keyword>
//! :rename <old> = <new>
//! :import <command_map.json>
//! ```

use std::path::PathBuf;

use crate::ActionDescriptor;
use crate::table::{CommandTable, StoreError, TableError, decode_entries};

pub const ADD_USAGE: &str = "Usage: :add <program|url|folder|file> <keyword> = <target>";
pub const REMOVE_USAGE: &str = "Usage: :remove <keyword>";
pub const RENAME_USAGE: &str = "Usage: :rename <old> = <new>";
pub const IMPORT_USAGE: &str = "Usage: :import <command_map.json>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEdit {
    Put {
        keyword: String,
        action: ActionDescriptor,
    },
    Remove(String),
    Rename {
        old: String,
        new: String,
    },
    /// Merge another command map; existing keywords win
    Import(PathBuf),
}

#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: StoreError,
    },
}

fn split_pair(rest: &str) -> Option<(&str, &str)> {
    let (left, right) = rest.split_once('=')?;
    let (left, right) = (left.trim(), right.trim());
    (!left.is_empty() && !right.is_empty()).then_some((left, right))
}

/// Parse the arguments of `:add`
pub fn parse_add(rest: &str) -> Result<TableEdit, String> {
    let (kind, rest) = rest
        .trim()
        .split_once(char::is_whitespace)
        .ok_or_else(|| ADD_USAGE.to_string())?;
    let (keyword, target) = split_pair(rest).ok_or_else(|| ADD_USAGE.to_string())?;

    let action = match kind.to_lowercase().as_str() {
        "program" => ActionDescriptor::program(target),
        "url" => ActionDescriptor::url(target),
        "folder" => ActionDescriptor::folder(target),
        "file" => ActionDescriptor::file(target),
        _ => return Err(ADD_USAGE.to_string()),
    }
    .map_err(|e| e.to_string())?;

    Ok(TableEdit::Put {
        keyword: keyword.to_string(),
        action,
    })
}

pub fn parse_remove(rest: &str) -> Result<TableEdit, String> {
    match rest.trim() {
        "" => Err(REMOVE_USAGE.to_string()),
        keyword => Ok(TableEdit::Remove(keyword.to_string())),
    }
}

pub fn parse_rename(rest: &str) -> Result<TableEdit, String> {
    let (old, new) = split_pair(rest).ok_or_else(|| RENAME_USAGE.to_string())?;
    Ok(TableEdit::Rename {
        old: old.to_string(),
        new: new.to_string(),
    })
}

pub fn parse_import(rest: &str) -> Result<TableEdit, String> {
    match rest.trim() {
        "" => Err(IMPORT_USAGE.to_string()),
        path => Ok(TableEdit::Import(PathBuf::from(path))),
    }
}

impl TableEdit {
    /// Apply the edit and describe what changed
    pub fn apply(self, table: &mut CommandTable) -> Result<String, EditError> {
        match self {
            TableEdit::Put { keyword, action } => {
                let replaced = table.contains(&keyword);
                let target = action.target();
                table.put(keyword.as_str(), action)?;
                let verb = if replaced { "Updated" } else { "Added" };
                Ok(format!("{} \"{}\" → {}", verb, keyword.trim(), target))
            }
            TableEdit::Remove(keyword) => {
                let removed = table.remove(&keyword)?;
                Ok(format!("Removed \"{}\" ({})", keyword, removed.target()))
            }
            TableEdit::Rename { old, new } => {
                table.rename(&old, &new)?;
                Ok(format!("Renamed \"{}\" to \"{}\"", old, new))
            }
            TableEdit::Import(path) => {
                let content = std::fs::read_to_string(&path).map_err(|source| EditError::Read {
                    path: path.clone(),
                    source,
                })?;
                let entries = decode_entries(&content).map_err(|source| EditError::Decode {
                    path: path.clone(),
                    source,
                })?;
                let total = entries.len();
                let added = table.merge(entries)?;
                Ok(format!(
                    "Imported {} of {} commands from {}",
                    added,
                    total,
                    path.display()
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add() {
        assert_eq!(
            parse_add("url b站 = https://www.bilibili.com"),
            Ok(TableEdit::Put {
                keyword: "b站".to_string(),
                action: ActionDescriptor::url("https://www.bilibili.com").unwrap(),
            })
        );
        assert_eq!(
            parse_add("program VS Code = /usr/bin/code"),
            Ok(TableEdit::Put {
                keyword: "VS Code".to_string(),
                action: ActionDescriptor::program("/usr/bin/code").unwrap(),
            })
        );
        assert_eq!(parse_add("url b站"), Err(ADD_USAGE.to_string()));
        assert_eq!(parse_add("script x = y"), Err(ADD_USAGE.to_string()));
        assert!(parse_add("url b站 = ftp://x").is_err());
    }

    #[test]
    fn test_parse_rename_and_remove() {
        assert_eq!(
            parse_rename(" 浏览器 = 谷歌浏览器 "),
            Ok(TableEdit::Rename {
                old: "浏览器".to_string(),
                new: "谷歌浏览器".to_string(),
            })
        );
        assert_eq!(parse_rename("浏览器 ="), Err(RENAME_USAGE.to_string()));
        assert_eq!(parse_remove("  "), Err(REMOVE_USAGE.to_string()));
        assert_eq!(parse_remove(" 画图 "), Ok(TableEdit::Remove("画图".to_string())));
    }

    #[test]
    fn test_apply_edits() {
        let mut table = CommandTable::in_memory();
        let message = parse_add("program 记事本 = /usr/bin/gedit")
            .unwrap()
            .apply(&mut table)
            .unwrap();
        assert_eq!(message, "Added \"记事本\" → /usr/bin/gedit");

        parse_rename("记事本 = 编辑器").unwrap().apply(&mut table).unwrap();
        assert!(table.contains("编辑器"));

        let err = parse_remove("记事本").unwrap().apply(&mut table).unwrap_err();
        assert!(matches!(err, EditError::Table(TableError::NotFound(_))));
    }

    #[test]
    fn test_import_merges_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("more.json");
        std::fs::write(&path, r#"{"画图": "/paint", "记事本": "/other"}"#).unwrap();

        let mut table = CommandTable::in_memory();
        table
            .put("记事本", ActionDescriptor::program("/notepad").unwrap())
            .unwrap();
        let message = TableEdit::Import(path).apply(&mut table).unwrap();

        assert!(message.starts_with("Imported 1 of 2 commands"));
        assert_eq!(
            table.lookup("记事本"),
            Some(&ActionDescriptor::program("/notepad").unwrap())
        );
        assert!(table.contains("画图"));
    }
}
