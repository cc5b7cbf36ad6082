//! Durable storage for the keyword table.
//!
//! The on-disk format is a JSON object keyed by keyword. Each value is either
//! a plain string (a program path) or a single-field object tagged `url`,
//! `folder` or `file`:
//!
//! ```json
//! {
//!   "浏览器": "C:\\chrome.exe",
//!   "b站": { "url": "https://www.bilibili.com" }
//! }
//! ```
//!
//! Key order on disk is the table's insertion order.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::CommandEntry;
use crate::ActionDescriptor;

/// Error type for command store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid command map: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Command map contains keyword \"{0}\" more than once")]
    DuplicateKeyword(String),

    #[error("Command map contains an empty keyword")]
    EmptyKeyword,
}

/// Where the keyword table is persisted
pub trait CommandStore: Send + Sync {
    /// Load all entries in stored order
    fn load(&self) -> Result<Vec<CommandEntry>, StoreError>;

    /// Replace the stored table with `entries`
    fn save(&self, entries: &[CommandEntry]) -> Result<(), StoreError>;

    /// When the stored table last changed, if the store can tell
    fn modified(&self) -> Option<SystemTime> {
        None
    }

    /// Where the table lives, for display
    fn location(&self) -> String {
        "memory".to_string()
    }
}

/// Encode entries in the on-disk JSON format (2-space indent, non-ASCII kept verbatim)
pub fn encode_entries(entries: &[CommandEntry]) -> Result<String, StoreError> {
    Ok(serde_json::to_string_pretty(&EntryMap(entries))?)
}

/// Decode entries from the on-disk JSON format, keeping key order
pub fn decode_entries(content: &str) -> Result<Vec<CommandEntry>, StoreError> {
    let list: EntryList = serde_json::from_str(content)?;
    Ok(list.0)
}

struct EntryMap<'a>(&'a [CommandEntry]);

impl Serialize for EntryMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in self.0 {
            map.serialize_entry(&entry.keyword, &entry.action)?;
        }
        map.end()
    }
}

struct EntryList(Vec<CommandEntry>);

impl<'de> Deserialize<'de> for EntryList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntryListVisitor;

        impl<'de> Visitor<'de> for EntryListVisitor {
            type Value = EntryList;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of keyword to action")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<EntryList, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((keyword, action)) =
                    access.next_entry::<String, ActionDescriptor>()?
                {
                    entries.push(CommandEntry { keyword, action });
                }
                Ok(EntryList(entries))
            }
        }

        deserializer.deserialize_map(EntryListVisitor)
    }
}

/// JSON file store (`command_map.json`)
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl CommandStore for JsonFileStore {
    fn load(&self) -> Result<Vec<CommandEntry>, StoreError> {
        if !self.path.exists() {
            tracing::debug!("No command map at {}, starting empty", self.path.display());
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        decode_entries(&content)
    }

    fn save(&self, entries: &[CommandEntry]) -> Result<(), StoreError> {
        let content = encode_entries(entries)?;
        crate::config::write_atomic(&self.path, content.as_bytes()).map_err(|e| self.io_error(e))?;
        tracing::debug!("Saved {} commands to {}", entries.len(), self.path.display());
        Ok(())
    }

    fn modified(&self) -> Option<SystemTime> {
        std::fs::metadata(&self.path).and_then(|m| m.modified()).ok()
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory store, used for detached tables and tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<Vec<CommandEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<CommandEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Entries as of the last save
    pub fn saved(&self) -> Vec<CommandEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl CommandStore for MemoryStore {
    fn load(&self) -> Result<Vec<CommandEntry>, StoreError> {
        Ok(self.saved())
    }

    fn save(&self, entries: &[CommandEntry]) -> Result<(), StoreError> {
        if let Ok(mut stored) = self.entries.lock() {
            *stored = entries.to_vec();
        }
        Ok(())
    }
}
