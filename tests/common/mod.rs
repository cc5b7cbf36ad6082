//! Shared test utilities for integration tests

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use tempfile::TempDir;
use voxcmd::ActionDescriptor;
use voxcmd::table::{CommandStore, CommandTable, JsonFileStore};
use voxcmd::voice::{ListenLimits, SpeechSource, TranscriptionError};

/// A command table backed by a JSON file in a fresh temp dir
pub struct TempTable {
    pub dir: TempDir,
    pub path: PathBuf,
    pub store: Arc<JsonFileStore>,
}

impl TempTable {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("command_map.json");
        let store = Arc::new(JsonFileStore::new(&path));
        Self { dir, path, store }
    }

    pub fn load(&self) -> CommandTable {
        let store: Arc<dyn CommandStore> = self.store.clone();
        CommandTable::load(store).expect("Failed to load table")
    }

    pub fn contents(&self) -> String {
        std::fs::read_to_string(&self.path).expect("Failed to read command map")
    }
}

/// The table from the README example
pub fn sample_table(table: &mut CommandTable) {
    table
        .put("浏览器", ActionDescriptor::program("C:\\chrome.exe").unwrap())
        .unwrap();
    table
        .put("b站", ActionDescriptor::url("https://www.bilibili.com").unwrap())
        .unwrap();
    table
        .put("音乐", ActionDescriptor::folder("D:\\music").unwrap())
        .unwrap();
    table
        .put("周报", ActionDescriptor::file("D:\\docs\\report.docx").unwrap())
        .unwrap();
}

/// Speech source that never hears anything and counts concurrent captures
#[derive(Default)]
pub struct CountingSource {
    pub active: Arc<AtomicUsize>,
    pub max_active: Arc<AtomicUsize>,
    pub calls: Arc<AtomicUsize>,
}

impl CountingSource {
    pub fn handles(&self) -> (Arc<AtomicUsize>, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        (
            Arc::clone(&self.active),
            Arc::clone(&self.max_active),
            Arc::clone(&self.calls),
        )
    }
}

impl SpeechSource for CountingSource {
    fn listen_once(
        &mut self,
        _limits: ListenLimits,
        cancel: &AtomicBool,
    ) -> Result<String, TranscriptionError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);

        thread::sleep(Duration::from_millis(3));
        let result = if cancel.load(Ordering::SeqCst) {
            Err(TranscriptionError::Cancelled)
        } else {
            Err(TranscriptionError::Timeout)
        };

        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
