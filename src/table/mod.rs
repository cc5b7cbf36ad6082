//! User-defined keyword table
//!
//! An ordered mapping of keyword to [`ActionDescriptor`]. Keywords are unique
//! ignoring case and are matched lower-cased. Every mutation is persisted
//! through the table's [`CommandStore`] before it returns; when the store
//! fails the table is restored to its previous contents.

mod store;

pub use store::{
    CommandStore, JsonFileStore, MemoryStore, StoreError, decode_entries, encode_entries,
};

use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use crate::ActionDescriptor;

/// Table shared between the event loop and readers on other threads
pub type SharedTable = Arc<RwLock<CommandTable>>;

/// One keyword and the action it triggers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEntry {
    pub keyword: String,
    pub action: ActionDescriptor,
}

impl CommandEntry {
    pub fn new(keyword: impl Into<String>, action: ActionDescriptor) -> Self {
        Self {
            keyword: keyword.into(),
            action,
        }
    }
}

/// Error type for table mutations
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("Keyword must not be empty")]
    EmptyKeyword,

    #[error("Keyword already exists: {0}")]
    DuplicateKey(String),

    #[error("Keyword not found: {0}")]
    NotFound(String),

    #[error("Failed to save command table: {0}")]
    Persist(#[source] StoreError),
}

/// Ordered keyword → action table
#[derive(Clone)]
pub struct CommandTable {
    entries: Vec<CommandEntry>,
    store: Arc<dyn CommandStore>,
    /// Store modification time the entries correspond to
    synced_at: Option<SystemTime>,
}

impl fmt::Debug for CommandTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandTable")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::in_memory()
    }
}

fn normalize(keyword: &str) -> String {
    keyword.trim().to_lowercase()
}

impl CommandTable {
    /// Empty table backed by a [`MemoryStore`]
    pub fn in_memory() -> Self {
        Self::empty(Arc::new(MemoryStore::new()))
    }

    /// Empty table persisted to `store`
    pub fn empty(store: Arc<dyn CommandStore>) -> Self {
        Self {
            entries: Vec::new(),
            store,
            synced_at: None,
        }
    }

    /// Load a table from `store`, rejecting keywords that are empty or
    /// collide ignoring case.
    pub fn load(store: Arc<dyn CommandStore>) -> Result<Self, StoreError> {
        let loaded = store.load()?;
        let mut table = Self::empty(store);
        for entry in loaded {
            if entry.keyword.trim().is_empty() {
                return Err(StoreError::EmptyKeyword);
            }
            if table.position(&entry.keyword).is_some() {
                return Err(StoreError::DuplicateKeyword(entry.keyword));
            }
            table.entries.push(entry);
        }
        table.synced_at = table.store.modified();
        tracing::debug!("Loaded {} commands", table.entries.len());
        Ok(table)
    }

    /// Re-read the store if it changed since this table last loaded or
    /// saved it, e.g. because another process edited the file.
    ///
    /// Returns whether the entries were replaced. A store that fails to load
    /// leaves the current entries in place and is not retried until it
    /// changes again.
    pub fn reload_if_changed(&mut self) -> Result<bool, StoreError> {
        let modified = self.store.modified();
        if modified.is_none() || modified == self.synced_at {
            return Ok(false);
        }
        self.synced_at = modified;

        let fresh = Self::load(Arc::clone(&self.store))?;
        self.entries = fresh.entries;
        self.synced_at = fresh.synced_at;
        tracing::info!("Command table changed on disk, reloaded {} commands", self.entries.len());
        Ok(true)
    }

    /// Where the table is persisted
    pub fn location(&self) -> String {
        self.store.location()
    }

    /// Wrap the table for sharing across threads
    pub fn into_shared(self) -> SharedTable {
        Arc::new(RwLock::new(self))
    }

    fn position(&self, keyword: &str) -> Option<usize> {
        let wanted = normalize(keyword);
        self.entries
            .iter()
            .position(|entry| normalize(&entry.keyword) == wanted)
    }

    /// Find the action for `keyword`, ignoring case
    pub fn lookup(&self, keyword: &str) -> Option<&ActionDescriptor> {
        self.position(keyword).map(|idx| &self.entries[idx].action)
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.position(keyword).is_some()
    }

    /// Keywords in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.keyword.as_str())
    }

    pub fn entries(&self) -> &[CommandEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add or overwrite an entry.
    ///
    /// An existing keyword (compared ignoring case) keeps its position and
    /// takes the new spelling and action. New keywords are appended.
    pub fn put(
        &mut self,
        keyword: impl Into<String>,
        action: ActionDescriptor,
    ) -> Result<(), TableError> {
        let keyword = keyword.into().trim().to_string();
        if keyword.is_empty() {
            return Err(TableError::EmptyKeyword);
        }

        let previous = self.entries.clone();
        match self.position(&keyword) {
            Some(idx) => self.entries[idx] = CommandEntry::new(keyword, action),
            None => self.entries.push(CommandEntry::new(keyword, action)),
        }
        self.commit(previous)
    }

    /// Remove an entry and return its action
    pub fn remove(&mut self, keyword: &str) -> Result<ActionDescriptor, TableError> {
        let idx = self
            .position(keyword)
            .ok_or_else(|| TableError::NotFound(keyword.to_string()))?;

        let previous = self.entries.clone();
        let removed = self.entries.remove(idx);
        self.commit(previous)?;
        Ok(removed.action)
    }

    /// Rename `old` to `new`, keeping its action.
    ///
    /// Fails without touching the table if `old` is missing or `new` is taken
    /// by another entry. Changing only the case of a keyword is allowed. The
    /// renamed entry moves to the end of the table.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<(), TableError> {
        let new = new.trim();
        if new.is_empty() {
            return Err(TableError::EmptyKeyword);
        }
        let idx = self
            .position(old)
            .ok_or_else(|| TableError::NotFound(old.to_string()))?;
        if let Some(existing) = self.position(new) {
            if existing != idx {
                return Err(TableError::DuplicateKey(new.to_string()));
            }
        }

        let previous = self.entries.clone();
        let mut entry = self.entries.remove(idx);
        entry.keyword = new.to_string();
        self.entries.push(entry);
        self.commit(previous)
    }

    /// Add every entry whose keyword is not already present.
    ///
    /// Existing keywords are never overwritten. Returns how many entries were
    /// added; the store is written once, and only if something was added.
    pub fn merge(
        &mut self,
        entries: impl IntoIterator<Item = CommandEntry>,
    ) -> Result<usize, TableError> {
        let previous = self.entries.clone();
        let mut added = 0;
        for mut entry in entries {
            entry.keyword = entry.keyword.trim().to_string();
            if entry.keyword.is_empty() || self.contains(&entry.keyword) {
                continue;
            }
            self.entries.push(entry);
            added += 1;
        }

        if added > 0 {
            self.commit(previous)?;
        }
        Ok(added)
    }

    /// Write the current contents to the store
    pub fn save(&self) -> Result<(), StoreError> {
        self.store.save(&self.entries)
    }

    fn commit(&mut self, previous: Vec<CommandEntry>) -> Result<(), TableError> {
        if let Err(e) = self.store.save(&self.entries) {
            tracing::warn!("Rolling back command table change: {}", e);
            self.entries = previous;
            return Err(TableError::Persist(e));
        }
        self.synced_at = self.store.modified();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenStore;

    impl CommandStore for BrokenStore {
        fn load(&self) -> Result<Vec<CommandEntry>, StoreError> {
            Ok(Vec::new())
        }

        fn save(&self, _entries: &[CommandEntry]) -> Result<(), StoreError> {
            Err(StoreError::Io {
                path: "broken.json".into(),
                source: std::io::Error::other("disk full"),
            })
        }
    }

    /// Saves fine until `break_now` is called
    #[derive(Default)]
    struct FailingLaterStore {
        failing: std::sync::atomic::AtomicBool,
    }

    impl FailingLaterStore {
        fn break_now(&self) {
            self.failing.store(true, std::sync::atomic::Ordering::SeqCst);
        }
    }

    impl CommandStore for FailingLaterStore {
        fn load(&self) -> Result<Vec<CommandEntry>, StoreError> {
            Ok(Vec::new())
        }

        fn save(&self, entries: &[CommandEntry]) -> Result<(), StoreError> {
            if self.failing.load(std::sync::atomic::Ordering::SeqCst) {
                BrokenStore.save(entries)
            } else {
                Ok(())
            }
        }
    }

    fn program(path: &str) -> ActionDescriptor {
        ActionDescriptor::program(path).unwrap()
    }

    /// A three-entry table whose store fails from now on
    fn table_that_stops_saving() -> CommandTable {
        let store = Arc::new(FailingLaterStore::default());
        let mut table = CommandTable::empty(store.clone());
        table.put("浏览器", program("/chrome")).unwrap();
        table.put("记事本", program("/notepad")).unwrap();
        table.put("画图", program("/paint")).unwrap();
        store.break_now();
        table
    }

    fn keys(table: &CommandTable) -> Vec<String> {
        table.keys().map(str::to_string).collect()
    }

    #[test]
    fn test_put_and_lookup_ignore_case() {
        let mut table = CommandTable::in_memory();
        table.put("Chrome", program("/usr/bin/chrome")).unwrap();

        assert_eq!(table.lookup("chrome"), Some(&program("/usr/bin/chrome")));
        assert_eq!(table.lookup("CHROME "), Some(&program("/usr/bin/chrome")));
        assert!(table.lookup("firefox").is_none());
    }

    #[test]
    fn test_put_overwrites_in_place() {
        let mut table = CommandTable::in_memory();
        table.put("a", program("/a")).unwrap();
        table.put("b", program("/b")).unwrap();
        table.put("A", program("/a2")).unwrap();

        assert_eq!(keys(&table), ["A", "b"]);
        assert_eq!(table.lookup("a"), Some(&program("/a2")));
    }

    #[test]
    fn test_put_rejects_empty_keyword() {
        let mut table = CommandTable::in_memory();
        assert!(matches!(
            table.put("   ", program("/a")),
            Err(TableError::EmptyKeyword)
        ));
    }

    #[test]
    fn test_remove_missing_is_not_found() {
        let mut table = CommandTable::in_memory();
        assert!(matches!(table.remove("x"), Err(TableError::NotFound(_))));
    }

    #[test]
    fn test_rename_moves_entry_to_end() {
        let mut table = CommandTable::in_memory();
        table.put("a", program("/a")).unwrap();
        table.put("b", program("/b")).unwrap();
        table.rename("a", "c").unwrap();

        assert_eq!(keys(&table), ["b", "c"]);
        assert_eq!(table.lookup("c"), Some(&program("/a")));
        assert!(table.lookup("a").is_none());
    }

    #[test]
    fn test_rename_to_existing_fails_without_change() {
        let mut table = CommandTable::in_memory();
        table.put("a", program("/a")).unwrap();
        table.put("b", program("/b")).unwrap();

        assert!(matches!(
            table.rename("a", "B"),
            Err(TableError::DuplicateKey(_))
        ));
        assert_eq!(keys(&table), ["a", "b"]);
    }

    #[test]
    fn test_rename_case_only_is_allowed() {
        let mut table = CommandTable::in_memory();
        table.put("chrome", program("/c")).unwrap();
        table.rename("chrome", "Chrome").unwrap();
        assert_eq!(keys(&table), ["Chrome"]);
    }

    #[test]
    fn test_persist_failure_rolls_back() {
        let mut table = CommandTable::empty(Arc::new(BrokenStore));

        assert!(matches!(
            table.put("a", program("/a")),
            Err(TableError::Persist(_))
        ));
        assert!(table.is_empty());
    }

    #[test]
    fn test_rename_persist_failure_keeps_entries_and_order() {
        let mut table = table_that_stops_saving();
        let before = table.entries().to_vec();

        assert!(matches!(
            table.rename("浏览器", "chrome"),
            Err(TableError::Persist(_))
        ));
        assert_eq!(table.entries(), before.as_slice());
        assert!(table.lookup("chrome").is_none());
        assert_eq!(table.lookup("浏览器"), Some(&program("/chrome")));
    }

    #[test]
    fn test_remove_persist_failure_keeps_entries_and_order() {
        let mut table = table_that_stops_saving();
        let before = table.entries().to_vec();

        assert!(matches!(
            table.remove("记事本"),
            Err(TableError::Persist(_))
        ));
        assert_eq!(table.entries(), before.as_slice());
        assert_eq!(keys(&table), ["浏览器", "记事本", "画图"]);
    }

    #[test]
    fn test_merge_persist_failure_keeps_entries_and_order() {
        let mut table = table_that_stops_saving();
        let before = table.entries().to_vec();

        let result = table.merge([
            CommandEntry::new("计算器", program("/calc")),
            CommandEntry::new("终端", program("/term")),
        ]);
        assert!(matches!(result, Err(TableError::Persist(_))));
        assert_eq!(table.entries(), before.as_slice());
        assert_eq!(table.len(), 3);
    }

    /// Memory store whose modification time is set by the test
    #[derive(Default)]
    struct StampedStore {
        inner: MemoryStore,
        stamp: std::sync::Mutex<Option<SystemTime>>,
    }

    impl StampedStore {
        /// Replace the contents as another writer would
        fn write_externally(&self, entries: Vec<CommandEntry>, at: SystemTime) {
            self.inner.save(&entries).unwrap();
            *self.stamp.lock().unwrap() = Some(at);
        }
    }

    impl CommandStore for StampedStore {
        fn load(&self) -> Result<Vec<CommandEntry>, StoreError> {
            self.inner.load()
        }

        fn save(&self, entries: &[CommandEntry]) -> Result<(), StoreError> {
            self.inner.save(entries)
        }

        fn modified(&self) -> Option<SystemTime> {
            *self.stamp.lock().unwrap()
        }
    }

    #[test]
    fn test_reload_picks_up_external_changes() {
        let store = Arc::new(StampedStore::default());
        let t0 = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(100);
        store.write_externally(vec![CommandEntry::new("记事本", program("/notepad"))], t0);

        let mut table = CommandTable::load(store.clone()).unwrap();
        assert!(!table.reload_if_changed().unwrap());

        store.write_externally(
            vec![
                CommandEntry::new("记事本", program("/notepad")),
                CommandEntry::new("画图", program("/paint")),
            ],
            t0 + std::time::Duration::from_secs(1),
        );
        assert!(table.reload_if_changed().unwrap());
        assert_eq!(keys(&table), ["记事本", "画图"]);
        assert!(!table.reload_if_changed().unwrap());
    }

    #[test]
    fn test_reload_failure_keeps_entries() {
        let store = Arc::new(StampedStore::default());
        let t0 = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(100);
        store.write_externally(vec![CommandEntry::new("a", program("/a"))], t0);
        let mut table = CommandTable::load(store.clone()).unwrap();

        store.write_externally(
            vec![
                CommandEntry::new("b", program("/b")),
                CommandEntry::new("B", program("/b2")),
            ],
            t0 + std::time::Duration::from_secs(1),
        );
        assert!(matches!(
            table.reload_if_changed(),
            Err(StoreError::DuplicateKeyword(_))
        ));
        assert_eq!(keys(&table), ["a"]);
        // not retried until the store changes again
        assert!(!table.reload_if_changed().unwrap());
    }

    #[test]
    fn test_merge_only_adds_new_keywords() {
        let store = Arc::new(MemoryStore::new());
        let mut table = CommandTable::empty(store.clone());
        table.put("Notepad", program("/old")).unwrap();

        let added = table
            .merge([
                CommandEntry::new("notepad", program("/new")),
                CommandEntry::new("paint", program("/paint")),
                CommandEntry::new("Paint", program("/paint2")),
            ])
            .unwrap();

        assert_eq!(added, 1);
        assert_eq!(table.lookup("notepad"), Some(&program("/old")));
        assert_eq!(store.saved().len(), 2);
    }

    #[test]
    fn test_load_rejects_case_duplicates() {
        let store = Arc::new(MemoryStore::with_entries(vec![
            CommandEntry::new("Music", program("/a")),
            CommandEntry::new("music", program("/b")),
        ]));
        assert!(matches!(
            CommandTable::load(store),
            Err(StoreError::DuplicateKeyword(k)) if k == "music"
        ));
    }
}
