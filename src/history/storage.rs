use super::types::HistoryItem;
use crate::settings::SettingsStore;
use crate::Result;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Store key holding the history array
pub const HISTORY_KEY: &str = "history";

/// Number of entries kept
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Q&A history kept newest first in a settings store
#[derive(Clone)]
pub struct HistoryStorage {
    store: Arc<dyn SettingsStore>,
    limit: usize,
    // Serializes read-modify-write cycles
    write_lock: Arc<Mutex<()>>,
}

impl HistoryStorage {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self::with_limit(store, DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_limit(store: Arc<dyn SettingsStore>, limit: usize) -> Self {
        Self {
            store,
            limit,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    fn load(&self) -> Result<Vec<HistoryItem>> {
        let stored = self.store.get(&[HISTORY_KEY])?;
        match stored.get(HISTORY_KEY) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => match serde_json::from_value(value.clone()) {
                Ok(items) => Ok(items),
                Err(e) => {
                    warn!("Discarding unreadable history: {}", e);
                    Ok(Vec::new())
                }
            },
        }
    }

    fn save(&self, items: &[HistoryItem]) -> Result<()> {
        let mut entries = Map::new();
        entries.insert(HISTORY_KEY.to_string(), serde_json::to_value(items)?);
        self.store.set(entries)
    }

    /// Prepend an item, dropping the oldest beyond the limit
    pub fn add(&self, item: HistoryItem) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut items = self.load()?;
        items.insert(0, item);
        items.truncate(self.limit);
        self.save(&items)?;
        debug!("History now holds {} items", items.len());
        Ok(())
    }

    pub fn get_all(&self) -> Result<Vec<HistoryItem>> {
        self.load()
    }

    pub fn get(&self, index: usize) -> Result<Option<HistoryItem>> {
        Ok(self.load()?.into_iter().nth(index))
    }

    /// Remove the item at `index` (0 = newest). Out-of-range is a no-op.
    pub fn remove(&self, index: usize) -> Result<Option<HistoryItem>> {
        let _guard = self.write_lock.lock();
        let mut items = self.load()?;
        if index >= items.len() {
            return Ok(None);
        }
        let removed = items.remove(index);
        self.save(&items)?;
        Ok(Some(removed))
    }

    pub fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.save(&[])
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.load()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.load()?.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::types::PageInfo;
    use crate::settings::MemoryStore;
    use serde_json::json;

    fn storage() -> HistoryStorage {
        HistoryStorage::new(Arc::new(MemoryStore::new()))
    }

    fn item(n: usize) -> HistoryItem {
        HistoryItem::new(
            format!("question {}", n),
            format!("answer {}", n),
            &PageInfo::new("https://example.com", "Example"),
        )
    }

    #[test]
    fn test_empty_history() {
        let history = storage();
        assert!(history.is_empty().unwrap());
        assert!(history.get_all().unwrap().is_empty());
    }

    #[test]
    fn test_add_is_newest_first() {
        let history = storage();
        history.add(item(1)).unwrap();
        history.add(item(2)).unwrap();

        let all = history.get_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].question, "question 2");
        assert_eq!(all[1].question, "question 1");
    }

    #[test]
    fn test_limit_drops_oldest() {
        let history = HistoryStorage::with_limit(Arc::new(MemoryStore::new()), 3);
        for n in 0..5 {
            history.add(item(n)).unwrap();
        }

        let all = history.get_all().unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].question, "question 4");
        assert_eq!(all[2].question, "question 2");
    }

    #[test]
    fn test_default_limit() {
        let history = storage();
        for n in 0..(DEFAULT_HISTORY_LIMIT + 5) {
            history.add(item(n)).unwrap();
        }
        assert_eq!(history.len().unwrap(), DEFAULT_HISTORY_LIMIT);
    }

    #[test]
    fn test_remove() {
        let history = storage();
        history.add(item(1)).unwrap();
        history.add(item(2)).unwrap();

        let removed = history.remove(0).unwrap().unwrap();
        assert_eq!(removed.question, "question 2");
        assert_eq!(history.len().unwrap(), 1);

        assert!(history.remove(10).unwrap().is_none());
        assert_eq!(history.len().unwrap(), 1);
    }

    #[test]
    fn test_clear() {
        let history = storage();
        history.add(item(1)).unwrap();
        history.clear().unwrap();
        assert!(history.is_empty().unwrap());
    }

    #[test]
    fn test_reads_entries_without_ids() {
        let store = Arc::new(MemoryStore::new());
        let mut entries = Map::new();
        entries.insert(
            HISTORY_KEY.into(),
            json!([{
                "question": "What is this page about?",
                "answer": "Rust.",
                "url": "https://www.rust-lang.org",
                "title": "",
                "timestamp": "2025-03-01T12:00:00Z"
            }]),
        );
        store.set(entries).unwrap();

        let history = HistoryStorage::new(store);
        let first = history.get(0).unwrap().unwrap();
        assert_eq!(first.answer, "Rust.");
        assert_eq!(first.display_title(), "https://www.rust-lang.org");
    }

    #[test]
    fn test_unreadable_history_is_discarded() {
        let store = Arc::new(MemoryStore::new());
        let mut entries = Map::new();
        entries.insert(HISTORY_KEY.into(), json!("not a list"));
        store.set(entries).unwrap();

        let history = HistoryStorage::new(store);
        assert!(history.is_empty().unwrap());
        history.add(item(1)).unwrap();
        assert_eq!(history.len().unwrap(), 1);
    }
}
