//! Key-value settings backends
//!
//! Values are plain JSON so a store can sit in front of any persistence the
//! host offers. Writes merge into the existing map; the last writer wins.

use crate::{ContextualError, Result};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// A flat key-value settings store
pub trait SettingsStore: Send + Sync {
    /// Fetch the given keys. Keys that are not stored are absent from the result.
    fn get(&self, keys: &[&str]) -> Result<Map<String, Value>>;

    /// Merge the given entries into the store
    fn set(&self, values: Map<String, Value>) -> Result<()>;
}

impl<S: SettingsStore + ?Sized> SettingsStore for Arc<S> {
    fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        (**self).get(keys)
    }

    fn set(&self, values: Map<String, Value>) -> Result<()> {
        (**self).set(values)
    }
}

fn select(all: &Map<String, Value>, keys: &[&str]) -> Map<String, Value> {
    keys.iter()
        .filter_map(|k| all.get(*k).map(|v| (k.to_string(), v.clone())))
        .collect()
}

/// In-process store, shared between clones
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<RwLock<Map<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        Ok(select(&self.values.read(), keys))
    }

    fn set(&self, values: Map<String, Value>) -> Result<()> {
        self.values.write().extend(values);
        Ok(())
    }
}

/// Store persisted as a single JSON object on disk
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    lock: RwLock<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let contents = std::fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&contents)? {
            Value::Object(map) => Ok(map),
            other => Err(ContextualError::StorageError(format!(
                "{} does not hold a JSON object (found {})",
                self.path.display(),
                kind_of(&other)
            ))),
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl SettingsStore for JsonFileStore {
    fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        let _guard = self.lock.read();
        Ok(select(&self.read_all()?, keys))
    }

    fn set(&self, values: Map<String, Value>) -> Result<()> {
        let _guard = self.lock.write();

        let mut all = self.read_all()?;
        let count = values.len();
        all.extend(values);

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        // Readers see the old file or the new one, never a partial write
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, &Value::Object(all))?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        debug!("Wrote {} settings to {}", count, self.path.display());
        Ok(())
    }
}
