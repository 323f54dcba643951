//! Key-value persistence for settings and reading progress.
//!
//! The store is injected behind a trait so the session logic can run against
//! an in-memory fake in tests while the CLI persists to a JSON file. Stored
//! payloads are versioned by key; anything unreadable falls back to defaults
//! rather than surfacing an error.

use crate::types::{ReaderSettings, ReadingProgress};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const SETTINGS_KEY: &str = "novel_reader_settings_v1";
pub const LAST_CHAPTER_KEY: &str = "novel_reader_last_chapter_v1";
pub const PROGRESS_KEY: &str = "novel_reader_scroll_progress_v1";

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }
}

/// File-backed store: one JSON object per file, written through on every
/// set. Write failures are logged, not propagated, so persistence trouble
/// never breaks reading.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: HashMap<String, String>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|error| {
                warn!(path = %path.display(), %error, "store file unreadable, starting empty");
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };
        Self { path, entries }
    }

    fn write_through(&self) {
        let payload = match serde_json::to_string_pretty(&self.entries) {
            Ok(payload) => payload,
            Err(error) => {
                warn!(%error, "could not serialize store");
                return;
            }
        };
        if let Some(parent) = self.path.parent() {
            if let Err(error) = std::fs::create_dir_all(parent) {
                warn!(path = %self.path.display(), %error, "could not create store directory");
                return;
            }
        }
        if let Err(error) = std::fs::write(&self.path, payload) {
            warn!(path = %self.path.display(), %error, "could not persist store");
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
        self.write_through();
    }
}

/// Stored progress entries: either the current `{scroll, paging}` shape or a
/// legacy bare number meaning a scroll offset.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredProgress {
    Detailed {
        #[serde(default)]
        scroll: f64,
        #[serde(default)]
        paging: f64,
    },
    Legacy(f64),
}

fn sanitize(position: f64) -> f64 {
    if position.is_finite() {
        position.max(0.0)
    } else {
        0.0
    }
}

impl From<StoredProgress> for ReadingProgress {
    fn from(stored: StoredProgress) -> Self {
        match stored {
            StoredProgress::Detailed { scroll, paging } => ReadingProgress {
                scroll: sanitize(scroll),
                paging: sanitize(paging),
            },
            StoredProgress::Legacy(scroll) => ReadingProgress {
                scroll: sanitize(scroll),
                paging: 0.0,
            },
        }
    }
}

pub fn load_settings(store: &dyn KeyValueStore) -> ReaderSettings {
    store
        .get(SETTINGS_KEY)
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}

pub fn save_settings(store: &mut dyn KeyValueStore, settings: &ReaderSettings) {
    match serde_json::to_string(settings) {
        Ok(raw) => store.set(SETTINGS_KEY, &raw),
        Err(error) => warn!(%error, "could not serialize settings"),
    }
}

pub fn load_progress(store: &dyn KeyValueStore) -> HashMap<String, ReadingProgress> {
    store
        .get(PROGRESS_KEY)
        .and_then(|raw| serde_json::from_str::<HashMap<String, StoredProgress>>(&raw).ok())
        .map(|entries| {
            entries
                .into_iter()
                .map(|(chapter, stored)| (chapter, stored.into()))
                .collect()
        })
        .unwrap_or_default()
}

pub fn save_progress(store: &mut dyn KeyValueStore, progress: &HashMap<String, ReadingProgress>) {
    match serde_json::to_string(progress) {
        Ok(raw) => store.set(PROGRESS_KEY, &raw),
        Err(error) => warn!(%error, "could not serialize progress"),
    }
}

pub fn load_last_chapter(store: &dyn KeyValueStore) -> Option<String> {
    store.get(LAST_CHAPTER_KEY)
}

pub fn save_last_chapter(store: &mut dyn KeyValueStore, chapter_id: &str) {
    store.set(LAST_CHAPTER_KEY, chapter_id);
}

pub fn default_store_path(base: &Path) -> PathBuf {
    base.join("reader-store.json")
}
