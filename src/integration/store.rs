//! Persistence of configured entries.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::integration::flow::FLOW_VERSION;

/// Data collected by the config flow for one wallet.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryData {
    pub wallet_address: String,
    pub nickname: String,
    pub api_key: String,
}

impl std::fmt::Debug for EntryData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryData")
            .field("wallet_address", &self.wallet_address)
            .field("nickname", &self.nickname)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// A persisted, user-configured instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    /// Opaque identifier assigned at creation.
    pub entry_id: String,
    pub version: u32,
    pub title: String,
    pub data: EntryData,
    pub created_at: DateTime<Utc>,
}

/// Errors raised while reading or writing the store file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Thread-safe entry store, optionally backed by a JSON file.
#[derive(Debug, Clone, Default)]
pub struct EntryStore {
    inner: Arc<DashMap<String, ConfigEntry>>,
    persistence_path: Option<PathBuf>,
}

impl EntryStore {
    /// Create a new empty store.
    pub fn new(persistence_path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            persistence_path,
        }
    }

    /// Load from file if it exists; the path is kept for later saves.
    pub fn load_from_file(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let store = Self::new(Some(path.to_path_buf()));
        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let entries: Vec<ConfigEntry> = serde_json::from_reader(reader)?;
            for entry in entries {
                store.inner.insert(entry.entry_id.clone(), entry);
            }
            tracing::info!(
                path = %path.display(),
                entries = store.inner.len(),
                "Loaded config entries"
            );
        }
        Ok(store)
    }

    /// Save to the backing file, if any.
    pub fn save_to_file(&self) -> StoreResult<()> {
        if let Some(path) = &self.persistence_path {
            let writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(writer, &self.entries())?;
            tracing::debug!(path = %path.display(), entries = self.inner.len(), "Saved config entries");
        }
        Ok(())
    }

    /// Create and store a new entry.
    pub fn add(&self, title: impl Into<String>, data: EntryData) -> ConfigEntry {
        let entry = ConfigEntry {
            entry_id: uuid::Uuid::new_v4().simple().to_string(),
            version: FLOW_VERSION,
            title: title.into(),
            data,
            created_at: Utc::now(),
        };
        self.inner.insert(entry.entry_id.clone(), entry.clone());
        tracing::info!(entry_id = %entry.entry_id, title = %entry.title, "Config entry created");
        entry
    }

    pub fn remove(&self, entry_id: &str) -> Option<ConfigEntry> {
        let removed = self.inner.remove(entry_id).map(|(_, e)| e);
        if removed.is_some() {
            tracing::info!(entry_id = %entry_id, "Config entry removed");
        }
        removed
    }

    pub fn get(&self, entry_id: &str) -> Option<ConfigEntry> {
        self.inner.get(entry_id).map(|r| r.value().clone())
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> Vec<ConfigEntry> {
        let mut entries: Vec<_> = self.inner.iter().map(|r| r.value().clone()).collect();
        entries.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.entry_id.cmp(&b.entry_id))
        });
        entries
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
