//! Durable storage for the learned correction dictionary.
//!
//! The dictionary is a single token-to-token mapping persisted whole under
//! one namespace key, loaded on first use and rewritten on every learning
//! event. Durability goes through the [`KeyValueStore`] seam; the shipped
//! backends are a JSON file store and an in-memory store for tests.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::Result;

/// Namespace key under which the correction mapping is stored.
pub const REPLACEMENTS_KEY: &str = "wordReplacements";

/// A single learned substitution. Keys are lowercase tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionEntry {
    pub misheard: String,
    pub corrected: String,
}

impl CorrectionEntry {
    pub fn new(misheard: &str, corrected: &str) -> Self {
        Self {
            misheard: misheard.to_lowercase(),
            corrected: corrected.to_lowercase(),
        }
    }
}

/// Durable key-value storage for opaque string values.
pub trait KeyValueStore: Send + Sync + 'static {
    fn load(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    fn save(&self, key: &str, value: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Key-value store writing one pretty-printed JSON file per key.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl KeyValueStore for JsonFileStore {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, key: &str, value: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.path_for(key), value).await?;
        Ok(())
    }
}

/// In-memory key-value store for tests and ephemeral runs.
///
/// Saves can be made to fail on demand to exercise the non-fatal
/// persistence path.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    fail_saves: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent save fail with an I/O error.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

impl KeyValueStore for MemoryStore {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(std::io::Error::other("simulated save failure").into());
        }
        self.values
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// The process-wide correction dictionary.
///
/// Loaded from the backing store on first use; every upsert batch is applied
/// atomically under one lock and the full mapping is re-persisted. A failed
/// save is logged and otherwise ignored: the correction simply is not
/// remembered for the next session.
pub struct CorrectionStore<S: KeyValueStore> {
    kv: S,
    entries: Mutex<Option<HashMap<String, String>>>,
}

impl<S: KeyValueStore> CorrectionStore<S> {
    pub fn new(kv: S) -> Self {
        Self {
            kv,
            entries: Mutex::new(None),
        }
    }

    /// Look up the learned replacement for a token, if any.
    pub async fn lookup(&self, token: &str) -> Option<String> {
        let mut guard = self.entries.lock().await;
        self.ensure_loaded(&mut guard).await;
        guard
            .as_ref()
            .and_then(|map| map.get(token))
            .cloned()
    }

    /// An owned snapshot of the whole mapping, for pure consumers.
    pub async fn load_all(&self) -> HashMap<String, String> {
        let mut guard = self.entries.lock().await;
        self.ensure_loaded(&mut guard).await;
        guard.as_ref().cloned().unwrap_or_default()
    }

    /// Number of entries currently in the dictionary.
    pub async fn len(&self) -> usize {
        let mut guard = self.entries.lock().await;
        self.ensure_loaded(&mut guard).await;
        guard.as_ref().map(HashMap::len).unwrap_or(0)
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Upsert a single entry and persist.
    pub async fn upsert(&self, entry: CorrectionEntry) {
        self.upsert_all(vec![entry]).await;
    }

    /// Apply a batch of entries atomically, then persist the full mapping.
    ///
    /// Entries within one batch apply in order, so the last write for a
    /// repeated key wins; batches from concurrent callers serialize on the
    /// store lock. Returns the number of entries applied.
    pub async fn upsert_all(&self, batch: Vec<CorrectionEntry>) -> usize {
        if batch.is_empty() {
            return 0;
        }

        let mut guard = self.entries.lock().await;
        self.ensure_loaded(&mut guard).await;

        let map = guard.get_or_insert_with(HashMap::new);
        let applied = batch.len();
        for entry in batch {
            debug!(
                misheard = %entry.misheard,
                corrected = %entry.corrected,
                "learned correction"
            );
            map.insert(entry.misheard, entry.corrected);
        }

        self.persist_locked(map).await;
        applied
    }

    /// Persist the current mapping to the backing store.
    pub async fn persist(&self) {
        let mut guard = self.entries.lock().await;
        self.ensure_loaded(&mut guard).await;
        let map = guard.get_or_insert_with(HashMap::new);
        self.persist_locked(map).await;
    }

    async fn persist_locked(&self, map: &HashMap<String, String>) {
        let json = match serde_json::to_string_pretty(map) {
            Ok(json) => json,
            Err(e) => {
                warn!("failed to serialize correction dictionary: {e}");
                return;
            }
        };

        if let Err(e) = self.kv.save(REPLACEMENTS_KEY, &json).await {
            warn!("failed to persist correction dictionary: {e}");
        }
    }

    /// Load the mapping from the backing store on first touch. A missing or
    /// unreadable value yields an empty dictionary rather than an error.
    async fn ensure_loaded(&self, guard: &mut Option<HashMap<String, String>>) {
        if guard.is_some() {
            return;
        }

        let loaded = match self.kv.load(REPLACEMENTS_KEY).await {
            Ok(Some(contents)) => match serde_json::from_str(&contents) {
                Ok(map) => map,
                Err(e) => {
                    warn!("failed to parse correction dictionary, starting empty: {e}");
                    HashMap::new()
                }
            },
            Ok(None) => HashMap::new(),
            Err(e) => {
                warn!("failed to read correction dictionary, starting empty: {e}");
                HashMap::new()
            }
        };

        debug!(entries = loaded.len(), "correction dictionary loaded");
        *guard = Some(loaded);
    }
}
