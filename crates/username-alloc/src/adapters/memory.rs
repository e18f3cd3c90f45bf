//! In-memory reference adapters for both driven ports
//!
//! Useful for tests and for embedding applications that want a
//! self-contained directory. Both carry failure toggles so degraded-mode
//! behavior can be exercised deterministically.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{PersistenceError, StoreError};
use crate::ports::{AuthoritativeStore, SnapshotStore};

/// BTreeSet-backed authoritative store
///
/// Names are folded to lower case on insert, so the case-insensitive
/// existence contract holds by construction, and pagination order is
/// deterministic.
#[derive(Default)]
pub struct InMemoryDirectory {
    names: RwLock<BTreeSet<String>>,
    failing: AtomicBool,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory pre-populated with the given names
    pub fn with_names<I, T>(names: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let set: BTreeSet<String> = names
            .into_iter()
            .map(|name| name.as_ref().to_lowercase())
            .collect();
        Self {
            names: RwLock::new(set),
            failing: AtomicBool::new(false),
        }
    }

    /// Record a name (the surrounding application's "user created" step)
    pub async fn insert(&self, name: &str) -> bool {
        self.names.write().await.insert(name.to_lowercase())
    }

    pub async fn len(&self) -> usize {
        self.names.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.names.read().await.is_empty()
    }

    /// Make every subsequent call fail with a connection error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_up(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Connection(
                "in-memory directory marked failing".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AuthoritativeStore for InMemoryDirectory {
    async fn exists_case_insensitive(&self, name: &str) -> Result<bool, StoreError> {
        self.check_up()?;
        Ok(self.names.read().await.contains(&name.to_lowercase()))
    }

    async fn count_all(&self) -> Result<u64, StoreError> {
        self.check_up()?;
        Ok(self.names.read().await.len() as u64)
    }

    async fn list_page(&self, offset: u64, limit: usize) -> Result<Vec<String>, StoreError> {
        self.check_up()?;
        Ok(self
            .names
            .read()
            .await
            .iter()
            .skip(offset as usize)
            .take(limit)
            .cloned()
            .collect())
    }
}

/// HashMap-backed snapshot store with a connectivity toggle
pub struct InMemorySnapshotStore {
    blobs: RwLock<HashMap<String, String>>,
    connected: AtomicBool,
    reject_writes: AtomicBool,
    writes: AtomicU64,
}

impl Default for InMemorySnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            connected: AtomicBool::new(true),
            reject_writes: AtomicBool::new(false),
            writes: AtomicU64::new(0),
        }
    }

    /// Toggle simulated connectivity
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Make writes report best-effort failure (`Ok(false)`) while reads
    /// keep working
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Number of successful writes observed
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(PersistenceError::Connection(
                "in-memory snapshot store disconnected".to_string(),
            ));
        }
        Ok(self.blobs.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, blob: String) -> Result<bool, PersistenceError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(PersistenceError::Connection(
                "in-memory snapshot store disconnected".to_string(),
            ));
        }
        if self.reject_writes.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.blobs.write().await.insert(key.to_string(), blob);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}
