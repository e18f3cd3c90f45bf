//! Outbound Ports (Driven Ports)
//!
//! These traits define the two external collaborators the allocation core
//! depends on. Both are owned by the surrounding application and injected
//! as capabilities; this crate never constructs the real ones.

use async_trait::async_trait;

use crate::error::{PersistenceError, StoreError};

/// The relational source of truth for existing usernames (Driven Port)
///
/// Its existence answer is always correct. The membership cache is advisory
/// only: cross-instance uniqueness is guaranteed solely by this store.
#[async_trait]
pub trait AuthoritativeStore: Send + Sync {
    /// Case-insensitive existence check for a username
    async fn exists_case_insensitive(&self, name: &str) -> Result<bool, StoreError>;

    /// Total number of usernames on record
    async fn count_all(&self) -> Result<u64, StoreError>;

    /// Fetch one page of existing usernames, ordered deterministically
    ///
    /// A page shorter than `limit` (including an empty one) terminates
    /// pagination.
    async fn list_page(&self, offset: u64, limit: usize) -> Result<Vec<String>, StoreError>;
}

/// Key/value blob store used to persist and restore cache snapshots
/// (Driven Port)
///
/// The blob is opaque to the store; the snapshot codec owns its layout.
/// Every failure here is best-effort territory: a lost snapshot only costs
/// a future cold-start rebuild.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Liveness check; restore is skipped when the store is down
    async fn is_connected(&self) -> bool;

    /// Fetch a previously stored blob, `None` on miss
    async fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Store a blob; `Ok(false)` signals a non-fatal best-effort failure
    async fn set(&self, key: &str, blob: String) -> Result<bool, PersistenceError>;
}
