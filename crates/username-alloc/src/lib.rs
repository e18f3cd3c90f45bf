//! # username-alloc
//!
//! Probabilistic username uniqueness cache and collision-free allocator.
//!
//! Allocates usernames at high request volume without a database existence
//! query on every check: a Bloom filter synchronized with the authoritative
//! store answers the common case in memory, and the store is consulted only
//! to accept a name or resolve a cache ambiguity. The cache is advisory;
//! the store is ground truth.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): Pure logic, no I/O
//!   - `BloomFilter`: the membership structure (no false negatives)
//!   - `snapshot`: versioned snapshot codec
//!   - `normalize`: candidate normalization
//!   - `CacheConfig` / `CacheConfigBuilder`: configuration with validation
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `AllocatorApi`: driving port (inbound API)
//!   - `AuthoritativeStore`, `SnapshotStore`: driven ports (injected
//!     collaborators)
//!
//! - **Service Layer** (`service/`): Orchestration
//!   - `ReconciliationGuard` + `CacheWarmer`: single-flight lifecycle,
//!     restore-or-rebuild, snapshot flush
//!   - `UsernameAllocator`: unique allocation and suggestion generation
//!
//! - **Adapters Layer** (`adapters/`): In-memory reference adapters
//!
//! ## Invariants
//!
//! - No false negatives: once a name is added, `may_contain` returns true.
//! - A name is only ever accepted on the authority's word; the cache alone
//!   never accepts.
//! - Exactly one initialization sequence runs at a time; concurrent
//!   cold-start callers share one table scan.
//!
//! ## Usage Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use username_alloc::{
//!     AllocatorApi, CacheConfig, InMemoryDirectory, InMemorySnapshotStore,
//!     ReconciliationGuard, UsernameAllocator, DEFAULT_MAX_RANDOM_RETRIES,
//! };
//!
//! let authority = Arc::new(InMemoryDirectory::new());
//! let snapshots = Arc::new(InMemorySnapshotStore::new());
//! let guard = Arc::new(ReconciliationGuard::new(
//!     Arc::clone(&authority),
//!     snapshots,
//!     CacheConfig::default(),
//! )?);
//! guard.initialize().await?;
//!
//! let allocator = UsernameAllocator::new(authority, Arc::clone(&guard));
//! let name = allocator.allocate_unique("John Doe", DEFAULT_MAX_RANDOM_RETRIES).await?;
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-exports for convenience
pub use adapters::{InMemoryDirectory, InMemorySnapshotStore};
pub use domain::{BloomFilter, CacheConfig, CacheConfigBuilder, FilterStats};
pub use error::{AllocError, ConfigError, PersistenceError, SnapshotError, StoreError};
pub use metrics::{Metrics, MetricsSnapshot};
pub use ports::{
    AllocatorApi, AuthoritativeStore, SnapshotStore, DEFAULT_MAX_RANDOM_RETRIES,
    DEFAULT_MAX_SUGGESTIONS,
};
pub use service::{CacheState, CacheWarmer, MembershipCell, ReconciliationGuard, UsernameAllocator};
