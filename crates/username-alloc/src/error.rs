//! Error types for the username allocation subsystem
//!
//! Propagation policy: anything touching the membership filter or the
//! snapshot store degrades gracefully (`SnapshotError` becomes a cache miss,
//! `PersistenceError` is logged and swallowed). Anything touching the
//! authoritative store during a decisive availability check is surfaced,
//! because silently guessing would risk allocating a duplicate name.

use thiserror::Error;

/// Invalid construction parameters
///
/// Fatal to the construction call only; never observed at request time.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid capacity: {0} (must be greater than zero)")]
    InvalidCapacity(usize),

    #[error("invalid error rate: {0} (must be within (0, 1))")]
    InvalidErrorRate(f64),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Snapshot blob is malformed or version-incompatible
///
/// Non-fatal: callers treat a failed decode as a cache miss and fall back
/// to a cold-start rebuild.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot blob is not valid hex: {0}")]
    InvalidEncoding(String),

    #[error("unsupported snapshot version: {found} (supported: {supported})")]
    UnsupportedVersion { found: u16, supported: u16 },

    #[error("snapshot does not carry the expected magic bytes")]
    BadMagic,

    #[error("snapshot body decode failed: {0}")]
    Corrupt(String),

    #[error("snapshot encode failed: {0}")]
    Encode(String),
}

/// Authoritative store unreachable or query failure
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store connection error: {0}")]
    Connection(String),

    #[error("store query error: {0}")]
    Query(String),

    #[error("store timeout")]
    Timeout,
}

/// Snapshot persistence unreachable or write failure
///
/// Always non-fatal and logged, never surfaced to callers; the cache
/// remains usable in memory and a missed snapshot only costs a future
/// cold-start rebuild.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("persistence connection error: {0}")]
    Connection(String),

    #[error("persistence write rejected")]
    WriteRejected,
}

/// Top-level errors surfaced by allocation and suggestion operations
#[derive(Debug, Error)]
pub enum AllocError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("authoritative store error: {0}")]
    Store(#[from] StoreError),

    #[error("cache initialization failed: {0}")]
    Init(String),
}
