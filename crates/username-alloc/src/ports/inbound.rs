//! Inbound Ports (Driving Ports)
//!
//! The API external callers (signup handlers, profile editors) use to
//! obtain collision-free usernames.

use async_trait::async_trait;

use crate::error::AllocError;

/// Default number of random-suffix attempts before the timestamp fallback
pub const DEFAULT_MAX_RANDOM_RETRIES: usize = 10;

/// Default number of alternatives returned when a requested name is taken
pub const DEFAULT_MAX_SUGGESTIONS: usize = 5;

/// Username allocation API (Driving Port)
#[async_trait]
pub trait AllocatorApi: Send + Sync {
    /// Allocate one guaranteed-unique username derived from `base`
    ///
    /// Tries the normalized base first, then up to `max_random_retries`
    /// random-suffixed variants, then an unconditionally accepted
    /// timestamp-suffixed fallback. Fails only when the authoritative
    /// store cannot answer the decisive availability check.
    async fn allocate_unique(
        &self,
        base: &str,
        max_random_retries: usize,
    ) -> Result<String, AllocError>;

    /// Produce up to `max_suggestions` distinct, verified-available
    /// alternatives for a taken username
    ///
    /// May legitimately return fewer entries (including none) when the
    /// strategies exhaust their budgets; partial results are still useful.
    async fn generate_suggestions(
        &self,
        base: &str,
        max_suggestions: usize,
    ) -> Result<Vec<String>, AllocError>;
}
