//! Cache configuration and validation
//!
//! The configuration surface is read once at cache construction; changing
//! any of it requires a full reinitialization, not live reconfiguration.
//!
//! # Example
//!
//! ```ignore
//! use username_alloc::CacheConfigBuilder;
//!
//! let config = CacheConfigBuilder::new()
//!     .capacity(2_000_000)
//!     .error_rate(0.005)
//!     .build()
//!     .expect("valid config");
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Membership cache configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Expected number of distinct usernames (n)
    pub capacity: usize,
    /// Target false positive rate (p), in (0, 1)
    pub error_rate: f64,
    /// Rows fetched per page during a cold-start scan
    pub page_size: usize,
    /// Key the serialized snapshot is stored under
    pub snapshot_key: String,
    /// Maximum normalized username length
    pub max_username_len: usize,
    /// Growth headroom multiplier applied to the authority row count
    /// when sizing a rebuilt filter
    pub warm_headroom: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1_000_000,
            error_rate: 0.01,
            page_size: 1_000,
            snapshot_key: "username_alloc::snapshot::v1".to_string(),
            max_username_len: 24,
            warm_headroom: 2.5,
        }
    }
}

impl CacheConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::InvalidCapacity(self.capacity));
        }
        if !(self.error_rate > 0.0 && self.error_rate < 1.0) {
            return Err(ConfigError::InvalidErrorRate(self.error_rate));
        }
        if self.page_size == 0 {
            return Err(ConfigError::InvalidParameter(
                "page_size cannot be 0".to_string(),
            ));
        }
        if self.snapshot_key.is_empty() {
            return Err(ConfigError::InvalidParameter(
                "snapshot_key cannot be empty".to_string(),
            ));
        }
        if self.max_username_len == 0 {
            return Err(ConfigError::InvalidParameter(
                "max_username_len cannot be 0".to_string(),
            ));
        }
        if self.warm_headroom < 1.0 {
            return Err(ConfigError::InvalidParameter(
                "warm_headroom must be at least 1.0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for CacheConfig with validation
#[derive(Default)]
pub struct CacheConfigBuilder {
    capacity: Option<usize>,
    error_rate: Option<f64>,
    page_size: Option<usize>,
    snapshot_key: Option<String>,
    max_username_len: Option<usize>,
    warm_headroom: Option<f64>,
}

impl CacheConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the expected number of distinct usernames
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Set the target false positive rate (must be in (0, 1))
    pub fn error_rate(mut self, rate: f64) -> Self {
        self.error_rate = Some(rate);
        self
    }

    /// Set the cold-start scan page size
    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Set the snapshot storage key
    pub fn snapshot_key(mut self, key: impl Into<String>) -> Self {
        self.snapshot_key = Some(key.into());
        self
    }

    /// Set the maximum normalized username length
    pub fn max_username_len(mut self, len: usize) -> Self {
        self.max_username_len = Some(len);
        self
    }

    /// Set the rebuild sizing headroom multiplier
    pub fn warm_headroom(mut self, headroom: f64) -> Self {
        self.warm_headroom = Some(headroom);
        self
    }

    /// Build the CacheConfig, validating all parameters
    pub fn build(self) -> Result<CacheConfig, ConfigError> {
        let defaults = CacheConfig::default();

        let config = CacheConfig {
            capacity: self.capacity.unwrap_or(defaults.capacity),
            error_rate: self.error_rate.unwrap_or(defaults.error_rate),
            page_size: self.page_size.unwrap_or(defaults.page_size),
            snapshot_key: self.snapshot_key.unwrap_or(defaults.snapshot_key),
            max_username_len: self.max_username_len.unwrap_or(defaults.max_username_len),
            warm_headroom: self.warm_headroom.unwrap_or(defaults.warm_headroom),
        };

        config.validate()?;
        Ok(config)
    }
}
