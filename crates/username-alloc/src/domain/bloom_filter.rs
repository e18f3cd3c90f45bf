//! Core membership filter implementation
//!
//! A space-efficient probabilistic structure answering "was this username
//! ever added?" with no false negatives and a bounded false positive rate.
//! The authoritative store remains the source of truth; the filter only
//! exists to avoid an existence query on the hot path.

use bitvec::prelude::*;
use serde::{Deserialize, Serialize};

use super::hash_functions::compute_hash_positions;
use super::parameters::{calculate_fpr, optimal_parameters};
use crate::error::ConfigError;

/// Bloom filter for probabilistic username membership testing
///
/// False positives are possible, false negatives are not. `m` (bits) and
/// `k` (hash functions) are derived once from the capacity and target error
/// rate at construction and never change for the lifetime of a snapshot;
/// resizing means a full rebuild, not an in-place migration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BloomFilter {
    /// Bit array storing the filter state
    #[serde(with = "bitvec_serde")]
    bits: BitVec<u8, Lsb0>,
    /// Number of hash functions (k)
    k: usize,
    /// Size in bits (m)
    m: usize,
    /// Number of distinct elements inserted (n)
    n: usize,
    /// Configured capacity the parameters were derived from
    capacity: usize,
    /// Target false positive rate the parameters were derived from
    error_rate: f64,
}

/// Serde support for BitVec
mod bitvec_serde {
    use bitvec::prelude::*;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(bits: &BitVec<u8, Lsb0>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let bytes: Vec<u8> = bits.as_raw_slice().to_vec();
        (bytes, bits.len()).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BitVec<u8, Lsb0>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (bytes, len): (Vec<u8>, usize) = Deserialize::deserialize(deserializer)?;
        let mut bits = BitVec::<u8, Lsb0>::from_vec(bytes);
        bits.truncate(len);
        Ok(bits)
    }
}

/// Read-only introspection of a filter's state
#[derive(Clone, Debug, PartialEq)]
pub struct FilterStats {
    /// Number of distinct elements inserted
    pub item_count: usize,
    /// Configured capacity
    pub capacity: usize,
    /// Configured target false positive rate
    pub error_rate: f64,
    /// Estimated false positive rate at current occupancy
    pub estimated_false_positive_rate: f64,
    /// Number of bits currently set
    pub bits_set: usize,
    /// Filter size in bits
    pub size_bits: usize,
    /// Number of hash functions
    pub hash_count: usize,
}

impl BloomFilter {
    /// Create a new filter sized for `capacity` elements at `error_rate`
    ///
    /// # Arguments
    /// * `capacity` - Expected number of distinct elements (must be > 0)
    /// * `error_rate` - Target false positive rate (must be in (0, 1))
    pub fn with_rate(capacity: usize, error_rate: f64) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::InvalidCapacity(capacity));
        }
        if !(error_rate > 0.0 && error_rate < 1.0) {
            return Err(ConfigError::InvalidErrorRate(error_rate));
        }

        let params = optimal_parameters(capacity, error_rate);
        Ok(Self {
            bits: bitvec![u8, Lsb0; 0; params.size_bits],
            k: params.hash_count,
            m: params.size_bits,
            n: 0,
            capacity,
            error_rate,
        })
    }

    /// Insert a username into the filter
    ///
    /// After insertion, `may_contain(item)` is guaranteed to return true:
    /// no false negatives, ever.
    ///
    /// Returns `true` if the insertion flipped at least one bit. Re-adding
    /// an element whose bits are all set leaves the element count unchanged,
    /// so repeated adds of the same normalized name do not double count.
    pub fn insert(&mut self, item: &str) -> bool {
        let positions = compute_hash_positions(item.as_bytes(), self.k, self.m);
        let mut newly_set = false;
        for pos in positions {
            if !self.bits[pos] {
                self.bits.set(pos, true);
                newly_set = true;
            }
        }
        if newly_set {
            self.n += 1;
        }
        newly_set
    }

    /// Insert a page of usernames, returning how many were new
    pub fn insert_bulk<I, T>(&mut self, items: I) -> usize
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut inserted = 0;
        for item in items {
            if self.insert(item.as_ref()) {
                inserted += 1;
            }
        }
        inserted
    }

    /// Test whether a username might be in the filter
    ///
    /// Returns:
    /// - `true` if the element might be in the set (could be false positive)
    /// - `false` if the element is definitely NOT in the set (never false negative)
    pub fn may_contain(&self, item: &str) -> bool {
        let positions = compute_hash_positions(item.as_bytes(), self.k, self.m);
        positions.iter().all(|&pos| self.bits[pos])
    }

    /// Estimate the current false positive rate
    ///
    /// Formula: FPR = (1 - e^(-kn/m))^k. Beyond capacity the real rate
    /// degrades past the configured target; that is accepted, not an error.
    pub fn false_positive_rate(&self) -> f64 {
        calculate_fpr(self.m, self.n, self.k)
    }

    /// Read-only snapshot of the filter's parameters and occupancy
    pub fn stats(&self) -> FilterStats {
        FilterStats {
            item_count: self.n,
            capacity: self.capacity,
            error_rate: self.error_rate,
            estimated_false_positive_rate: self.false_positive_rate(),
            bits_set: self.bits_set(),
            size_bits: self.m,
            hash_count: self.k,
        }
    }

    /// Get the number of bits set in the filter
    pub fn bits_set(&self) -> usize {
        self.bits.count_ones()
    }

    /// Get the filter size in bits
    pub fn size_bits(&self) -> usize {
        self.m
    }

    /// Get the number of hash functions
    pub fn hash_count(&self) -> usize {
        self.k
    }

    /// Get the number of distinct elements inserted
    pub fn item_count(&self) -> usize {
        self.n
    }

    /// Get the configured capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get the configured target false positive rate
    pub fn error_rate(&self) -> f64 {
        self.error_rate
    }
}
