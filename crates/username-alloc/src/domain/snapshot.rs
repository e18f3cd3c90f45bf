//! Versioned snapshot codec for the membership filter
//!
//! A snapshot is a self-describing encoding of the full filter state
//! (bit vector plus derivation parameters), sufficient to reconstruct an
//! equivalent filter on a later process start. The snapshot store treats
//! the blob as opaque text; this module owns encode/decode.
//!
//! Layout: a bincoded envelope of magic bytes, a format version, and the
//! filter body, hex-armored because the persistence port carries `String`
//! blobs. Decode failures of any kind are `SnapshotError` and are treated
//! upstream as a cache miss, never as a fatal condition.

use serde::{Deserialize, Serialize};

use super::bloom_filter::BloomFilter;
use crate::error::SnapshotError;

/// Identifies a blob as one of ours before any version check
const SNAPSHOT_MAGIC: [u8; 4] = *b"UACS";

/// Bumped whenever the envelope or filter body layout changes
const SNAPSHOT_VERSION: u16 = 1;

#[derive(Serialize, Deserialize)]
struct SnapshotEnvelope {
    magic: [u8; 4],
    version: u16,
    filter: BloomFilter,
}

/// Serialize a filter into a hex-armored snapshot blob
pub fn encode(filter: &BloomFilter) -> Result<String, SnapshotError> {
    let envelope = SnapshotEnvelope {
        magic: SNAPSHOT_MAGIC,
        version: SNAPSHOT_VERSION,
        filter: filter.clone(),
    };
    let bytes = bincode::serialize(&envelope).map_err(|e| SnapshotError::Encode(e.to_string()))?;
    Ok(hex::encode(bytes))
}

/// Reconstruct a filter from a snapshot blob
///
/// Round-trip guarantee: the decoded filter answers `may_contain`
/// identically to the encoded one for every previously added item.
pub fn decode(blob: &str) -> Result<BloomFilter, SnapshotError> {
    let bytes = hex::decode(blob).map_err(|e| SnapshotError::InvalidEncoding(e.to_string()))?;
    let envelope: SnapshotEnvelope =
        bincode::deserialize(&bytes).map_err(|e| SnapshotError::Corrupt(e.to_string()))?;

    if envelope.magic != SNAPSHOT_MAGIC {
        return Err(SnapshotError::BadMagic);
    }
    if envelope.version != SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion {
            found: envelope.version,
            supported: SNAPSHOT_VERSION,
        });
    }

    Ok(envelope.filter)
}
