//! Ports Layer
//!
//! Defines the interfaces (traits) for:
//! - Driving Ports (inbound) - API for external callers
//! - Driven Ports (outbound) - The authoritative store and the snapshot store

pub mod inbound;
pub mod outbound;

pub use inbound::{AllocatorApi, DEFAULT_MAX_RANDOM_RETRIES, DEFAULT_MAX_SUGGESTIONS};
pub use outbound::{AuthoritativeStore, SnapshotStore};
