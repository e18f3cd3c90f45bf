//! Adapters Layer (Driven Adapters)
//!
//! In-memory implementations of the driven ports. Production deployments
//! inject their own adapters (a relational store, a key/value service);
//! these exist for tests and self-contained embeddings.

pub mod memory;

pub use memory::{InMemoryDirectory, InMemorySnapshotStore};
