//! Service Layer
//!
//! Contains the application services that orchestrate domain logic
//! and coordinate with the external collaborators via ports.

pub mod allocator;
pub mod lifecycle;
pub mod strategies;

pub use allocator::UsernameAllocator;
pub use lifecycle::{CacheState, CacheWarmer, MembershipCell, ReconciliationGuard};
pub use strategies::Strategy;
