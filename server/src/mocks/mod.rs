//! In-memory test doubles for the storage and cache collaborators.
//!
//! These run the check-in pipeline at memory speed: no Postgres, no
//! Redis. `MemoryStore` enforces the same (event, user) uniqueness
//! invariant as the real schema; `MemoryCache` can be flipped into an
//! "unavailable" state to exercise the cache-failure-is-a-miss policy.

pub mod cache;
pub mod store;

pub use cache::MemoryCache;
pub use store::MemoryStore;
