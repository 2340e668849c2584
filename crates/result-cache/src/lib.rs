//! Generic time-to-live key/value caching for the terms-gate project.
//!
//! This crate provides the small, shared caching primitives used by the
//! resolution engine: [`TtlCache`], a mutex-guarded map whose entries expire
//! after a fixed duration, and [`TtlSlot`], its single-value counterpart for
//! globally scoped results.
//!
//! Entries are dropped lazily on access; there is no background sweeper.
//! Races between `get` and `set` cost at most a redundant recomputation on
//! the caller's side, never a wrong value.
//!
//! # Quick start
//!
//! ```rust
//! use std::time::Duration;
//! use result_cache::TtlCache;
//!
//! let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(30));
//! cache.set("answer".to_string(), 42);
//! assert_eq!(cache.get(&"answer".to_string()), Some(42));
//! ```

mod cache;
mod slot;

pub use cache::TtlCache;
pub use slot::TtlSlot;
