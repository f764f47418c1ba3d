// Cache module for pull request lists.
// Time-bounded caching of source responses to avoid repeated az invocations.

pub mod entry;
pub mod manager;

pub use entry::CacheKey;
pub use manager::CacheManager;
