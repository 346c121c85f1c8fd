//! Typed Key-Value persistence for the storefront cart.
//!
//! Provides a small API for keeping serializable values in a string-keyed
//! store with automatic JSON serialization. Two stores ship with the crate:
//! an in-memory one and a directory of files that survives restarts.
//!
//! # Example
//!
//! ```rust,ignore
//! use shop_cache::{cache_key, Cache};
//!
//! let cache = Cache::open_dir(".shop")?;
//! let key = cache_key!("storefront", "cart");
//!
//! cache.set(&key, &lines)?;
//! let lines: Option<Vec<CartLine>> = cache.get(&key)?;
//! cache.delete(&key)?;
//! ```

mod error;
mod kv;
mod store;

pub use error::CacheError;
pub use kv::Cache;
pub use store::{FileStore, KvStore, MemoryStore};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{Cache, CacheError, FileStore, KvStore, MemoryStore};
}
