//! Key-value storage boundary for OmniStore.
//!
//! Every durable piece of storefront state (products, carts, sessions, OTP
//! challenges, users, orders) lives behind the [`KvStore`] trait. Values are
//! JSON documents written through the typed [`Cache`] wrapper.
//!
//! Two backends ship with the crate:
//!
//! - [`MemoryStore`] - shared in-process map, used by tests and embedders
//! - [`FileStore`] - a single JSON file, used by the `omni` CLI
//!
//! Both provide an atomic [`KvStore::compare_and_swap`], which is the
//! serialization point for read-modify-write updates such as stock
//! adjustments.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use omni_cache::{Cache, MemoryStore};
//!
//! let cache = Cache::new(Arc::new(MemoryStore::new()));
//!
//! cache.set("cart:sess_abc", &lines).await?;
//! let lines: Option<Vec<CartLine>> = cache.get("cart:sess_abc").await?;
//!
//! // Optimistic read-modify-write
//! cache
//!     .update::<u32, _, CacheError>("counter", |n| Ok(Some(n.unwrap_or(0) + 1)))
//!     .await?;
//! ```

pub mod clock;
mod error;
mod file;
#[cfg(any(test, feature = "test-util"))]
pub mod flaky;
mod memory;
mod session;
mod store;

pub use clock::{system_clock, Clock, ManualClock, SharedClock, SystemClock};
pub use error::{CacheError, ErrorKind};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use session::{Session, SessionData, SessionId};
pub use store::{Cache, KvStore, MAX_UPDATE_RETRIES};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        Cache, CacheError, ErrorKind, FileStore, KvStore, MemoryStore, Session, SessionId,
    };
}

/// Helper to build cache keys with namespacing.
///
/// # Example
///
/// ```rust
/// let key = omni_cache::cache_key!("order", "user-1", "ORD-42");
/// assert_eq!(key, "order:user-1:ORD-42");
/// ```
#[macro_export]
macro_rules! cache_key {
    ($prefix:expr, $($part:expr),+) => {{
        let mut key = String::from($prefix);
        $(
            key.push(':');
            key.push_str(&$part.to_string());
        )+
        key
    }};
}
