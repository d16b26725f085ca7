//! Session record storage.
//!
//! Keys are opaque session identifiers, values are JSON identity snapshots.
//! Every record carries a store-native TTL; a missing or expired key is
//! reported as [`StoreError::NotFound`] so callers can tell "unknown session"
//! apart from "store unreachable".

pub mod memory;
pub mod redis;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

use crate::clock::Clock;
use async_trait::async_trait;
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use url::Url;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session not found")]
    NotFound,
    #[error("session store unavailable")]
    Unavailable(#[source] BoxError),
    #[error("session store operation failed")]
    Backend(#[source] BoxError),
    #[error("session store operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("ttl must be greater than zero")]
    InvalidTtl,
    #[error("invalid session store url")]
    InvalidUrl(#[from] url::ParseError),
    #[error("unsupported session store url scheme: {0}")]
    UnsupportedScheme(String),
}

/// Key/value storage with per-key expiry.
///
/// Implementations must be safe for unsynchronized concurrent use; the same
/// handle is shared by every issuance call.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store `value` under `key` for `ttl`, overwriting unconditionally.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Fetch the value under `key`, or [`StoreError::NotFound`].
    async fn get(&self, key: &str) -> Result<String, StoreError>;

    /// Remove `keys`, returning how many existed.
    async fn delete(&self, keys: &[String]) -> Result<u64, StoreError>;
}

/// Build a store handle from a URL.
///
/// `redis://` and `rediss://` connect lazily on first use; `memory://` keeps
/// records in-process and only suits single-process tooling.
///
/// # Errors
/// Returns an error if the URL does not parse, the scheme is unsupported or
/// the redis client rejects it.
pub fn open(
    url: &str,
    timeout: Duration,
    clock: Arc<dyn Clock>,
) -> Result<Arc<dyn SessionStore>, StoreError> {
    let url = Url::parse(url)?;
    match url.scheme() {
        "redis" | "rediss" => Ok(Arc::new(RedisStore::new(url.as_str(), timeout)?)),
        "memory" => Ok(Arc::new(MemoryStore::new(clock))),
        other => Err(StoreError::UnsupportedScheme(other.to_string())),
    }
}
