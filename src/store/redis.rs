//! Redis-backed session store.

use super::{SessionStore, StoreError};
use async_trait::async_trait;
use ::redis::{aio::ConnectionManager, AsyncCommands, Client, RedisResult};
use std::{future::Future, time::Duration};
use tokio::sync::OnceCell;
use tracing::{debug, instrument, warn};

pub struct RedisStore {
    client: Client,
    connection: OnceCell<ConnectionManager>,
    timeout: Duration,
}

impl RedisStore {
    /// Create a store for `url` without connecting.
    ///
    /// # Errors
    /// Returns [`StoreError::Unavailable`] if the URL is not a valid redis URL.
    pub fn new(url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::open(url).map_err(|e| StoreError::Unavailable(Box::new(e)))?;
        Ok(Self {
            client,
            connection: OnceCell::new(),
            timeout,
        })
    }

    /// Shared connection, established on first use.
    ///
    /// A failed attempt leaves the cell empty so the next caller retries.
    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                debug!("connecting to session store");
                bounded(self.timeout, self.client.get_connection_manager())
                    .await
                    .map_err(|err| {
                        warn!("session store connection failed: {err}");
                        StoreError::Unavailable(Box::new(err))
                    })
            })
            .await?;
        Ok(manager.clone())
    }
}

async fn bounded<T, F>(timeout: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = RedisResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(StoreError::Backend(Box::new(err))),
        Err(_) => Err(StoreError::Timeout(timeout)),
    }
}

#[async_trait]
impl SessionStore for RedisStore {
    #[instrument(skip_all, fields(ttl_ms = tracing::field::Empty))]
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        if millis == 0 {
            return Err(StoreError::InvalidTtl);
        }
        tracing::Span::current().record("ttl_ms", millis);

        let mut conn = self.connection().await?;
        let () = bounded(self.timeout, conn.pset_ex(key, value, millis)).await?;
        Ok(())
    }

    #[instrument(skip_all)]
    async fn get(&self, key: &str) -> Result<String, StoreError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = bounded(self.timeout, conn.get(key)).await?;
        value.ok_or(StoreError::NotFound)
    }

    #[instrument(skip_all, fields(keys = keys.len()))]
    async fn delete(&self, keys: &[String]) -> Result<u64, StoreError> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.connection().await?;
        let removed: u64 = bounded(self.timeout, conn.del(keys.to_vec())).await?;
        Ok(removed)
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("connected", &self.connection.initialized())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_redis_url() {
        let result = RedisStore::new("http://localhost:6379", Duration::from_secs(1));
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn zero_ttl_rejected_before_connecting() -> Result<(), StoreError> {
        let store = RedisStore::new("redis://127.0.0.1:1/0", Duration::from_millis(200))?;
        let result = store.set("key", "value", Duration::ZERO).await;
        assert!(matches!(result, Err(StoreError::InvalidTtl)));
        assert!(!store.connection.initialized());
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_store_is_unavailable_and_retryable() -> Result<(), StoreError> {
        // Port 1 is reserved; nothing listens there.
        let store = RedisStore::new("redis://127.0.0.1:1/0", Duration::from_millis(200))?;

        let first = store.get("missing").await;
        assert!(matches!(first, Err(StoreError::Unavailable(_))));
        assert!(!store.connection.initialized());

        let second = store.delete(&["missing".to_string()]).await;
        assert!(matches!(second, Err(StoreError::Unavailable(_))));
        Ok(())
    }
}
