//! Typed key-value access over the connection pool
//!
//! Write operations report failures to the caller. Read operations come in
//! two forms: `try_*` returns found / missing / error separately, while the
//! plain `get_*` forms are total and fold a missing key or any store error
//! into a default value (`""` or `0`), logging the error.

use std::sync::Arc;

use crate::common::{Error, Result};
use crate::store::{Connector, Pool, PoolConfig, PoolStats};

/// Key-value client. Cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct KvClient {
    pool: Pool,
}

impl KvClient {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn with_connector(connector: Arc<dyn Connector>, config: PoolConfig) -> Self {
        Self::new(Pool::new(connector, config))
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Atomically increment `key` by one. A missing key counts from 0.
    pub async fn incr(&self, key: &str) -> Result<()> {
        self.incr_by_one(key).await.map(|_| ())
    }

    /// Like [`incr`](Self::incr), returning the value after the increment.
    pub async fn incr_by_one(&self, key: &str) -> Result<i64> {
        let mut conn = self.pool.get().await?;
        tracing::debug!(key, "INCR");
        conn.incr(key).await
    }

    pub async fn set_string(&self, key: &str, val: &str) -> Result<()> {
        let mut conn = self.pool.get().await?;
        tracing::debug!(key, "SET");
        conn.set(key, val).await
    }

    /// Store `val` in base-10 text so `incr` can operate on it.
    pub async fn set_integer(&self, key: &str, val: i64) -> Result<()> {
        self.set_string(key, &val.to_string()).await
    }

    pub async fn try_get_string(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.pool.get().await?;
        tracing::debug!(key, "GET");
        conn.get(key).await
    }

    pub async fn try_get_integer(&self, key: &str) -> Result<Option<i64>> {
        match self.try_get_string(key).await? {
            Some(value) => match value.parse::<i64>() {
                Ok(n) => Ok(Some(n)),
                Err(_) => Err(Error::NotAnInteger {
                    key: key.to_string(),
                    value,
                }),
            },
            None => Ok(None),
        }
    }

    /// Value at `key`, or `""` when the key is missing or the read failed.
    pub async fn get_string(&self, key: &str) -> String {
        match self.try_get_string(key).await {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(key, error = %e, "something wrong reading string value");
                String::new()
            }
        }
    }

    /// Integer at `key`, or `0` when the key is missing, not numeric, or the read failed.
    pub async fn get_integer(&self, key: &str) -> i64 {
        match self.try_get_integer(key).await {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(key, error = %e, "something wrong reading integer value");
                0
            }
        }
    }

    /// Erase every key. Errors are logged and dropped.
    pub async fn flush_all(&self) {
        let result = match self.pool.get().await {
            Ok(mut conn) => conn.flush_all().await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "FLUSHALL failed");
        }
    }

    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.pool.get().await?;
        conn.ping().await
    }
}
