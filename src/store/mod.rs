//! Store access: connection traits, the idle pool, and the backends
//!
//! A [`Connector`] dials new [`Connection`]s; the [`Pool`] keeps a bounded
//! number of idle ones around and hands them out as [`PooledConnection`]
//! guards that go back to the pool when dropped.

pub mod memory;
pub mod pool;
pub mod redis;

use async_trait::async_trait;

use crate::common::Result;

pub use memory::MemoryConnector;
pub use pool::{Pool, PoolConfig, PoolStats, PooledConnection};
pub use self::redis::RedisConnector;

/// A single live connection to the store.
///
/// Every method is one round-trip. Values are text; integers travel in
/// base-10 form so `incr` can operate on them.
#[async_trait]
pub trait Connection: Send {
    /// `GET`: `None` when the key does not exist
    async fn get(&mut self, key: &str) -> Result<Option<String>>;

    /// `SET`: unconditional overwrite
    async fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// `INCR`: atomic increment by one, returning the new value
    async fn incr(&mut self, key: &str) -> Result<i64>;

    /// `FLUSHALL`: erase every key
    async fn flush_all(&mut self) -> Result<()>;

    /// `PING`
    async fn ping(&mut self) -> Result<()>;
}

/// Dials new connections for the pool.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn Connection>>;

    /// Human-readable target, for logs
    fn describe(&self) -> String;
}
