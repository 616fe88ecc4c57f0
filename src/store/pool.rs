//! Idle connection pool
//!
//! Connections are dialed on demand and never capped while in use. When a
//! [`PooledConnection`] is dropped its connection goes back to the front of
//! the idle list unless a transport error marked it broken. The idle list
//! holds at most `max_idle` entries (least recently used are closed first),
//! and entries idle for longer than `idle_timeout` are closed on the next
//! checkout.

use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

use crate::common::{Error, PoolSettings, Result};
use crate::store::{Connection, Connector};

/// Pool limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Maximum number of idle connections retained
    pub max_idle: usize,
    /// Idle connections older than this are closed; zero disables the check
    pub idle_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_idle: 3,
            idle_timeout: Duration::from_secs(240),
        }
    }
}

impl From<&PoolSettings> for PoolConfig {
    fn from(settings: &PoolSettings) -> Self {
        Self {
            max_idle: settings.max_idle,
            idle_timeout: settings.idle_timeout(),
        }
    }
}

/// Point-in-time pool counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub idle: usize,
    pub dialed: u64,
    pub reused: u64,
    pub discarded: u64,
}

struct IdleConnection {
    conn: Box<dyn Connection>,
    returned_at: Instant,
}

struct PoolInner {
    connector: Arc<dyn Connector>,
    config: PoolConfig,
    idle: Mutex<VecDeque<IdleConnection>>,
    dialed: AtomicU64,
    reused: AtomicU64,
    discarded: AtomicU64,
}

impl PoolInner {
    fn idle(&self) -> MutexGuard<'_, VecDeque<IdleConnection>> {
        self.idle.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Drop expired entries from the cold end, then pop the warmest one.
    fn checkout_idle(&self) -> Option<Box<dyn Connection>> {
        let mut expired = Vec::new();
        let conn = {
            let mut idle = self.idle();
            if !self.config.idle_timeout.is_zero() {
                let now = Instant::now();
                while let Some(oldest) = idle.back() {
                    if now.duration_since(oldest.returned_at) < self.config.idle_timeout {
                        break;
                    }
                    expired.extend(idle.pop_back());
                }
            }
            idle.pop_front().map(|entry| entry.conn)
        };

        if !expired.is_empty() {
            tracing::debug!(closed = expired.len(), "Closing expired idle connections");
            self.discarded
                .fetch_add(expired.len() as u64, Ordering::Relaxed);
        }
        conn
    }

    fn checkin(&self, conn: Box<dyn Connection>) {
        let evicted = {
            let mut idle = self.idle();
            idle.push_front(IdleConnection {
                conn,
                returned_at: Instant::now(),
            });
            let mut evicted = Vec::new();
            while idle.len() > self.config.max_idle {
                evicted.extend(idle.pop_back());
            }
            evicted
        };

        if !evicted.is_empty() {
            self.discarded
                .fetch_add(evicted.len() as u64, Ordering::Relaxed);
        }
    }
}

/// Shared handle to the connection pool
#[derive(Clone)]
pub struct Pool {
    inner: Arc<PoolInner>,
}

impl Pool {
    pub fn new(connector: Arc<dyn Connector>, config: PoolConfig) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                connector,
                config,
                idle: Mutex::new(VecDeque::new()),
                dialed: AtomicU64::new(0),
                reused: AtomicU64::new(0),
                discarded: AtomicU64::new(0),
            }),
        }
    }

    /// Check out a connection, reusing an idle one when available.
    pub async fn get(&self) -> Result<PooledConnection> {
        if let Some(conn) = self.inner.checkout_idle() {
            self.inner.reused.fetch_add(1, Ordering::Relaxed);
            return Ok(PooledConnection::new(conn, self.inner.clone()));
        }

        let conn = self.inner.connector.connect().await.map_err(|e| {
            tracing::error!(target_store = %self.inner.connector.describe(), error = %e, "Can not connect to store");
            e
        })?;
        self.inner.dialed.fetch_add(1, Ordering::Relaxed);
        Ok(PooledConnection::new(conn, self.inner.clone()))
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            idle: self.inner.idle().len(),
            dialed: self.inner.dialed.load(Ordering::Relaxed),
            reused: self.inner.reused.load(Ordering::Relaxed),
            discarded: self.inner.discarded.load(Ordering::Relaxed),
        }
    }
}

/// A checked-out connection. Returned to the pool on drop.
///
/// Commands go through the guard so a transport failure marks the
/// connection broken before it can be handed out again.
pub struct PooledConnection {
    conn: Option<Box<dyn Connection>>,
    pool: Arc<PoolInner>,
    broken: bool,
}

impl PooledConnection {
    fn new(conn: Box<dyn Connection>, pool: Arc<PoolInner>) -> Self {
        Self {
            conn: Some(conn),
            pool,
            broken: false,
        }
    }

    fn conn(&mut self) -> Result<&mut (dyn Connection + 'static)> {
        self.conn
            .as_deref_mut()
            .ok_or_else(|| Error::Internal("pooled connection already released".into()))
    }

    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if e.is_fatal_for_connection() {
                self.broken = true;
            }
        }
        result
    }

    /// Whether this connection will be closed instead of returned
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    pub async fn get(&mut self, key: &str) -> Result<Option<String>> {
        let result = self.conn()?.get(key).await;
        self.track(result)
    }

    pub async fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let result = self.conn()?.set(key, value).await;
        self.track(result)
    }

    pub async fn incr(&mut self, key: &str) -> Result<i64> {
        let result = self.conn()?.incr(key).await;
        self.track(result)
    }

    pub async fn flush_all(&mut self) -> Result<()> {
        let result = self.conn()?.flush_all().await;
        self.track(result)
    }

    pub async fn ping(&mut self) -> Result<()> {
        let result = self.conn()?.ping().await;
        self.track(result)
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if self.broken {
                self.pool.discarded.fetch_add(1, Ordering::Relaxed);
            } else {
                self.pool.checkin(conn);
            }
        }
    }
}
