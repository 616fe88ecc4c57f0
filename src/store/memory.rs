//! In-process connector with Redis string semantics
//!
//! All connections dialed from one [`MemoryConnector`] share the same map,
//! so it behaves like a single store reached through several sockets.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::common::{Error, Result};
use crate::store::{Connection, Connector};

type Shared = Arc<Mutex<HashMap<String, String>>>;

/// In-memory store shared by every connection it dials
#[derive(Clone, Default)]
pub struct MemoryConnector {
    data: Shared,
    offline: Arc<AtomicBool>,
    dials: Arc<AtomicUsize>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline, dialing and every command on existing connections fail
    /// with a connection error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of connections dialed so far
    pub fn dials(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }

    /// Number of keys currently stored
    pub fn len(&self) -> usize {
        self.data.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self) -> Result<Box<dyn Connection>> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Connection("memory store is offline".into()));
        }
        self.dials.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryConnection {
            data: self.data.clone(),
            offline: self.offline.clone(),
        }))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// Integers as Redis accepts them for `INCR`: optional `-`, no `+`,
/// no leading zeros, no surrounding whitespace.
fn parse_canonical_i64(raw: &str) -> Option<i64> {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.starts_with('0') && (digits.len() > 1 || digits.len() != raw.len()) {
        return None;
    }
    raw.parse().ok()
}

struct MemoryConnection {
    data: Shared,
    offline: Arc<AtomicBool>,
}

impl MemoryConnection {
    fn with_data<T>(&self, f: impl FnOnce(&mut HashMap<String, String>) -> Result<T>) -> Result<T> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Connection("connection reset by peer".into()));
        }
        let mut data = self.data.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut data)
    }
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn get(&mut self, key: &str) -> Result<Option<String>> {
        self.with_data(|data| Ok(data.get(key).cloned()))
    }

    async fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.with_data(|data| {
            data.insert(key.to_string(), value.to_string());
            Ok(())
        })
    }

    async fn incr(&mut self, key: &str) -> Result<i64> {
        self.with_data(|data| {
            let current = match data.get(key) {
                Some(raw) => parse_canonical_i64(raw).ok_or_else(|| {
                    Error::Store("ERR value is not an integer or out of range".into())
                })?,
                None => 0,
            };
            let next = current
                .checked_add(1)
                .ok_or_else(|| Error::Store("ERR increment or decrement would overflow".into()))?;
            data.insert(key.to_string(), next.to_string());
            Ok(next)
        })
    }

    async fn flush_all(&mut self) -> Result<()> {
        self.with_data(|data| {
            data.clear();
            Ok(())
        })
    }

    async fn ping(&mut self) -> Result<()> {
        self.with_data(|_| Ok(()))
    }
}
