//! # kvgate
//!
//! A small HTTP front-end over Redis:
//! - read and write string values
//! - atomic counters via `INCR`
//! - reset of the whole store
//! - a static landing page
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │  frontend (axum router)      │  /, /get, /set, /increment, /initialize
//! └──────────────┬───────────────┘
//!                │
//! ┌──────────────▼───────────────┐
//! │  KvClient                    │  typed ops, read errors → defaults
//! └──────────────┬───────────────┘
//!                │
//! ┌──────────────▼───────────────┐
//! │  Pool (max 3 idle, 240s)     │  RAII checkout, broken conns dropped
//! └──────────────┬───────────────┘
//!                │ Connector
//!        ┌───────┴────────┐
//!   RedisConnector   MemoryConnector
//! ```
//!
//! ## Usage
//!
//! ```bash
//! REDIS_HOST=localhost kvgate
//! curl -d 'key=a&val=hello' localhost:5000/set
//! curl 'localhost:5000/get?key=a'
//! ```

pub mod client;
pub mod common;
pub mod frontend;
pub mod store;

// Re-export commonly used types
pub use client::KvClient;
pub use common::{Config, Error, Result};
pub use frontend::Frontend;

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
