//! Common utilities and types shared across kvgate

pub mod config;
pub mod error;
pub mod tracing_middleware;

pub use config::{Config, PoolSettings};
pub use error::{Error, Result};
pub use tracing_middleware::{request_tracing_middleware, REQUEST_ID_HEADER};
