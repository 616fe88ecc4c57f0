//! Error types for kvgate

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Store Errors ===
    /// Transport-level failure: dial refused, connection dropped, timeout.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The store answered with an error reply.
    #[error("Store error: {0}")]
    Store(String),

    #[error("Value at {key:?} is not an integer: {value:?}")]
    NotAnInteger { key: String, value: String },

    // === Frontend Errors ===
    #[error("Template error: {0}")]
    Template(String),

    // === Config Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // === Generic ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the connection that produced this error must not be reused
    pub fn is_fatal_for_connection(&self) -> bool {
        matches!(self, Error::Connection(_) | Error::Io(_))
    }
}

impl From<redis::RedisError> for Error {
    fn from(e: redis::RedisError) -> Self {
        if e.is_io_error()
            || e.is_connection_dropped()
            || e.is_connection_refusal()
            || e.is_timeout()
        {
            Error::Connection(e.to_string())
        } else {
            Error::Store(e.to_string())
        }
    }
}
