//! Redis connector

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::common::{Error, Result};
use crate::store::{Connection, Connector};

/// Dials Redis over TCP
pub struct RedisConnector {
    client: redis::Client,
    url: String,
}

impl RedisConnector {
    /// Create a connector for `redis://host:port/`. Nothing is dialed yet.
    pub fn new(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| Error::InvalidConfig(format!("invalid redis url {}: {}", url, e)))?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub fn for_host(host: &str, port: u16) -> Result<Self> {
        Self::new(&format!("redis://{}:{}/", host, port))
    }
}

#[async_trait]
impl Connector for RedisConnector {
    async fn connect(&self) -> Result<Box<dyn Connection>> {
        let conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| Error::Connection(format!("cannot connect to {}: {}", self.url, e)))?;
        Ok(Box::new(RedisConnection { conn }))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Values are binary-safe in Redis; invalid UTF-8 is replaced rather than
/// failing the read.
fn decode_value(raw: Vec<u8>) -> String {
    match String::from_utf8(raw) {
        Ok(value) => value,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

struct RedisConnection {
    conn: MultiplexedConnection,
}

#[async_trait]
impl Connection for RedisConnection {
    async fn get(&mut self, key: &str) -> Result<Option<String>> {
        let value: Option<Vec<u8>> = self.conn.get(key).await?;
        Ok(value.map(decode_value))
    }

    async fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    async fn incr(&mut self, key: &str) -> Result<i64> {
        let value: i64 = self.conn.incr(key, 1i64).await?;
        Ok(value)
    }

    async fn flush_all(&mut self) -> Result<()> {
        redis::cmd("FLUSHALL")
            .query_async::<()>(&mut self.conn)
            .await?;
        Ok(())
    }

    async fn ping(&mut self) -> Result<()> {
        redis::cmd("PING")
            .query_async::<String>(&mut self.conn)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_host_url() {
        let connector = RedisConnector::for_host("cache", 6379).unwrap();
        assert_eq!(connector.describe(), "redis://cache:6379/");
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(matches!(
            RedisConnector::new("not a url"),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_decode_value() {
        assert_eq!(decode_value(b"hello".to_vec()), "hello");
        assert_eq!(decode_value("héllo".as_bytes().to_vec()), "héllo");
        assert_eq!(decode_value(vec![b'a', 0xff, b'b']), "a\u{fffd}b");
    }

    #[tokio::test]
    async fn test_unreachable_store_is_connection_error() {
        let connector = RedisConnector::for_host("127.0.0.1", 1).unwrap();
        let err = connector.connect().await.err().unwrap();
        assert!(matches!(err, Error::Connection(_)));
    }
}
