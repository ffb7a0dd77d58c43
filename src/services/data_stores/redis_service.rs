use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use std::error::Error;
use std::fmt;

// Small helper to shorten command error mapping
fn cmd_err<E: ToString>(e: E) -> RedisServiceErr {
    RedisServiceErr::CommandErr(e.to_string())
}

#[derive(Debug)]
pub enum RedisServiceErr {
    ConnectionErr(String),
    CommandErr(String),
    InvalidUrl(String),
}

impl fmt::Display for RedisServiceErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedisServiceErr::ConnectionErr(str) => {
                write!(f, "error while connecting to instance: {str}")
            }
            RedisServiceErr::CommandErr(str) => write!(f, "error while running command: {str}"),
            RedisServiceErr::InvalidUrl(str) => write!(f, "invalid redis url: {str}"),
        }
    }
}

impl Error for RedisServiceErr {}

/// Thin async wrapper over the Redis commands the revocation protocol
/// needs: SET-with-expiry, EXISTS, DEL, and KEYS (statistics only).
pub struct RedisService {
    client: Client,
}

impl RedisService {
    pub fn new(host_url: &str) -> Result<Self, RedisServiceErr> {
        let formatted_url = format!("redis://{}/", host_url);
        let client =
            Client::open(formatted_url).map_err(|e| RedisServiceErr::InvalidUrl(e.to_string()))?;
        Ok(Self { client })
    }

    async fn get_connection(&self) -> Result<MultiplexedConnection, RedisServiceErr> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| RedisServiceErr::ConnectionErr(e.to_string()))
    }

    /// Create-or-replace `key` with a per-key expiry.
    pub async fn set_key_value(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: u64,
    ) -> Result<(), RedisServiceErr> {
        // Clamp TTL to at least 1 second to avoid immediate expiration
        let ttl_seconds = if ttl_seconds == 0 { 1 } else { ttl_seconds };
        let mut conn = self.get_connection().await?;
        conn.set_ex::<_, _, ()>(key, value, ttl_seconds)
            .await
            .map_err(cmd_err)
    }

    pub async fn exists(&self, key: &str) -> Result<bool, RedisServiceErr> {
        let mut conn = self.get_connection().await?;
        conn.exists(key).await.map_err(cmd_err)
    }

    pub async fn delete_key(&self, key: &str) -> Result<bool, RedisServiceErr> {
        let mut conn = self.get_connection().await?;
        let deleted: i32 = conn.del(key).await.map_err(cmd_err)?;
        Ok(deleted > 0)
    }

    /// Count keys matching `pattern`. KEYS walks the whole keyspace, so
    /// this is for statistics endpoints, never the request hot path.
    pub async fn count_keys(&self, pattern: &str) -> Result<i64, RedisServiceErr> {
        let mut conn = self.get_connection().await?;
        let keys: Vec<String> = conn.keys(pattern).await.map_err(cmd_err)?;
        Ok(keys.len() as i64)
    }
}
