use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RevocationStoreErr {
    #[error("store connection failed: {0}")]
    Connection(String),
    #[error("store operation failed: {0}")]
    Operation(String),
    #[error("store call timed out")]
    Timeout,
}

/// Key/value record of revoked token identifiers with per-record expiry.
///
/// Natural expiry is the store's responsibility: a backing with native
/// per-key TTL (Redis) drops records on its own; the in-memory backing
/// expires them lazily. `count` exists for statistics only and stays off
/// the validation hot path.
#[async_trait::async_trait]
pub trait RevocationStore: Send + Sync {
    /// Create-or-replace the record for `token_id`, expiring after
    /// `ttl_seconds`.
    async fn put(
        &self,
        token_id: &str,
        revoked_at: DateTime<Utc>,
        ttl_seconds: u64,
    ) -> Result<(), RevocationStoreErr>;

    async fn contains(&self, token_id: &str) -> Result<bool, RevocationStoreErr>;

    /// Remove a record early; returns whether a live record was removed.
    async fn remove(&self, token_id: &str) -> Result<bool, RevocationStoreErr>;

    async fn count(&self) -> Result<i64, RevocationStoreErr>;

    fn kind(&self) -> &'static str;
}
