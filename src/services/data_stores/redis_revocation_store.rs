use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{RevocationStore, RevocationStoreErr};
use crate::services::data_stores::redis_service::{RedisService, RedisServiceErr};

const KEY_PREFIX: &str = "revoked_token:";

/// Redis-backed revocation records. Natural expiry is handled by the
/// per-key TTL, so no sweeping is ever needed here.
pub struct RedisRevocationStore {
    redis_service: Arc<RedisService>,
}

impl RedisRevocationStore {
    pub fn new(redis_service: Arc<RedisService>) -> Self {
        Self { redis_service }
    }

    fn key_for(token_id: &str) -> String {
        format!("{KEY_PREFIX}{token_id}")
    }
}

fn store_err(e: RedisServiceErr) -> RevocationStoreErr {
    match e {
        RedisServiceErr::ConnectionErr(msg) => RevocationStoreErr::Connection(msg),
        RedisServiceErr::CommandErr(msg) | RedisServiceErr::InvalidUrl(msg) => {
            RevocationStoreErr::Operation(msg)
        }
    }
}

#[async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn put(
        &self,
        token_id: &str,
        revoked_at: DateTime<Utc>,
        ttl_seconds: u64,
    ) -> Result<(), RevocationStoreErr> {
        self.redis_service
            .set_key_value(&Self::key_for(token_id), &revoked_at.to_rfc3339(), ttl_seconds)
            .await
            .map_err(store_err)
    }

    async fn contains(&self, token_id: &str) -> Result<bool, RevocationStoreErr> {
        self.redis_service
            .exists(&Self::key_for(token_id))
            .await
            .map_err(store_err)
    }

    async fn remove(&self, token_id: &str) -> Result<bool, RevocationStoreErr> {
        self.redis_service
            .delete_key(&Self::key_for(token_id))
            .await
            .map_err(store_err)
    }

    async fn count(&self) -> Result<i64, RevocationStoreErr> {
        self.redis_service
            .count_keys(&format!("{KEY_PREFIX}*"))
            .await
            .map_err(store_err)
    }

    fn kind(&self) -> &'static str {
        "redis"
    }
}
