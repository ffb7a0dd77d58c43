use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::domain::{RevocationStore, RevocationStoreErr};

/// In-memory revocation records for tests and single-process setups.
/// The backing map has no TTL support, so records expire lazily: reads
/// ignore entries past their expiry and `count` prunes them.
#[derive(Default)]
pub struct HashmapRevocationStore {
    // token id -> (revoked at, store-enforced expiry)
    records: RwLock<HashMap<String, (DateTime<Utc>, DateTime<Utc>)>>,
}

impl HashmapRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RevocationStore for HashmapRevocationStore {
    async fn put(
        &self,
        token_id: &str,
        revoked_at: DateTime<Utc>,
        ttl_seconds: u64,
    ) -> Result<(), RevocationStoreErr> {
        let ttl_seconds = if ttl_seconds == 0 { 1 } else { ttl_seconds };
        let expires = revoked_at + Duration::seconds(ttl_seconds as i64);
        self.records
            .write()
            .await
            .insert(token_id.to_owned(), (revoked_at, expires));
        Ok(())
    }

    async fn contains(&self, token_id: &str) -> Result<bool, RevocationStoreErr> {
        let now = Utc::now();
        Ok(self
            .records
            .read()
            .await
            .get(token_id)
            .is_some_and(|record| record.1 > now))
    }

    async fn remove(&self, token_id: &str) -> Result<bool, RevocationStoreErr> {
        let now = Utc::now();
        Ok(self
            .records
            .write()
            .await
            .remove(token_id)
            .is_some_and(|record| record.1 > now))
    }

    async fn count(&self) -> Result<i64, RevocationStoreErr> {
        let now = Utc::now();
        let mut records = self.records.write().await;
        records.retain(|_, record| record.1 > now);
        Ok(records.len() as i64)
    }

    fn kind(&self) -> &'static str {
        "in-memory"
    }
}
