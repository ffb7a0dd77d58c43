use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, error};
use tokio::time::timeout;

use crate::domain::{RevocationStore, RevocationStoreErr};

/// Best-effort view of the revocation backlog. A `count` of `-1` means
/// the computation itself failed, which is different from "zero
/// revocations".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevocationStats {
    pub count: i64,
    pub backing_store: &'static str,
}

/// Records and queries revoked token identifiers on logout or incident
/// response. Every store call is bounded by the configured per-call
/// timeout; an elapsed timeout surfaces as a store error and is handled
/// fail-closed by the lookup paths.
#[derive(Clone)]
pub struct RevocationService {
    store: Arc<dyn RevocationStore + Send + Sync>,
    call_timeout: Duration,
}

impl RevocationService {
    pub fn new(store: Arc<dyn RevocationStore + Send + Sync>, call_timeout: Duration) -> Self {
        Self {
            store,
            call_timeout,
        }
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, RevocationStoreErr>
    where
        F: Future<Output = Result<T, RevocationStoreErr>>,
    {
        timeout(self.call_timeout, call)
            .await
            .map_err(|_| RevocationStoreErr::Timeout)?
    }

    /// Record `token_id` as revoked until the credential's natural
    /// expiry. Revoking an already-expired credential is a no-op: there
    /// is nothing left to protect, and the store would only accumulate a
    /// record it immediately drops.
    pub async fn revoke(
        &self,
        token_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RevocationStoreErr> {
        let now = Utc::now();
        let remaining = expires_at.signed_duration_since(now).num_seconds();
        if remaining <= 0 {
            debug!("skipping revocation of already-expired token {token_id}");
            return Ok(());
        }

        self.bounded(self.store.put(token_id, now, remaining as u64))
            .await?;
        debug!("revoked token {token_id} for the remaining {remaining}s");
        Ok(())
    }

    /// Raw lookup, surfacing store errors to the caller. The validator
    /// uses this so a store outage can be reported (and logged)
    /// distinctly from a genuine revocation.
    pub async fn check(&self, token_id: &str) -> Result<bool, RevocationStoreErr> {
        self.bounded(self.store.contains(token_id)).await
    }

    /// Fail-closed convenience lookup: a store error counts as revoked.
    pub async fn is_revoked(&self, token_id: &str) -> bool {
        match self.check(token_id).await {
            Ok(revoked) => revoked,
            Err(e) => {
                error!("revocation store unavailable for token {token_id}, failing closed: {e}");
                true
            }
        }
    }

    /// Administrative removal of a record before its natural expiry
    /// (incident correction, testing). Returns whether a live record was
    /// removed.
    pub async fn unrevoke(&self, token_id: &str) -> Result<bool, RevocationStoreErr> {
        self.bounded(self.store.remove(token_id)).await
    }

    pub async fn stats(&self) -> RevocationStats {
        let count = match self.bounded(self.store.count()).await {
            Ok(count) => count,
            Err(e) => {
                error!("failed to count revocation records: {e}");
                -1
            }
        };
        RevocationStats {
            count,
            backing_store: self.store.kind(),
        }
    }
}
