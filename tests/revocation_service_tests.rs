use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use token_service::domain::{RevocationStore, RevocationStoreErr};
use token_service::services::{HashmapRevocationStore, RevocationService};

fn service(store: Arc<dyn RevocationStore + Send + Sync>) -> RevocationService {
    let _ = env_logger::builder().is_test(true).try_init();
    RevocationService::new(store, StdDuration::from_millis(500))
}

fn fresh_token_id() -> String {
    Uuid::new_v4().to_string()
}

/// A store that always reports errors, simulating an outage.
struct FailingStore;

#[async_trait]
impl RevocationStore for FailingStore {
    async fn put(
        &self,
        _token_id: &str,
        _revoked_at: DateTime<Utc>,
        _ttl_seconds: u64,
    ) -> Result<(), RevocationStoreErr> {
        Err(RevocationStoreErr::Connection("store is down".to_owned()))
    }

    async fn contains(&self, _token_id: &str) -> Result<bool, RevocationStoreErr> {
        Err(RevocationStoreErr::Connection("store is down".to_owned()))
    }

    async fn remove(&self, _token_id: &str) -> Result<bool, RevocationStoreErr> {
        Err(RevocationStoreErr::Connection("store is down".to_owned()))
    }

    async fn count(&self) -> Result<i64, RevocationStoreErr> {
        Err(RevocationStoreErr::Connection("store is down".to_owned()))
    }

    fn kind(&self) -> &'static str {
        "failing"
    }
}

/// A store that hangs longer than the service's per-call timeout.
struct SlowStore;

#[async_trait]
impl RevocationStore for SlowStore {
    async fn put(
        &self,
        _token_id: &str,
        _revoked_at: DateTime<Utc>,
        _ttl_seconds: u64,
    ) -> Result<(), RevocationStoreErr> {
        tokio::time::sleep(StdDuration::from_secs(5)).await;
        Ok(())
    }

    async fn contains(&self, _token_id: &str) -> Result<bool, RevocationStoreErr> {
        tokio::time::sleep(StdDuration::from_secs(5)).await;
        Ok(false)
    }

    async fn remove(&self, _token_id: &str) -> Result<bool, RevocationStoreErr> {
        tokio::time::sleep(StdDuration::from_secs(5)).await;
        Ok(false)
    }

    async fn count(&self) -> Result<i64, RevocationStoreErr> {
        tokio::time::sleep(StdDuration::from_secs(5)).await;
        Ok(0)
    }

    fn kind(&self) -> &'static str {
        "slow"
    }
}

#[tokio::test]
async fn revoke_then_query_round_trip() {
    let svc = service(Arc::new(HashmapRevocationStore::new()));
    let token_id = fresh_token_id();

    assert!(!svc.is_revoked(&token_id).await);
    svc.revoke(&token_id, Utc::now() + Duration::minutes(15))
        .await
        .expect("revoke should succeed");
    assert!(svc.is_revoked(&token_id).await);
    assert_eq!(svc.check(&token_id).await, Ok(true));
}

#[tokio::test]
async fn revoking_expired_credential_is_a_noop() {
    let svc = service(Arc::new(HashmapRevocationStore::new()));
    let token_id = fresh_token_id();

    svc.revoke(&token_id, Utc::now() - Duration::minutes(5))
        .await
        .expect("no-op revoke should not error");
    assert!(!svc.is_revoked(&token_id).await);
    assert_eq!(svc.stats().await.count, 0);
}

#[tokio::test]
async fn unrevoke_removes_the_record() {
    let svc = service(Arc::new(HashmapRevocationStore::new()));
    let token_id = fresh_token_id();

    svc.revoke(&token_id, Utc::now() + Duration::minutes(15))
        .await
        .unwrap();
    assert!(svc.unrevoke(&token_id).await.unwrap());
    assert!(!svc.is_revoked(&token_id).await);
    // Second removal finds nothing.
    assert!(!svc.unrevoke(&token_id).await.unwrap());
}

#[tokio::test]
async fn stats_report_count_and_backing_kind() {
    let svc = service(Arc::new(HashmapRevocationStore::new()));
    svc.revoke(&fresh_token_id(), Utc::now() + Duration::minutes(15))
        .await
        .unwrap();
    svc.revoke(&fresh_token_id(), Utc::now() + Duration::minutes(15))
        .await
        .unwrap();

    let stats = svc.stats().await;
    assert_eq!(stats.count, 2);
    assert_eq!(stats.backing_store, "in-memory");
}

#[tokio::test]
async fn store_outage_fails_closed() {
    let svc = service(Arc::new(FailingStore));
    let token_id = fresh_token_id();

    // Lookups deny; the raw check surfaces the error for logging.
    assert!(svc.is_revoked(&token_id).await);
    assert!(matches!(
        svc.check(&token_id).await,
        Err(RevocationStoreErr::Connection(_))
    ));

    // Writes and stats degrade loudly, not silently.
    assert!(svc
        .revoke(&token_id, Utc::now() + Duration::minutes(15))
        .await
        .is_err());
    let stats = svc.stats().await;
    assert_eq!(stats.count, -1);
    assert_eq!(stats.backing_store, "failing");
}

#[tokio::test]
async fn slow_store_hits_the_call_timeout() {
    let svc = RevocationService::new(Arc::new(SlowStore), StdDuration::from_millis(50));
    let token_id = fresh_token_id();

    assert_eq!(
        svc.check(&token_id).await,
        Err(RevocationStoreErr::Timeout)
    );
    // Timeout counts as unreachable: fail closed.
    assert!(svc.is_revoked(&token_id).await);
    assert_eq!(svc.stats().await.count, -1);
}

#[tokio::test]
async fn records_expire_with_the_credential() {
    let svc = service(Arc::new(HashmapRevocationStore::new()));
    let token_id = fresh_token_id();

    svc.revoke(&token_id, Utc::now() + Duration::seconds(2))
        .await
        .unwrap();
    assert!(svc.is_revoked(&token_id).await);

    tokio::time::sleep(StdDuration::from_millis(2500)).await;
    assert!(!svc.is_revoked(&token_id).await);
    assert_eq!(svc.stats().await.count, 0);
}
