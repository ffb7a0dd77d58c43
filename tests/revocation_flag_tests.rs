//! Behavior of the REVOCATION_ENABLED=false escape hatch. Kept in its
//! own binary because the flag differs from every other integration
//! test's environment.

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use chrono::{DateTime, Utc};

use token_service::domain::{RevocationStore, RevocationStoreErr, Role, TokenType, VerifiedIdentity};
use token_service::services::{RevocationService, TokenIssuer, TokenValidator};
use token_service::utils::Config;

fn set_env_config() {
    std::env::set_var("JWT_ALGORITHM", "HS256");
    std::env::set_var("JWT_SECRET_B64", B64.encode(b"0123456789abcdef0123456789abcdef"));
    std::env::set_var("JWT_ISSUER", "account-backend");
    std::env::set_var("JWT_AUDIENCE", "account-clients");
    std::env::set_var("ACCESS_TTL_SECONDS", "900");
    std::env::set_var("REFRESH_TTL_SECONDS", "604800");
    std::env::set_var("EXTENDED_SESSION_TTL_SECONDS", "2592000");
    std::env::set_var("CLOCK_SKEW_SECONDS", "60");
    std::env::set_var("REVOCATION_ENABLED", "false");
    std::env::set_var("REVOCATION_TIMEOUT_MS", "1000");
}

/// Would fail every call; proves the store is never consulted when the
/// revocation stage is disabled.
struct ExplodingStore;

#[async_trait]
impl RevocationStore for ExplodingStore {
    async fn put(
        &self,
        _token_id: &str,
        _revoked_at: DateTime<Utc>,
        _ttl_seconds: u64,
    ) -> Result<(), RevocationStoreErr> {
        panic!("revocation store must not be touched when disabled");
    }

    async fn contains(&self, _token_id: &str) -> Result<bool, RevocationStoreErr> {
        panic!("revocation store must not be touched when disabled");
    }

    async fn remove(&self, _token_id: &str) -> Result<bool, RevocationStoreErr> {
        panic!("revocation store must not be touched when disabled");
    }

    async fn count(&self) -> Result<i64, RevocationStoreErr> {
        panic!("revocation store must not be touched when disabled");
    }

    fn kind(&self) -> &'static str {
        "exploding"
    }
}

#[tokio::test]
async fn disabled_revocation_skips_the_blacklist_stage() {
    set_env_config();
    let config = Arc::new(Config::from_env().expect("test config"));
    assert!(!config.revocation_enabled());

    let scheme = Arc::new(config.signing_scheme().expect("key material"));
    let revocation = Arc::new(RevocationService::new(
        Arc::new(ExplodingStore),
        config.revocation_timeout(),
    ));
    let issuer = TokenIssuer::new(config.clone(), scheme.clone());
    let validator = TokenValidator::new(config, scheme, revocation);

    let identity = VerifiedIdentity::new(
        42,
        "user42@example.com".to_owned(),
        Role::Free,
        Vec::new(),
    );
    let issued = issuer.issue(&identity, TokenType::Access).unwrap();

    // Validates without the store round trip; the exploding store would
    // have panicked otherwise.
    let claims = validator.validate(&issued.token).await.unwrap();
    assert_eq!(claims.user_id, 42);
}
