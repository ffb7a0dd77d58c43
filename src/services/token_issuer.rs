use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Header};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{Claims, IssuedCredential, SigningScheme, TokenType, VerifiedIdentity};
use crate::utils::Config;

/// Builds and signs credentials for identities the upstream
/// authenticator has already verified.
///
/// Issuance has no side effects: nothing is written to the revocation
/// store, and the only failure mode in steady state is the signing call
/// itself (missing key material is a startup failure, surfaced when the
/// [`SigningScheme`] was built).
#[derive(Clone)]
pub struct TokenIssuer {
    config: Arc<Config>,
    scheme: Arc<SigningScheme>,
}

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("failed to sign credential: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
    #[error("token lifetime overflows the representable time range")]
    LifetimeOverflow,
}

impl TokenIssuer {
    pub fn new(config: Arc<Config>, scheme: Arc<SigningScheme>) -> Self {
        Self { config, scheme }
    }

    /// Issue a signed credential of the given type.
    ///
    /// `iat` and `nbf` are set to now, `exp` to now plus the configured
    /// lifetime for the type, and `jti` to a fresh random UUID so each
    /// credential can be revoked individually.
    pub fn issue(
        &self,
        identity: &VerifiedIdentity,
        token_type: TokenType,
    ) -> Result<IssuedCredential, IssueError> {
        self.issue_at(identity, token_type, Utc::now())
    }

    /// Same as [`issue`](Self::issue) with an explicit clock, so expiry
    /// behavior is testable without sleeping.
    pub fn issue_at(
        &self,
        identity: &VerifiedIdentity,
        token_type: TokenType,
        now: DateTime<Utc>,
    ) -> Result<IssuedCredential, IssueError> {
        let lifetime = Duration::seconds(self.config.lifetime_seconds(token_type));
        let expires_at = now
            .checked_add_signed(lifetime)
            .ok_or(IssueError::LifetimeOverflow)?;

        let token_id = Uuid::new_v4().to_string();
        let claims = Claims::for_identity(
            identity,
            token_type,
            self.config.jwt_issuer(),
            self.config.jwt_audience(),
            now,
            expires_at,
            &token_id,
        );

        let header = Header::new(self.scheme.algorithm());
        let token = encode(&header, &claims, self.scheme.encoding_key())?;

        Ok(IssuedCredential {
            token,
            token_id,
            token_type,
            expires_at,
        })
    }
}
