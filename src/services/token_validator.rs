//! The credential validation pipeline.
//!
//! Validation runs a fixed sequence of stages and short-circuits on the
//! first failure:
//!
//! 1. structure   — three non-empty base64url segments
//! 2. signature   — declared algorithm + signature over header/payload
//! 3. standard    — issuer, audience, presence, and the time window
//! 4. revocation  — blacklist lookup, fail-closed on store errors
//! 5. business    — userId, role, tokenType, credential age
//!
//! The ordering keeps cheap checks ahead of cryptography and the store
//! round trip, which bounds the cost of malicious input. A failure
//! reports the stage it occurred in; expiry and revocation get their own
//! stages so callers can answer "refresh" / "re-login" appropriately.

use std::collections::HashSet;
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64_URL;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, decode_header, Validation};
use log::error;

use crate::domain::{
    ClaimSet, Claims, Role, SigningScheme, TokenType, ValidationFailure, ValidationStage,
};
use crate::services::RevocationService;
use crate::utils::Config;

/// Multiple of the nominal lifetime beyond which a credential's age is
/// rejected even when its own expiry has not passed. Only reachable for
/// credentials issued before a lifetime reconfiguration shortened the
/// nominal value, which is exactly when they should stop validating.
const MAX_AGE_LIFETIME_MULTIPLE: i64 = 2;

/// Validated timestamps lifted out of the standard-claims stage so the
/// later stages never re-check presence.
struct ClaimWindow {
    issued_at: DateTime<Utc>,
    not_before: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct TokenValidator {
    config: Arc<Config>,
    scheme: Arc<SigningScheme>,
    revocation: Arc<RevocationService>,
}

impl TokenValidator {
    pub fn new(
        config: Arc<Config>,
        scheme: Arc<SigningScheme>,
        revocation: Arc<RevocationService>,
    ) -> Self {
        Self {
            config,
            scheme,
            revocation,
        }
    }

    /// Run the full pipeline against `token`. On success the fully
    /// parsed claim set is returned; on failure, the stage and reason.
    pub async fn validate(&self, token: &str) -> Result<ClaimSet, ValidationFailure> {
        self.validate_at(token, Utc::now()).await
    }

    /// Same as [`validate`](Self::validate) with an explicit clock, so
    /// window behavior is testable without sleeping.
    pub async fn validate_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<ClaimSet, ValidationFailure> {
        self.check_structure(token)?;
        let claims = self.check_signature(token)?;
        let window = self.check_standard_claims(&claims, now)?;
        self.check_revocation(&claims).await?;
        self.check_business_rules(claims, window, now)
    }

    // Stage 1: no cryptography, no allocation-heavy parsing, no network.
    fn check_structure(&self, token: &str) -> Result<(), ValidationFailure> {
        let fail = |reason| ValidationFailure::new(ValidationStage::Structure, reason);

        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != 3 {
            return Err(fail(
                "credential must have exactly three dot-separated segments",
            ));
        }
        for segment in segments {
            if segment.is_empty() {
                return Err(fail("credential segment is empty"));
            }
            if B64_URL.decode(segment).is_err() {
                return Err(fail("credential segment is not valid base64url"));
            }
        }
        Ok(())
    }

    // Stage 2: signature only; claim semantics belong to later stages.
    fn check_signature(&self, token: &str) -> Result<Claims, ValidationFailure> {
        let fail = |reason: String| ValidationFailure::new(ValidationStage::Signature, reason);

        let header = decode_header(token).map_err(|e| fail(format!("unreadable header: {e}")))?;
        if header.alg != self.scheme.algorithm() {
            return Err(fail(format!(
                "credential algorithm {:?} does not match configured {:?}",
                header.alg,
                self.scheme.algorithm()
            )));
        }

        let mut validation = Validation::new(self.scheme.algorithm());
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();

        // A payload that deserializes to nothing we recognize is forged
        // or corrupt, so those errors surface at this stage too.
        let data = decode::<Claims>(token, self.scheme.decoding_key(), &validation)
            .map_err(|e| fail(format!("signature verification failed: {e}")))?;
        Ok(data.claims)
    }

    // Stage 3: exact issuer/audience match, registered-claim presence,
    // and the clock-skew-widened validity window.
    fn check_standard_claims(
        &self,
        claims: &Claims,
        now: DateTime<Utc>,
    ) -> Result<ClaimWindow, ValidationFailure> {
        let fail = |reason: &str| ValidationFailure::new(ValidationStage::StandardClaims, reason);

        if claims.iss != self.config.jwt_issuer() {
            return Err(fail("issuer mismatch"));
        }
        if claims.aud != self.config.jwt_audience() {
            return Err(fail("audience mismatch"));
        }
        if claims.sub.is_empty() {
            return Err(fail("missing sub claim"));
        }
        if claims.jti.is_empty() {
            return Err(fail("missing jti claim"));
        }
        let iat = claims.iat.ok_or_else(|| fail("missing iat claim"))?;
        let exp = claims.exp.ok_or_else(|| fail("missing exp claim"))?;
        let nbf = claims.nbf.unwrap_or(iat);

        let issued_at = datetime_from_ts(iat).ok_or_else(|| fail("unrepresentable iat"))?;
        let expires_at = datetime_from_ts(exp).ok_or_else(|| fail("unrepresentable exp"))?;
        let not_before = datetime_from_ts(nbf).ok_or_else(|| fail("unrepresentable nbf"))?;

        if exp <= nbf {
            return Err(fail("exp must be after nbf"));
        }

        // The skew is applied symmetrically to both window edges to
        // absorb clock drift between issuing and validating hosts.
        let skew = self.config.clock_skew_seconds();
        let ts = now.timestamp();
        if ts < nbf - skew {
            return Err(ValidationFailure::new(
                ValidationStage::Expiration,
                "credential is not yet valid",
            ));
        }
        if ts > exp + skew {
            return Err(ValidationFailure::new(
                ValidationStage::Expiration,
                "credential has expired",
            ));
        }

        Ok(ClaimWindow {
            issued_at,
            not_before,
            expires_at,
        })
    }

    // Stage 4: the only stage that leaves the process. Store errors are
    // fail-closed: an unreachable blacklist must never admit a
    // credential, but it is logged distinctly so operators can tell a
    // degraded dependency from security working.
    async fn check_revocation(&self, claims: &Claims) -> Result<(), ValidationFailure> {
        if !self.config.revocation_enabled() {
            return Ok(());
        }
        match self.revocation.check(&claims.jti).await {
            Ok(false) => Ok(()),
            Ok(true) => Err(ValidationFailure::new(
                ValidationStage::Blacklist,
                "credential has been revoked",
            )),
            Err(e) => {
                error!(
                    "revocation store unavailable while checking token {}, failing closed: {e}",
                    claims.jti
                );
                Err(ValidationFailure::new(
                    ValidationStage::Blacklist,
                    "revocation status unavailable",
                ))
            }
        }
    }

    // Stage 5: domain rules over the already-authenticated claims.
    fn check_business_rules(
        &self,
        claims: Claims,
        window: ClaimWindow,
        now: DateTime<Utc>,
    ) -> Result<ClaimSet, ValidationFailure> {
        let fail = |reason: String| ValidationFailure::new(ValidationStage::BusinessRules, reason);

        if claims.user_id <= 0 {
            return Err(fail(format!(
                "userId must be positive, got {}",
                claims.user_id
            )));
        }

        let token_type = claims
            .token_type
            .as_deref()
            .ok_or_else(|| fail("missing tokenType claim".to_owned()))?
            .parse::<TokenType>()
            .map_err(|e| fail(e.to_string()))?;

        let role = match (&claims.role, token_type) {
            (Some(raw), _) => Some(raw.parse::<Role>().map_err(|e| fail(e.to_string()))?),
            (None, TokenType::Refresh) => None,
            (None, _) => return Err(fail("missing role claim".to_owned())),
        };

        let age = now.signed_duration_since(window.issued_at).num_seconds();
        let max_age = self.config.lifetime_seconds(token_type) * MAX_AGE_LIFETIME_MULTIPLE;
        if age > max_age {
            return Err(fail(format!(
                "credential age {age}s exceeds {max_age}s for its type"
            )));
        }

        Ok(ClaimSet {
            subject: claims.sub,
            issuer: claims.iss,
            audience: claims.aud,
            issued_at: window.issued_at,
            not_before: window.not_before,
            expires_at: window.expires_at,
            token_id: claims.jti,
            user_id: claims.user_id,
            role,
            permissions: claims.permissions.unwrap_or_default(),
            token_type,
        })
    }
}

fn datetime_from_ts(seconds: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(seconds, 0).single()
}
