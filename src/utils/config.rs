use std::env;
use std::time::Duration;

use dotenvy::dotenv;
use jsonwebtoken::Algorithm;
use thiserror::Error;

use crate::domain::signing_scheme::{KeyError, SigningScheme};
use crate::domain::TokenType;

/// Upper bound for the extended-session lifetime: 90 days.
const MAX_EXTENDED_SESSION_TTL_SECONDS: i64 = 90 * 24 * 60 * 60;

/// Where the signing key material comes from. Resolved at config-parse
/// time from the algorithm family; loading happens once at startup via
/// [`Config::signing_scheme`].
#[derive(Clone, Debug)]
pub enum KeySource {
    /// Inline base64 shared secret (HS* family).
    SecretB64(String),
    /// Private + public key PEM files (RS* family).
    PemFiles {
        private_key_file: String,
        public_key_file: String,
    },
    /// Password-protected PEM keystore holding an encrypted private key
    /// and a certificate (RS* family).
    Keystore {
        keystore_file: String,
        password: String,
    },
}

/// Immutable subsystem configuration, built once at startup and shared
/// as `Arc<Config>`. Every cross-field inconsistency fails here, before
/// the service accepts traffic.
#[derive(Clone)]
pub struct Config {
    algorithm: Algorithm,
    key_source: KeySource,
    issuer: String,
    audience: String,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
    extended_session_ttl_seconds: i64,
    clock_skew_seconds: i64,
    revocation_enabled: bool,
    revocation_timeout_ms: u64,
    redis_host: String,
}

impl Config {
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }
    pub fn key_source(&self) -> &KeySource {
        &self.key_source
    }
    pub fn jwt_issuer(&self) -> &str {
        &self.issuer
    }
    pub fn jwt_audience(&self) -> &str {
        &self.audience
    }
    pub fn clock_skew_seconds(&self) -> i64 {
        self.clock_skew_seconds
    }
    pub fn revocation_enabled(&self) -> bool {
        self.revocation_enabled
    }
    pub fn revocation_timeout(&self) -> Duration {
        Duration::from_millis(self.revocation_timeout_ms)
    }
    pub fn redis_host(&self) -> &str {
        &self.redis_host
    }

    /// Nominal lifetime for credentials of the given type.
    pub fn lifetime_seconds(&self, token_type: TokenType) -> i64 {
        match token_type {
            TokenType::Access => self.access_ttl_seconds,
            TokenType::Refresh => self.refresh_ttl_seconds,
            TokenType::ExtendedSession => self.extended_session_ttl_seconds,
        }
    }

    /// Load the key material described by this configuration. Called
    /// once at startup; any failure here is fatal.
    pub fn signing_scheme(&self) -> Result<SigningScheme, KeyError> {
        match &self.key_source {
            KeySource::SecretB64(secret) => {
                SigningScheme::from_secret_b64(self.algorithm, secret)
            }
            KeySource::PemFiles {
                private_key_file,
                public_key_file,
            } => SigningScheme::from_pem_files(self.algorithm, private_key_file, public_key_file),
            KeySource::Keystore {
                keystore_file,
                password,
            } => SigningScheme::from_keystore(self.algorithm, keystore_file, password),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env in dev; no-op in prod if not present.
        let _ = dotenv();

        let algorithm = parse_algorithm(&req_var("JWT_ALGORITHM")?)?;
        let key_source = resolve_key_source(algorithm)?;

        let issuer = req_var("JWT_ISSUER")?;
        let audience = req_var("JWT_AUDIENCE")?;

        let access_ttl_seconds = parse_positive_i64("ACCESS_TTL_SECONDS")?;
        let refresh_ttl_seconds = parse_positive_i64("REFRESH_TTL_SECONDS")?;
        let extended_session_ttl_seconds = parse_positive_i64("EXTENDED_SESSION_TTL_SECONDS")?;
        if extended_session_ttl_seconds > MAX_EXTENDED_SESSION_TTL_SECONDS {
            return Err(ConfigError::Inconsistent(
                "EXTENDED_SESSION_TTL_SECONDS must not exceed 90 days",
            ));
        }

        let clock_skew_seconds = match opt_var("CLOCK_SKEW_SECONDS") {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|v| *v >= 0)
                .ok_or(ConfigError::Invalid("CLOCK_SKEW_SECONDS"))?,
            None => 60,
        };

        let revocation_enabled = match opt_var("REVOCATION_ENABLED") {
            Some(raw) => raw
                .parse::<bool>()
                .map_err(|_| ConfigError::Invalid("REVOCATION_ENABLED"))?,
            None => true,
        };

        let revocation_timeout_ms = match opt_var("REVOCATION_TIMEOUT_MS") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|v| *v > 0)
                .ok_or(ConfigError::Invalid("REVOCATION_TIMEOUT_MS"))?,
            None => 2000,
        };

        let redis_host = opt_var("REDIS_HOST").unwrap_or_else(|| "127.0.0.1:6379".into());

        Ok(Self {
            algorithm,
            key_source,
            issuer,
            audience,
            access_ttl_seconds,
            refresh_ttl_seconds,
            extended_session_ttl_seconds,
            clock_skew_seconds,
            revocation_enabled,
            revocation_timeout_ms,
            redis_host,
        })
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing env var {0}")]
    Missing(&'static str),
    #[error("invalid env var {0}")]
    Invalid(&'static str),
    #[error("unsupported signing algorithm '{0}'")]
    UnsupportedAlgorithm(String),
    #[error("{0}")]
    Inconsistent(&'static str),
}

// Only the two supported families; ES/PS names are rejected rather than
// silently mapped to the nearest thing jsonwebtoken knows.
fn parse_algorithm(raw: &str) -> Result<Algorithm, ConfigError> {
    match raw {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        "RS256" => Ok(Algorithm::RS256),
        "RS384" => Ok(Algorithm::RS384),
        "RS512" => Ok(Algorithm::RS512),
        other => Err(ConfigError::UnsupportedAlgorithm(other.to_owned())),
    }
}

fn is_symmetric(algorithm: Algorithm) -> bool {
    matches!(
        algorithm,
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
    )
}

fn resolve_key_source(algorithm: Algorithm) -> Result<KeySource, ConfigError> {
    if is_symmetric(algorithm) {
        return Ok(KeySource::SecretB64(req_var("JWT_SECRET_B64")?));
    }

    // Asymmetric: a keystore takes precedence over a PEM pair when both
    // are configured.
    if let Some(keystore_file) = opt_var("JWT_KEYSTORE_FILE") {
        let password = req_var("JWT_KEYSTORE_PASSWORD")?;
        return Ok(KeySource::Keystore {
            keystore_file,
            password,
        });
    }

    Ok(KeySource::PemFiles {
        private_key_file: req_var("JWT_PRIVATE_KEY_FILE")?,
        public_key_file: req_var("JWT_PUBLIC_KEY_FILE")?,
    })
}

fn req_var(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key))
}

fn opt_var(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn parse_positive_i64(key: &'static str) -> Result<i64, ConfigError> {
    let v = req_var(key)?;
    v.parse::<i64>()
        .ok()
        .filter(|v| *v > 0)
        .ok_or(ConfigError::Invalid(key))
}
