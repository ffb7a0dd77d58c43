use std::fmt;

use thiserror::Error;

/// Pipeline stage at which a credential was rejected. Stages run in the
/// declaration order below and short-circuit on the first failure, so
/// cheap checks always precede cryptography and the store round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStage {
    Structure,
    Signature,
    StandardClaims,
    Expiration,
    Blacklist,
    BusinessRules,
}

impl fmt::Display for ValidationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValidationStage::Structure => "STRUCTURE",
            ValidationStage::Signature => "SIGNATURE",
            ValidationStage::StandardClaims => "STANDARD_CLAIMS",
            ValidationStage::Expiration => "EXPIRATION",
            ValidationStage::Blacklist => "BLACKLIST",
            ValidationStage::BusinessRules => "BUSINESS_RULES",
        };
        f.write_str(name)
    }
}

/// Typed rejection from the validation pipeline. Callers map this to a
/// user-visible outcome; a claim set from a failed validation must never
/// be trusted, even partially.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("validation failed at {stage}: {reason}")]
pub struct ValidationFailure {
    pub stage: ValidationStage,
    pub reason: String,
}

impl ValidationFailure {
    pub(crate) fn new(stage: ValidationStage, reason: impl Into<String>) -> Self {
        ValidationFailure {
            stage,
            reason: reason.into(),
        }
    }

    /// Expired credentials are distinguished from invalid ones so the
    /// caller can answer "please refresh" instead of "re-authenticate".
    pub fn is_expired(&self) -> bool {
        self.stage == ValidationStage::Expiration
    }

    pub fn is_revoked(&self) -> bool {
        self.stage == ValidationStage::Blacklist
    }
}
