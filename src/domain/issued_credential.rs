use chrono::{DateTime, Utc};

use super::TokenType;

/// A freshly signed credential plus the metadata callers need to revoke
/// it later without re-parsing the token.
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    pub token: String,
    pub token_id: String,
    pub token_type: TokenType,
    pub expires_at: DateTime<Utc>,
}
