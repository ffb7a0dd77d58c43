use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Role, TokenType, VerifiedIdentity};

/// Wire form of the credential payload (the claim set as it is signed).
///
/// Registered claims follow RFC 7519 short names; custom claims use the
/// camelCase names the account backend's other services expect. Optional
/// members are omitted from the payload entirely when absent.
///
/// Deserialization is deliberately permissive: missing members decode to
/// defaults so that presence and well-formedness are judged by the
/// validation pipeline stage responsible for them, not by serde.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: String,
    #[serde(default)]
    pub iss: String,
    #[serde(default)]
    pub aud: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default)]
    pub jti: String,
    #[serde(rename = "userId", default)]
    pub user_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
    #[serde(rename = "tokenType", default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

impl Claims {
    /// Build the claim set for a verified identity.
    ///
    /// Refresh tokens carry only subject / userId / tokenType on top of
    /// the registered claims, so an intercepted refresh token reveals no
    /// role or permission data.
    pub fn for_identity(
        identity: &VerifiedIdentity,
        token_type: TokenType,
        issuer: &str,
        audience: &str,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        jti: &str,
    ) -> Self {
        let reduced = token_type == TokenType::Refresh;
        Claims {
            sub: identity.subject.clone(),
            iss: issuer.to_owned(),
            aud: audience.to_owned(),
            iat: Some(now.timestamp()),
            nbf: Some(now.timestamp()),
            exp: Some(expires_at.timestamp()),
            jti: jti.to_owned(),
            user_id: identity.user_id,
            role: (!reduced).then(|| identity.role.as_str().to_owned()),
            permissions: (!reduced).then(|| identity.permissions.clone()),
            token_type: Some(token_type.as_str().to_owned()),
        }
    }
}

/// Fully validated, typed claim set. Only produced by a validation run
/// in which every pipeline stage passed.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimSet {
    pub subject: String,
    pub issuer: String,
    pub audience: String,
    pub issued_at: DateTime<Utc>,
    pub not_before: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub token_id: String,
    pub user_id: i64,
    /// None for refresh tokens, which omit the claim.
    pub role: Option<Role>,
    pub permissions: Vec<String>,
    pub token_type: TokenType,
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn identity() -> VerifiedIdentity {
        VerifiedIdentity::new(
            7,
            "user@example.com".to_owned(),
            Role::Premium,
            vec!["profile:read".to_owned()],
        )
    }

    #[test]
    fn full_claims_carry_role_and_permissions() {
        let now = Utc::now();
        let claims = Claims::for_identity(
            &identity(),
            TokenType::Access,
            "issuer",
            "audience",
            now,
            now + Duration::minutes(15),
            "jti-1",
        );
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["role"], "PREMIUM");
        assert_eq!(json["permissions"][0], "profile:read");
        assert_eq!(json["tokenType"], "ACCESS");
        assert_eq!(json["userId"], 7);
        assert_eq!(json["nbf"], json["iat"]);
    }

    #[test]
    fn refresh_claims_omit_role_and_permissions() {
        let now = Utc::now();
        let claims = Claims::for_identity(
            &identity(),
            TokenType::Refresh,
            "issuer",
            "audience",
            now,
            now + Duration::days(7),
            "jti-2",
        );
        let json = serde_json::to_value(&claims).unwrap();
        let object = json.as_object().unwrap();
        assert!(!object.contains_key("role"));
        assert!(!object.contains_key("permissions"));
        assert_eq!(json["tokenType"], "REFRESH");
        assert_eq!(json["sub"], "user@example.com");
        assert_eq!(json["userId"], 7);
    }

    #[test]
    fn missing_members_decode_to_defaults() {
        let claims: Claims = serde_json::from_str("{}").unwrap();
        assert!(claims.sub.is_empty());
        assert!(claims.iat.is_none());
        assert!(claims.role.is_none());
        assert!(claims.token_type.is_none());
        assert_eq!(claims.user_id, 0);
    }
}
