use super::Role;

/// An identity the upstream authenticator has already verified
/// (password / MFA checks happen before this subsystem is involved).
/// Issuance trusts these fields as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedIdentity {
    pub user_id: i64,
    pub subject: String,
    pub role: Role,
    pub permissions: Vec<String>,
}

impl VerifiedIdentity {
    pub fn new(user_id: i64, subject: String, role: Role, permissions: Vec<String>) -> Self {
        VerifiedIdentity {
            user_id,
            subject,
            role,
            permissions,
        }
    }
}
