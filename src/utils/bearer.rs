/// Credentials travel in an `Authorization: Bearer <token>` header.
const BEARER_PREFIX: &str = "Bearer ";

/// Extract the credential from an `Authorization` header value.
///
/// `None` means "no credential supplied" (absent or malformed prefix),
/// which callers treat differently from an invalid credential.
pub fn extract_bearer(header_value: &str) -> Option<&str> {
    let token = header_value.strip_prefix(BEARER_PREFIX)?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
