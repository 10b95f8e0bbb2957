use axum::http::HeaderMap;

use super::auth::AuthUser;
use crate::auth::nonce::verify_nonce;
use crate::error::ApiError;

pub const NONCE_HEADER: &str = "x-ep-nonce";
pub const SECURITY_CHECK_FAILED: &str = "Security check failed.";

/// Verify the `X-EP-Nonce` header for `action`
pub fn require_nonce(headers: &HeaderMap, user: &AuthUser, action: &str) -> Result<(), ApiError> {
    let token = headers.get(NONCE_HEADER).and_then(|v| v.to_str().ok());
    require_nonce_value(token, user, action)
}

/// Verify a nonce taken from the request body (multipart uploads)
pub fn require_nonce_value(token: Option<&str>, user: &AuthUser, action: &str) -> Result<(), ApiError> {
    match token.and_then(|t| verify_nonce(t, user.user_id, action)) {
        Some(_) => Ok(()),
        None => {
            tracing::warn!("Nonce check failed for '{}' on action {}", user.username, action);
            Err(ApiError::forbidden(SECURITY_CHECK_FAILED))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::nonce::{create_nonce, TIME_OFF};
    use crate::auth::Role;
    use axum::http::HeaderValue;
    use uuid::Uuid;

    fn user() -> AuthUser {
        AuthUser { user_id: Uuid::new_v4(), username: "pat".into(), role: Role::Employee }
    }

    #[test]
    fn header_nonce_is_checked() {
        let user = user();
        let mut headers = HeaderMap::new();
        assert_eq!(require_nonce(&headers, &user, TIME_OFF).unwrap_err().status_code(), 403);

        let token = create_nonce(user.user_id, TIME_OFF);
        headers.insert(NONCE_HEADER, HeaderValue::from_str(&token).unwrap());
        assert!(require_nonce(&headers, &user, TIME_OFF).is_ok());
        assert!(require_nonce(&headers, &user, "delete_document").is_err());
    }
}
