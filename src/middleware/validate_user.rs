use axum::{extract::Request, middleware::Next, response::Response};

use super::auth::AuthUser;
use crate::auth::capability::has_portal_access;
use crate::database::models::User;
use crate::error::ApiError;
use crate::services::user::UserService;

/// The stored user behind the request's token
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// Re-reads the token's user from the store: it must still exist and be
/// active. The stored role replaces the one in the token so role changes
/// apply without waiting for the token to expire.
pub async fn validate_user_middleware(
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required before user validation"))?;

    let user = UserService::new()
        .await?
        .find_by_id(auth_user.user_id)
        .await?
        .ok_or_else(|| {
            tracing::warn!("User validation failed: '{}' ({}) no longer exists", auth_user.username, auth_user.user_id);
            ApiError::unauthorized("User account no longer exists")
        })?;

    if !has_portal_access(user.role, user.is_active) {
        tracing::warn!("User validation failed: '{}' is deactivated", user.username);
        return Err(ApiError::forbidden("Your account has been deactivated."));
    }

    if user.role != auth_user.role {
        tracing::debug!("Role for '{}' changed from {} to {}", user.username, auth_user.role, user.role);
    }

    let validated = AuthUser {
        user_id: user.id,
        username: user.username.clone(),
        role: user.role,
    };

    request.extensions_mut().insert(validated);
    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}
