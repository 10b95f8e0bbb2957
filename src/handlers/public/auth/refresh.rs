// handlers/public/auth/refresh.rs - POST /auth/refresh handler

use axum::Json;
use serde::Deserialize;

use super::TokenResponse;
use crate::auth::capability::has_portal_access;
use crate::auth::decode_for_refresh;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, ClientInfo};
use crate::services::user::{UserService, ACCOUNT_DISABLED};

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub token: String,
}

/// POST /auth/refresh - Trade a recently expired (or live) token for a new one
///
/// The token must carry a valid signature and be no more than
/// `refresh_grace_hours` past its expiry. The user is re-read so a
/// deactivated account or changed role takes effect here.
pub async fn refresh_post(client: ClientInfo, Json(body): Json<RefreshRequest>) -> ApiResult<TokenResponse> {
    let claims = decode_for_refresh(body.token.trim())?;

    let users = UserService::new().await?;
    let user = users
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User account no longer exists"))?;

    if !has_portal_access(user.role, user.is_active) {
        tracing::warn!("Refresh refused for deactivated user '{}'", user.username);
        return Err(ApiError::forbidden(ACCOUNT_DISABLED));
    }

    users.record_refresh(user.id, &client).await?;
    Ok(ApiResponse::success(TokenResponse::issue(user)?))
}
