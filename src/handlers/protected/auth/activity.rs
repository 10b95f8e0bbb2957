use axum::Extension;

use crate::database::models::UserActivity;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::activity::ActivityService;

/// GET /api/auth/activity - The caller's recent logins, logouts and password events
pub async fn activity_get(Extension(auth_user): Extension<AuthUser>) -> ApiResult<Vec<UserActivity>> {
    let entries = ActivityService::new().await?.list(auth_user.user_id).await?;
    Ok(ApiResponse::success(entries))
}
