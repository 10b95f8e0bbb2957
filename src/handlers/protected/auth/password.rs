use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ClientInfo};
use crate::services::user::UserService;

#[derive(Debug, Deserialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: Option<String>,
}

/// PUT /api/auth/password - Change the caller's password
///
/// Requires the current password; the new one must pass the strength check.
/// Clears a pending forced reset.
pub async fn password_put(
    Extension(auth_user): Extension<AuthUser>,
    client: ClientInfo,
    Json(body): Json<PasswordChange>,
) -> ApiResult<Value> {
    if let Some(confirm) = &body.confirm_password {
        if confirm != &body.new_password {
            return Err(ApiError::validation_error("New passwords do not match.", None));
        }
    }

    UserService::new()
        .await?
        .change_password(auth_user.user_id, &body.current_password, &body.new_password, &client)
        .await?;

    Ok(ApiResponse::success(json!({ "password_changed": true })))
}
