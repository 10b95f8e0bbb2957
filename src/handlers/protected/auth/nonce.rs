use axum::{extract::Path, Extension};
use serde_json::{json, Value};

use crate::auth::nonce::{create_nonce, known_action};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, NONCE_HEADER};

/// GET /api/auth/nonce/:action - Issue a nonce for one mutating action
pub async fn nonce_get(Extension(auth_user): Extension<AuthUser>, Path(action): Path<String>) -> ApiResult<Value> {
    let action = known_action(&action).ok_or_else(|| ApiError::not_found(format!("Unknown action: {}", action)))?;
    let nonce = create_nonce(auth_user.user_id, action);

    Ok(ApiResponse::success(json!({
        "action": action,
        "nonce": nonce,
        "header": NONCE_HEADER,
    })))
}
