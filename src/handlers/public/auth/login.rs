// handlers/public/auth/login.rs - POST /auth/login handler

use axum::Json;
use serde::Deserialize;

use super::TokenResponse;
use crate::middleware::{ApiResponse, ApiResult, ClientInfo};
use crate::services::user::UserService;

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    /// Username or email address
    pub username: Option<String>,
    pub password: Option<String>,
}

/// POST /auth/login - Exchange credentials for a JWT
///
/// ```json
/// { "username": "jdoe", "password": "..." }
/// ```
///
/// Responds with the token, the user, the landing page for the user's role
/// and whether a password change is pending. Empty fields give 400, bad
/// credentials 401 and deactivated accounts 403.
pub async fn login_post(client: ClientInfo, Json(body): Json<LoginRequest>) -> ApiResult<TokenResponse> {
    let user = UserService::new()
        .await?
        .authenticate(body.username.as_deref(), body.password.as_deref(), &client)
        .await?;

    Ok(ApiResponse::success(TokenResponse::issue(user)?))
}
