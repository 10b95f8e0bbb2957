use axum::Extension;
use serde::Serialize;
use serde_json::{json, Value};

use crate::auth::capability::{landing_page, Landing};
use crate::auth::Capability;
use crate::database::models::User;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ClientInfo, CurrentUser};
use crate::services::user::UserService;

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub user: User,
    pub capabilities: &'static [Capability],
    pub landing: Landing,
}

/// GET /api/auth/whoami - The signed-in user, as currently stored
pub async fn whoami_get(Extension(CurrentUser(user)): Extension<CurrentUser>) -> ApiResult<WhoAmI> {
    Ok(ApiResponse::success(WhoAmI {
        capabilities: user.role.capabilities(),
        landing: landing_page(user.role),
        user,
    }))
}

/// DELETE /api/auth/session - Log out
///
/// Tokens are stateless; logging out records the event and `last_logout_at`
/// and the client discards its token.
pub async fn session_delete(Extension(auth_user): Extension<AuthUser>, client: ClientInfo) -> ApiResult<Value> {
    UserService::new().await?.record_logout(auth_user.user_id, &client).await?;
    tracing::info!("User '{}' logged out", auth_user.username);
    Ok(ApiResponse::success(json!({ "logged_out": true })))
}
