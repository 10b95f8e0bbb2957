// handlers/elevated/users.rs - /api/admin/users

use axum::{
    extract::{Path, Query},
    http::HeaderMap,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::auth::nonce::MANAGE_USERS;
use crate::auth::Role;
use crate::database::models::User;
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::{require_nonce, ApiResponse, ApiResult, AuthUser, ClientInfo};
use crate::services::user::{CreatedUser, NewUser, UserService};

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub role: Option<Role>,
    pub active: Option<bool>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

impl UserListQuery {
    fn to_filter(&self) -> FilterData {
        let mut conditions = Map::new();
        if let Some(role) = self.role {
            conditions.insert("role".into(), json!(role));
        }
        if let Some(active) = self.active {
            conditions.insert("is_active".into(), json!(active));
        }
        FilterData {
            where_clause: Some(Value::Object(conditions)),
            limit: self.limit,
            offset: self.offset,
            ..Default::default()
        }
    }
}

/// GET /api/admin/users
pub async fn list(Query(query): Query<UserListQuery>) -> ApiResult<Vec<User>> {
    let users = UserService::new().await?.list(query.to_filter()).await?;
    Ok(ApiResponse::success(users))
}

/// POST /api/admin/users - Create an account; a password is generated when none is given
pub async fn create(
    Extension(auth_user): Extension<AuthUser>,
    headers: HeaderMap,
    Json(new_user): Json<NewUser>,
) -> ApiResult<CreatedUser> {
    require_nonce(&headers, &auth_user, MANAGE_USERS)?;
    let created = UserService::new().await?.create(new_user).await?;
    tracing::info!("'{}' created user '{}'", auth_user.username, created.user.username);
    Ok(ApiResponse::created(created))
}

/// POST /api/admin/users/:id/force-reset - Require a password change at next login
pub async fn force_reset(
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    client: ClientInfo,
    headers: HeaderMap,
) -> ApiResult<User> {
    require_nonce(&headers, &auth_user, MANAGE_USERS)?;
    let user = UserService::new().await?.force_password_reset(id, &client).await?;
    Ok(ApiResponse::success(user))
}

#[derive(Debug, Deserialize)]
pub struct RoleChange {
    pub role: Role,
}

/// PUT /api/admin/users/:id/role
pub async fn set_role(
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<RoleChange>,
) -> ApiResult<User> {
    require_nonce(&headers, &auth_user, MANAGE_USERS)?;
    if id == auth_user.user_id && body.role != Role::Administrator {
        return Err(ApiError::conflict("You cannot remove your own administrator role."));
    }
    let user = UserService::new().await?.set_role(id, body.role).await?;
    tracing::info!("'{}' set role of '{}' to {}", auth_user.username, user.username, user.role);
    Ok(ApiResponse::success(user))
}

#[derive(Debug, Deserialize)]
pub struct ActiveChange {
    pub active: bool,
}

/// PUT /api/admin/users/:id/active - Activate or deactivate an account
pub async fn set_active(
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<ActiveChange>,
) -> ApiResult<User> {
    require_nonce(&headers, &auth_user, MANAGE_USERS)?;
    if id == auth_user.user_id && !body.active {
        return Err(ApiError::conflict("You cannot deactivate your own account."));
    }
    let user = UserService::new().await?.set_active(id, body.active).await?;
    tracing::info!("'{}' set active={} for '{}'", auth_user.username, user.is_active, user.username);
    Ok(ApiResponse::success(user))
}
