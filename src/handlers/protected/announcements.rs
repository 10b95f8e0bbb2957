// handlers/protected/announcements.rs - /api/announcements

use axum::{
    extract::{Path, Query},
    http::HeaderMap,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::capability::can_manage_announcements;
use crate::auth::nonce::{DELETE_ANNOUNCEMENT, SAVE_ANNOUNCEMENT};
use crate::auth::Capability;
use crate::database::models::Announcement;
use crate::error::ApiError;
use crate::middleware::{require_nonce, ApiResponse, ApiResult, AuthUser};
use crate::services::announcement::{visible_limit, AnnouncementInput, AnnouncementService, ANNOUNCEMENT_NOT_FOUND};
use crate::services::employee::EmployeeService;
use crate::services::today;

#[derive(Debug, Default, Deserialize)]
pub struct AnnouncementQuery {
    /// Managers only: include inactive, scheduled and expired announcements
    #[serde(default)]
    pub all: bool,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

async fn caller_department(auth_user: &AuthUser) -> Result<Option<String>, ApiError> {
    let profile = EmployeeService::new().await?.find_by_user(auth_user.user_id).await?;
    Ok(profile.and_then(|p| p.department))
}

/// GET /api/announcements - What the caller should currently see
pub async fn list(
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<AnnouncementQuery>,
) -> ApiResult<Vec<Announcement>> {
    let service = AnnouncementService::new().await?;

    if query.all && can_manage_announcements(auth_user.role) {
        return Ok(ApiResponse::success(service.list_all(query.limit, query.offset).await?));
    }

    let limit = visible_limit(query.limit)?;
    let department = caller_department(&auth_user).await?;
    let announcements = service.list_visible(department.as_deref(), today(), limit).await?;
    Ok(ApiResponse::success(announcements))
}

/// GET /api/announcements/:id - Non-managers only see announcements visible to them
pub async fn get(Extension(auth_user): Extension<AuthUser>, Path(id): Path<Uuid>) -> ApiResult<Announcement> {
    let announcement = AnnouncementService::new().await?.get(id).await?;

    if !can_manage_announcements(auth_user.role) {
        let department = caller_department(&auth_user).await?;
        let live = announcement.is_active
            && announcement.publish_date <= chrono::Utc::now()
            && announcement.expiry_date.map_or(true, |d| d >= today());
        if !live || !announcement.targets(department.as_deref()) {
            return Err(ApiError::not_found(ANNOUNCEMENT_NOT_FOUND));
        }
    }
    Ok(ApiResponse::success(announcement))
}

/// POST /api/announcements
pub async fn create(
    Extension(auth_user): Extension<AuthUser>,
    headers: HeaderMap,
    Json(input): Json<AnnouncementInput>,
) -> ApiResult<Announcement> {
    auth_user.require(Capability::ManageAnnouncements)?;
    require_nonce(&headers, &auth_user, SAVE_ANNOUNCEMENT)?;

    let announcement = AnnouncementService::new().await?.create(input, auth_user.user_id).await?;
    Ok(ApiResponse::created(announcement))
}

/// PUT /api/announcements/:id
pub async fn update(
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(input): Json<AnnouncementInput>,
) -> ApiResult<Announcement> {
    auth_user.require(Capability::ManageAnnouncements)?;
    require_nonce(&headers, &auth_user, SAVE_ANNOUNCEMENT)?;

    let announcement = AnnouncementService::new().await?.update(id, input).await?;
    Ok(ApiResponse::success(announcement))
}

/// DELETE /api/announcements/:id
pub async fn delete(
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<Value> {
    auth_user.require(Capability::ManageAnnouncements)?;
    require_nonce(&headers, &auth_user, DELETE_ANNOUNCEMENT)?;

    AnnouncementService::new().await?.delete(id).await?;
    Ok(ApiResponse::success(json!({ "deleted": id })))
}
