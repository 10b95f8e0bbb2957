// handlers/protected/schedules.rs - /api/schedules

use axum::{
    extract::{Path, Query},
    http::HeaderMap,
    Extension, Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use super::{ensure_employee_access, own_employee_id};
use crate::auth::nonce::{DELETE_SCHEDULE, SAVE_SCHEDULE};
use crate::auth::Capability;
use crate::database::models::ScheduleView;
use crate::middleware::{require_nonce, ApiResponse, ApiResult, AuthUser};
use crate::services::employee::EmployeeService;
use crate::services::schedule::{ScheduleInput, ScheduleQuery, ScheduleService};
use crate::services::today;

/// GET /api/schedules - Shifts in a date window (default: the coming week)
pub async fn list(
    Extension(auth_user): Extension<AuthUser>,
    Query(mut query): Query<ScheduleQuery>,
) -> ApiResult<Vec<ScheduleView>> {
    if !auth_user.can(Capability::ManageEmployees) {
        query.employee_id = Some(own_employee_id(&auth_user).await?);
    }
    let schedules = ScheduleService::new().await?.list(&query, today()).await?;
    Ok(ApiResponse::success(schedules))
}

/// GET /api/schedules/:id - Employees may only read their own shifts
pub async fn get(Extension(auth_user): Extension<AuthUser>, Path(id): Path<Uuid>) -> ApiResult<ScheduleView> {
    let schedule = ScheduleService::new().await?.get(id).await?;
    let employee = EmployeeService::new().await?.get(schedule.schedule.employee_id).await?;
    ensure_employee_access(&auth_user, &employee)?;
    Ok(ApiResponse::success(schedule))
}

/// POST /api/schedules
pub async fn create(
    Extension(auth_user): Extension<AuthUser>,
    headers: HeaderMap,
    Json(input): Json<ScheduleInput>,
) -> ApiResult<ScheduleView> {
    auth_user.require(Capability::ManageEmployees)?;
    require_nonce(&headers, &auth_user, SAVE_SCHEDULE)?;

    let schedule = ScheduleService::new().await?.create(input, auth_user.user_id).await?;
    Ok(ApiResponse::created(schedule))
}

/// PUT /api/schedules/:id
pub async fn update(
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(input): Json<ScheduleInput>,
) -> ApiResult<ScheduleView> {
    auth_user.require(Capability::ManageEmployees)?;
    require_nonce(&headers, &auth_user, SAVE_SCHEDULE)?;

    let schedule = ScheduleService::new().await?.update(id, input).await?;
    Ok(ApiResponse::success(schedule))
}

/// DELETE /api/schedules/:id
pub async fn delete(
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<Value> {
    auth_user.require(Capability::ManageEmployees)?;
    require_nonce(&headers, &auth_user, DELETE_SCHEDULE)?;

    ScheduleService::new().await?.delete(id).await?;
    Ok(ApiResponse::success(json!({ "deleted": id })))
}
