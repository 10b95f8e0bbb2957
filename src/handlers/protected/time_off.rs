// handlers/protected/time_off.rs - /api/time-off

use axum::{
    extract::{Path, Query},
    http::HeaderMap,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::own_employee_id;
use crate::auth::capability::can_approve_time_off;
use crate::auth::nonce::{APPROVE_TIME_OFF, TIME_OFF};
use crate::database::models::TimeOffRequest;
use crate::error::ApiError;
use crate::middleware::auth::INSUFFICIENT_PERMISSIONS;
use crate::middleware::{require_nonce, ApiResponse, ApiResult, AuthUser};
use crate::services::employee::EmployeeService;
use crate::services::time_off::{Decision, TimeOffInput, TimeOffQuery, TimeOffService};
use crate::services::today;

/// POST /api/time-off - Submit a request
///
/// Employees always submit for their own record. Approvers may name any
/// employee, and default to their own record when they do not.
pub async fn submit(
    Extension(auth_user): Extension<AuthUser>,
    headers: HeaderMap,
    Json(mut input): Json<TimeOffInput>,
) -> ApiResult<TimeOffRequest> {
    require_nonce(&headers, &auth_user, TIME_OFF)?;

    if !can_approve_time_off(auth_user.role) || input.employee_id.is_none() {
        input.employee_id = Some(own_employee_id(&auth_user).await?);
    }

    let request = TimeOffService::new().await?.submit(input, today()).await?;
    Ok(ApiResponse::created(request))
}

/// GET /api/time-off - Own requests, or any with filters for approvers
pub async fn list(
    Extension(auth_user): Extension<AuthUser>,
    Query(mut query): Query<TimeOffQuery>,
) -> ApiResult<Vec<TimeOffRequest>> {
    if !can_approve_time_off(auth_user.role) {
        query.employee_id = Some(own_employee_id(&auth_user).await?);
    }
    let requests = TimeOffService::new().await?.list(&query).await?;
    Ok(ApiResponse::success(requests))
}

/// GET /api/time-off/:id
pub async fn get(Extension(auth_user): Extension<AuthUser>, Path(id): Path<Uuid>) -> ApiResult<TimeOffRequest> {
    let request = TimeOffService::new().await?.get(id).await?;

    if !can_approve_time_off(auth_user.role) {
        let own = EmployeeService::new().await?.find_by_user(auth_user.user_id).await?;
        if own.map(|e| e.id) != Some(request.employee_id) {
            tracing::warn!("Forbidden: '{}' tried to read time off request {}", auth_user.username, id);
            return Err(ApiError::forbidden(INSUFFICIENT_PERMISSIONS));
        }
    }
    Ok(ApiResponse::success(request))
}

#[derive(Debug, Default, Deserialize)]
pub struct DecisionBody {
    pub notes: Option<String>,
}

async fn respond(
    auth_user: AuthUser,
    id: Uuid,
    headers: HeaderMap,
    body: Option<Json<DecisionBody>>,
    decision: Decision,
) -> ApiResult<TimeOffRequest> {
    if !can_approve_time_off(auth_user.role) {
        tracing::warn!("Forbidden: '{}' tried to decide time off request {}", auth_user.username, id);
        return Err(ApiError::forbidden(INSUFFICIENT_PERMISSIONS));
    }
    require_nonce(&headers, &auth_user, APPROVE_TIME_OFF)?;

    let notes = body.and_then(|Json(b)| b.notes);
    let request = TimeOffService::new()
        .await?
        .respond(id, decision, auth_user.user_id, notes)
        .await?;
    Ok(ApiResponse::success(request))
}

/// POST /api/time-off/:id/approve
pub async fn approve(
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    body: Option<Json<DecisionBody>>,
) -> ApiResult<TimeOffRequest> {
    respond(auth_user, id, headers, body, Decision::Approve).await
}

/// POST /api/time-off/:id/deny
pub async fn deny(
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    body: Option<Json<DecisionBody>>,
) -> ApiResult<TimeOffRequest> {
    respond(auth_user, id, headers, body, Decision::Deny).await
}
