// handlers/protected/dashboard.rs - /api/dashboard

use axum::Extension;

use crate::auth::Capability;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::dashboard::{AdminStats, DashboardService, EmployeeDashboard};
use crate::services::today;

/// GET /api/dashboard/stats - HR overview (ManageEmployees)
pub async fn stats(Extension(auth_user): Extension<AuthUser>) -> ApiResult<AdminStats> {
    auth_user.require(Capability::ManageEmployees)?;
    let stats = DashboardService::new().await?.stats().await?;
    Ok(ApiResponse::success(stats))
}

/// GET /api/dashboard/me - The caller's own landing page data
pub async fn me(Extension(auth_user): Extension<AuthUser>) -> ApiResult<EmployeeDashboard> {
    let dashboard = DashboardService::new().await?.for_user(auth_user.user_id, today()).await?;
    Ok(ApiResponse::success(dashboard))
}
