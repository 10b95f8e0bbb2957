// handlers/protected/employees.rs - /api/employees

use axum::{
    extract::{Path, Query},
    http::HeaderMap,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::ensure_employee_access;
use crate::auth::nonce::{DELETE_EMPLOYEE, SAVE_EMPLOYEE};
use crate::auth::Capability;
use crate::database::models::{Document, DocumentType, Employee};
use crate::middleware::{require_nonce, ApiResponse, ApiResult, AuthUser};
use crate::services::document::DocumentService;
use crate::services::employee::{CreatedEmployee, EmployeeInput, EmployeeQuery, EmployeeService};

/// GET /api/employees - Filtered employee list (ManageEmployees)
pub async fn list(
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<EmployeeQuery>,
) -> ApiResult<Vec<Employee>> {
    auth_user.require(Capability::ManageEmployees)?;
    let employees = EmployeeService::new().await?.list(&query).await?;
    Ok(ApiResponse::success(employees))
}

/// POST /api/employees - Create an employee, optionally with a login account
pub async fn create(
    Extension(auth_user): Extension<AuthUser>,
    headers: HeaderMap,
    Json(input): Json<EmployeeInput>,
) -> ApiResult<CreatedEmployee> {
    auth_user.require(Capability::ManageEmployees)?;
    require_nonce(&headers, &auth_user, SAVE_EMPLOYEE)?;

    let created = EmployeeService::new().await?.create(input).await?;
    Ok(ApiResponse::created(created))
}

/// GET /api/employees/me - The caller's own employee record
pub async fn me(Extension(auth_user): Extension<AuthUser>) -> ApiResult<Employee> {
    let profile = EmployeeService::new().await?.profile_for_user(auth_user.user_id).await?;
    Ok(ApiResponse::success(profile))
}

/// GET /api/employees/:id
pub async fn get(Extension(auth_user): Extension<AuthUser>, Path(id): Path<Uuid>) -> ApiResult<Employee> {
    let employee = EmployeeService::new().await?.get(id).await?;
    ensure_employee_access(&auth_user, &employee)?;
    Ok(ApiResponse::success(employee))
}

/// PUT /api/employees/:id - Change the fields present in the body
pub async fn update(
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(input): Json<EmployeeInput>,
) -> ApiResult<Employee> {
    auth_user.require(Capability::ManageEmployees)?;
    require_nonce(&headers, &auth_user, SAVE_EMPLOYEE)?;

    let employee = EmployeeService::new().await?.update(id, input).await?;
    Ok(ApiResponse::success(employee))
}

/// DELETE /api/employees/:id - Refused with 409 while the employee still has documents
pub async fn delete(
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<Value> {
    auth_user.require(Capability::ManageEmployees)?;
    require_nonce(&headers, &auth_user, DELETE_EMPLOYEE)?;

    EmployeeService::new().await?.delete(id).await?;
    Ok(ApiResponse::success(json!({ "deleted": id })))
}

#[derive(Debug, Default, Deserialize)]
pub struct EmployeeDocumentsQuery {
    pub document_type: Option<DocumentType>,
}

/// GET /api/employees/:id/documents - Active documents of one employee
pub async fn documents(
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Query(query): Query<EmployeeDocumentsQuery>,
) -> ApiResult<Vec<Document>> {
    let employee = EmployeeService::new().await?.get(id).await?;
    ensure_employee_access(&auth_user, &employee)?;

    let documents = DocumentService::new()
        .await?
        .list_for_employee(employee.id, query.document_type)
        .await?;
    Ok(ApiResponse::success(documents))
}
