// handlers/protected/documents.rs - /api/documents

use axum::{
    extract::{Multipart, Path, Query},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Extension,
};
use serde_json::{json, Value};
use uuid::Uuid;

use super::{ensure_employee_access, own_employee_id};
use crate::auth::nonce::{DELETE_DOCUMENT, UPLOAD_DOCUMENT};
use crate::auth::Capability;
use crate::database::models::{Document, DocumentType};
use crate::error::ApiError;
use crate::middleware::{require_nonce, require_nonce_value, ApiResponse, ApiResult, AuthUser};
use crate::services::document::{DocumentQuery, DocumentService, RecentDocument, Upload};
use crate::services::employee::EmployeeService;
use crate::storage::sanitize_file_name;

const RECENT_LIMIT: i64 = 10;

/// Fields collected from the upload form
#[derive(Debug, Default)]
struct UploadForm {
    employee_id: Option<String>,
    document_type: Option<String>,
    year: Option<String>,
    nonce: Option<String>,
    file_name: Option<String>,
    bytes: Vec<u8>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = UploadForm::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "document" => {
                    form.file_name = field.file_name().map(str::to_string);
                    form.bytes = field.bytes().await?.to_vec();
                }
                "employee_id" => form.employee_id = Some(field.text().await?),
                "document_type" => form.document_type = Some(field.text().await?),
                "year" => form.year = Some(field.text().await?),
                "nonce" => form.nonce = Some(field.text().await?),
                other => tracing::debug!("Ignoring upload field '{}'", other),
            }
        }
        Ok(form)
    }

    fn into_upload(self) -> Result<Upload, ApiError> {
        let employee_id = self
            .employee_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ApiError::validation_error("Please select an employee.", None))?;
        let employee_id =
            Uuid::parse_str(employee_id).map_err(|_| ApiError::bad_request("Invalid employee id."))?;

        let document_type = self
            .document_type
            .as_deref()
            .and_then(DocumentType::parse)
            .ok_or_else(|| ApiError::validation_error("Please select a valid document type.", None))?;

        let year = match self.year.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(y) => Some(y.parse::<i32>().map_err(|_| ApiError::validation_error("Invalid year.", None))?),
            None => None,
        };

        Ok(Upload {
            employee_id,
            document_type,
            year,
            file_name: self.file_name,
            bytes: self.bytes,
        })
    }
}

/// POST /api/documents - Multipart upload (UploadDocuments)
///
/// Fields: `employee_id`, `document_type`, optional `year`, `nonce` (or the
/// nonce header) and the PDF itself in `document`.
pub async fn upload(
    Extension(auth_user): Extension<AuthUser>,
    headers: HeaderMap,
    multipart: Multipart,
) -> ApiResult<Document> {
    auth_user.require(Capability::UploadDocuments)?;

    let mut form = UploadForm::read(multipart).await?;
    match form.nonce.take() {
        Some(nonce) => require_nonce_value(Some(&nonce), &auth_user, UPLOAD_DOCUMENT)?,
        None => require_nonce(&headers, &auth_user, UPLOAD_DOCUMENT)?,
    }

    let document = DocumentService::new()
        .await?
        .upload(form.into_upload()?, auth_user.user_id)
        .await?;
    Ok(ApiResponse::created(document))
}

/// GET /api/documents - Managers filter freely; employees only see their own
pub async fn list(
    Extension(auth_user): Extension<AuthUser>,
    Query(mut query): Query<DocumentQuery>,
) -> ApiResult<Vec<Document>> {
    if !auth_user.can(Capability::ManageEmployees) {
        query.employee_id = Some(own_employee_id(&auth_user).await?);
    }
    let documents = DocumentService::new().await?.list(&query).await?;
    Ok(ApiResponse::success(documents))
}

/// GET /api/documents/recent - Latest uploads with their employees
pub async fn recent(Extension(auth_user): Extension<AuthUser>) -> ApiResult<Vec<RecentDocument>> {
    auth_user.require(Capability::UploadDocuments)?;
    let documents = DocumentService::new().await?.recent(RECENT_LIMIT).await?;
    Ok(ApiResponse::success(documents))
}

/// GET /api/documents/:id/download - The PDF as an attachment
pub async fn download(
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let service = DocumentService::new().await?;
    let document = service.get(id).await?;
    let employee = EmployeeService::new().await?.get(document.employee_id).await?;
    ensure_employee_access(&auth_user, &employee)?;

    let bytes = service.read_file(&document).await?;
    tracing::info!("User '{}' downloaded document {}", auth_user.username, document.id);

    let disposition = format!("attachment; filename=\"{}\"", sanitize_file_name(&document.document_name));
    let disposition = HeaderValue::from_str(&disposition)
        .unwrap_or_else(|_| HeaderValue::from_static("attachment; filename=\"document.pdf\""));

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
            (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
            (header::CACHE_CONTROL, HeaderValue::from_static("private, no-store")),
        ],
        bytes,
    )
        .into_response())
}

/// DELETE /api/documents/:id - Soft delete
pub async fn delete(
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<Value> {
    auth_user.require(Capability::UploadDocuments)?;
    require_nonce(&headers, &auth_user, DELETE_DOCUMENT)?;

    DocumentService::new().await?.deactivate(id).await?;
    Ok(ApiResponse::success(json!({ "deleted": id })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> UploadForm {
        UploadForm {
            employee_id: Some(Uuid::new_v4().to_string()),
            document_type: Some("paystub".into()),
            year: Some(" 2024 ".into()),
            nonce: None,
            file_name: Some("pay.pdf".into()),
            bytes: b"%PDF-1.4".to_vec(),
        }
    }

    #[test]
    fn form_converts_to_upload() {
        let upload = form().into_upload().unwrap();
        assert_eq!(upload.document_type, DocumentType::Paystub);
        assert_eq!(upload.year, Some(2024));
    }

    #[test]
    fn form_rejects_bad_fields() {
        let mut bad_type = form();
        bad_type.document_type = Some("resume".into());
        assert_eq!(bad_type.into_upload().unwrap_err().status_code(), 400);

        let mut bad_id = form();
        bad_id.employee_id = Some("42".into());
        assert_eq!(bad_id.into_upload().unwrap_err().message(), "Invalid employee id.");

        let mut blank_year = form();
        blank_year.year = Some("".into());
        assert_eq!(blank_year.into_upload().unwrap().year, None);
    }
}
