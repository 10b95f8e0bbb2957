use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{today, ServiceError};
use crate::database::models::{Document, DocumentType, Employee};
use crate::database::repository::Repository;
use crate::database::{DatabaseError, DatabaseManager};
use crate::filter::FilterData;
use crate::storage::{sanitize_file_name, DocumentStore};

pub const DOCUMENT_NOT_FOUND: &str = "Document not found.";

/// A validated upload waiting to be stored
#[derive(Debug)]
pub struct Upload {
    pub employee_id: Uuid,
    pub document_type: DocumentType,
    pub year: Option<i32>,
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentQuery {
    pub employee_id: Option<Uuid>,
    pub document_type: Option<DocumentType>,
    pub year: Option<i32>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

impl DocumentQuery {
    fn to_filter(&self) -> FilterData {
        let mut conditions = Map::new();
        if let Some(employee_id) = self.employee_id {
            conditions.insert("employee_id".into(), json!(employee_id));
        }
        if let Some(document_type) = self.document_type {
            conditions.insert("document_type".into(), json!(document_type));
        }
        if let Some(year) = self.year {
            conditions.insert("year".into(), json!(year));
        }
        FilterData {
            where_clause: Some(Value::Object(conditions)),
            order: Some(json!("upload_date desc")),
            limit: self.limit,
            offset: self.offset,
            ..Default::default()
        }
    }
}

/// Recent upload with the owning employee, for the HR dashboard
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RecentDocument {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub document_type: DocumentType,
    pub document_name: String,
    pub file_size: i64,
    pub upload_date: DateTime<Utc>,
    pub year: Option<i32>,
    pub first_name: String,
    pub last_name: String,
    pub employee_code: String,
}

/// Documents of one type, as shown on the employee dashboard
#[derive(Debug, Clone, Serialize)]
pub struct DocumentGroup {
    pub document_type: DocumentType,
    pub label: &'static str,
    pub documents: Vec<Document>,
}

pub fn group_by_type(documents: Vec<Document>) -> Vec<DocumentGroup> {
    DocumentType::ALL
        .iter()
        .filter_map(|doc_type| {
            let docs: Vec<Document> = documents.iter().filter(|d| d.document_type == *doc_type).cloned().collect();
            if docs.is_empty() {
                None
            } else {
                Some(DocumentGroup {
                    document_type: *doc_type,
                    label: doc_type.label(),
                    documents: docs,
                })
            }
        })
        .collect()
}

/// Years accepted on an upload: 1900 through next year
pub fn validate_year(year: Option<i32>) -> Result<(), ServiceError> {
    match year {
        Some(y) if !(1900..=today().year() + 1).contains(&y) => {
            Err(ServiceError::Validation(format!("Year must be between 1900 and {}.", today().year() + 1)))
        }
        _ => Ok(()),
    }
}

pub struct DocumentService {
    pool: PgPool,
    store: DocumentStore,
}

impl DocumentService {
    pub async fn new() -> Result<Self, DatabaseError> {
        Ok(Self::with_pool(DatabaseManager::pool().await?, DocumentStore::from_config()))
    }

    pub fn with_pool(pool: PgPool, store: DocumentStore) -> Self {
        Self { pool, store }
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Validate, write to disk, then record. The file is removed again if the insert fails.
    pub async fn upload(&self, upload: Upload, uploaded_by: Uuid) -> Result<Document, ServiceError> {
        self.store.validate(upload.file_name.as_deref(), &upload.bytes)?;
        validate_year(upload.year)?;

        let employee = Repository::<Employee>::new(self.pool.clone())
            .select_id(upload.employee_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(super::employee::EMPLOYEE_NOT_FOUND.to_string()))?;

        let document_name = sanitize_file_name(upload.file_name.as_deref().unwrap_or_default());
        let stored = self.store.store(upload.document_type, &upload.bytes).await?;

        let inserted = sqlx::query_as::<_, Document>(
            r#"
            INSERT INTO documents (employee_id, document_type, document_name, file_path, file_size, checksum, uploaded_by, year)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(employee.id)
        .bind(upload.document_type)
        .bind(&document_name)
        .bind(&stored.relative_path)
        .bind(stored.size)
        .bind(&stored.checksum)
        .bind(uploaded_by)
        .bind(upload.year)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(document) => {
                tracing::info!(
                    "Uploaded {:?} '{}' for employee {}",
                    document.document_type,
                    document.document_name,
                    employee.employee_id
                );
                Ok(document)
            }
            Err(e) => {
                if let Err(cleanup) = self.store.remove(&stored.relative_path).await {
                    tracing::error!("Failed to remove orphaned upload {}: {}", stored.relative_path, cleanup);
                }
                Err(e.into())
            }
        }
    }

    /// Active documents matching the query
    pub async fn list(&self, query: &DocumentQuery) -> Result<Vec<Document>, ServiceError> {
        Ok(Repository::<Document>::new(self.pool.clone())
            .select_scoped(query.to_filter(), json!({ "is_active": true }))
            .await?)
    }

    pub async fn list_for_employee(
        &self,
        employee_id: Uuid,
        document_type: Option<DocumentType>,
    ) -> Result<Vec<Document>, ServiceError> {
        self.list(&DocumentQuery {
            employee_id: Some(employee_id),
            document_type,
            ..Default::default()
        })
        .await
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<RecentDocument>, ServiceError> {
        let rows = sqlx::query_as::<_, RecentDocument>(
            r#"
            SELECT d.id, d.employee_id, d.document_type, d.document_name, d.file_size, d.upload_date, d.year,
                   e.first_name, e.last_name, e.employee_id AS employee_code
            FROM documents d
            JOIN employees e ON e.id = d.employee_id
            WHERE d.is_active
            ORDER BY d.upload_date DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// An active document
    pub async fn get(&self, id: Uuid) -> Result<Document, ServiceError> {
        let filter = FilterData {
            where_clause: Some(json!({ "id": id, "is_active": true })),
            ..Default::default()
        };
        Repository::<Document>::new(self.pool.clone())
            .select_one(filter)
            .await?
            .ok_or_else(|| ServiceError::NotFound(DOCUMENT_NOT_FOUND.to_string()))
    }

    pub async fn read_file(&self, document: &Document) -> Result<Vec<u8>, ServiceError> {
        Ok(self.store.read(&document.file_path).await?)
    }

    /// Soft delete; the file stays on disk
    pub async fn deactivate(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = sqlx::query("UPDATE documents SET is_active = FALSE WHERE id = $1 AND is_active")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound(DOCUMENT_NOT_FOUND.to_string()));
        }
        tracing::info!("Deactivated document {}", id);
        Ok(())
    }

    pub async fn count_uploaded_this_month(&self) -> Result<i64, ServiceError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM documents WHERE is_active AND upload_date >= date_trunc('month', now())",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(document_type: DocumentType) -> Document {
        Document {
            id: Uuid::new_v4(),
            employee_id: Uuid::new_v4(),
            document_type,
            document_name: "file.pdf".into(),
            file_path: "others/x.pdf".into(),
            file_size: 10,
            checksum: "0".repeat(64),
            upload_date: Utc::now(),
            uploaded_by: None,
            year: Some(2024),
            is_active: true,
        }
    }

    #[test]
    fn groups_follow_type_order_and_skip_empty() {
        let groups = group_by_type(vec![doc(DocumentType::Other), doc(DocumentType::W2), doc(DocumentType::W2)]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].document_type, DocumentType::W2);
        assert_eq!(groups[0].documents.len(), 2);
        assert_eq!(groups[1].label, "Other Documents");
    }

    #[test]
    fn year_bounds() {
        assert!(validate_year(None).is_ok());
        assert!(validate_year(Some(2024)).is_ok());
        assert!(validate_year(Some(1899)).is_err());
        assert!(validate_year(Some(today().year() + 2)).is_err());
    }

    #[test]
    fn query_filter_only_sets_given_fields() {
        let filter = DocumentQuery { document_type: Some(DocumentType::Paystub), ..Default::default() }.to_filter();
        assert_eq!(filter.where_clause, Some(json!({ "document_type": "paystub" })));
    }
}
