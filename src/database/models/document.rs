use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Table;
use crate::filter::{Column, ColumnKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "document_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    W2,
    I9,
    Paystub,
    Policy,
    Other,
}

impl DocumentType {
    pub const ALL: [DocumentType; 5] = [
        DocumentType::W2,
        DocumentType::I9,
        DocumentType::Paystub,
        DocumentType::Policy,
        DocumentType::Other,
    ];

    /// Storage subdirectory holding files of this type
    pub fn directory(&self) -> &'static str {
        match self {
            DocumentType::W2 => "w2s",
            DocumentType::I9 => "i9s",
            DocumentType::Paystub => "paystubs",
            DocumentType::Policy => "policies",
            DocumentType::Other => "others",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DocumentType::W2 => "W-2 Forms",
            DocumentType::I9 => "I-9 Forms",
            DocumentType::Paystub => "Pay Stubs",
            DocumentType::Policy => "Policies",
            DocumentType::Other => "Other Documents",
        }
    }

    pub fn parse(value: &str) -> Option<DocumentType> {
        match value.trim().to_ascii_lowercase().as_str() {
            "w2" => Some(DocumentType::W2),
            "i9" => Some(DocumentType::I9),
            "paystub" => Some(DocumentType::Paystub),
            "policy" => Some(DocumentType::Policy),
            "other" => Some(DocumentType::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Document {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub document_type: DocumentType,
    pub document_name: String,
    #[serde(skip_serializing)]
    pub file_path: String,
    pub file_size: i64,
    pub checksum: String,
    pub upload_date: DateTime<Utc>,
    pub uploaded_by: Option<Uuid>,
    pub year: Option<i32>,
    pub is_active: bool,
}

impl Table for Document {
    const NAME: &'static str = "documents";
    const COLUMNS: &'static [Column] = &[
        Column::new("id", ColumnKind::Uuid),
        Column::new("employee_id", ColumnKind::Uuid),
        Column::new("document_type", ColumnKind::Enum),
        Column::new("document_name", ColumnKind::Text),
        Column::new("file_path", ColumnKind::Text),
        Column::new("file_size", ColumnKind::Integer),
        Column::new("checksum", ColumnKind::Text),
        Column::new("upload_date", ColumnKind::Timestamp),
        Column::new("uploaded_by", ColumnKind::Uuid),
        Column::new("year", ColumnKind::Integer),
        Column::new("is_active", ColumnKind::Bool),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_types_have_distinct_directories() {
        let mut dirs: Vec<_> = DocumentType::ALL.iter().map(|t| t.directory()).collect();
        dirs.sort();
        dirs.dedup();
        assert_eq!(dirs.len(), 5);
        assert_eq!(DocumentType::parse("W2"), Some(DocumentType::W2));
        assert_eq!(serde_json::to_value(DocumentType::I9).unwrap(), "i9");
    }
}
