use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Table;
use crate::filter::{Column, ColumnKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "announcement_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Announcement {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author_id: Option<Uuid>,
    pub publish_date: DateTime<Utc>,
    pub is_active: bool,
    pub priority: Priority,
    /// Empty means every department
    pub target_departments: Vec<String>,
    pub expiry_date: Option<NaiveDate>,
}

impl Announcement {
    pub fn targets(&self, department: Option<&str>) -> bool {
        if self.target_departments.is_empty() {
            return true;
        }
        match department {
            Some(dept) => self.target_departments.iter().any(|d| d.eq_ignore_ascii_case(dept)),
            None => false,
        }
    }
}

impl Table for Announcement {
    const NAME: &'static str = "announcements";
    const COLUMNS: &'static [Column] = &[
        Column::new("id", ColumnKind::Uuid),
        Column::new("title", ColumnKind::Text),
        Column::new("author_id", ColumnKind::Uuid),
        Column::new("publish_date", ColumnKind::Timestamp),
        Column::new("is_active", ColumnKind::Bool),
        Column::new("priority", ColumnKind::Enum),
        Column::new("target_departments", ColumnKind::TextArray),
        Column::new("expiry_date", ColumnKind::Date),
    ];
}
