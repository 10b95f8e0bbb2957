use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Table;
use crate::auth::Role;
use crate::filter::{Column, ColumnKind};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub display_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub force_password_reset: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub last_logout_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Table for User {
    const NAME: &'static str = "users";
    const COLUMNS: &'static [Column] = &[
        Column::new("id", ColumnKind::Uuid),
        Column::new("username", ColumnKind::Text),
        Column::new("email", ColumnKind::Text),
        Column::new("display_name", ColumnKind::Text),
        Column::new("role", ColumnKind::Enum),
        Column::new("is_active", ColumnKind::Bool),
        Column::new("force_password_reset", ColumnKind::Bool),
        Column::new("last_login_at", ColumnKind::Timestamp),
        Column::new("created_at", ColumnKind::Timestamp),
    ];
}
