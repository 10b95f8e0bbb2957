use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const LOGIN: &str = "login";
pub const LOGOUT: &str = "logout";
pub const PASSWORD_CHANGE: &str = "password_change";
pub const PASSWORD_RESET_FORCED: &str = "password_reset_forced";
pub const TOKEN_REFRESH: &str = "token_refresh";

/// One entry in a user's recent activity trail
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserActivity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity: String,
    pub details: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}
