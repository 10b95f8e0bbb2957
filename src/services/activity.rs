use sqlx::PgPool;
use uuid::Uuid;

use super::ServiceError;
use crate::config;
use crate::database::models::UserActivity;
use crate::database::{DatabaseError, DatabaseManager};
use crate::middleware::ClientInfo;

/// Per-user activity trail, capped at the configured number of entries
pub struct ActivityService {
    pool: PgPool,
}

impl ActivityService {
    pub async fn new() -> Result<Self, DatabaseError> {
        Ok(Self::with_pool(DatabaseManager::pool().await?))
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Newest first
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<UserActivity>, ServiceError> {
        let rows = sqlx::query_as::<_, UserActivity>(
            "SELECT * FROM user_activity WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(config::config().security.activity_log_limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

/// Append an entry and prune everything beyond the newest `activity_log_limit`
pub async fn record_activity(
    pool: &PgPool,
    user_id: Uuid,
    activity: &str,
    details: Option<&str>,
    client: &ClientInfo,
) -> Result<(), ServiceError> {
    sqlx::query(
        "INSERT INTO user_activity (user_id, activity, details, ip_address, user_agent) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(user_id)
    .bind(activity)
    .bind(details)
    .bind(&client.ip)
    .bind(client.user_agent.as_deref())
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        DELETE FROM user_activity
        WHERE user_id = $1
          AND id NOT IN (
            SELECT id FROM user_activity
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
          )
        "#,
    )
    .bind(user_id)
    .bind(config::config().security.activity_log_limit)
    .execute(pool)
    .await?;

    if config::config().security.enable_audit_logging {
        tracing::info!(user_id = %user_id, activity, ip = %client.ip, "User activity");
    }
    Ok(())
}
