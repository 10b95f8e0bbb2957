use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use super::{clean, ServiceError};
use crate::config;
use crate::database::models::{Announcement, Priority};
use crate::database::repository::Repository;
use crate::database::{DatabaseError, DatabaseManager};
use crate::filter::FilterData;

pub const TITLE_AND_CONTENT_REQUIRED: &str = "Title and content are required.";
pub const EXPIRY_BEFORE_PUBLISH: &str = "Expiry date cannot be before the publish date.";
pub const ANNOUNCEMENT_NOT_FOUND: &str = "Announcement not found.";
const DEFAULT_VISIBLE_LIMIT: i64 = 20;

/// Page size for the visible list, capped at the configured filter maximum
pub fn visible_limit(requested: Option<i32>) -> Result<i64, ServiceError> {
    let max = i64::from(config::config().filter.max_limit.unwrap_or(i32::MAX));
    match requested {
        Some(limit) if limit < 0 => Err(ServiceError::Validation("Limit must be non-negative.".to_string())),
        Some(limit) => Ok(i64::from(limit).min(max)),
        None => Ok(DEFAULT_VISIBLE_LIMIT.min(max)),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnnouncementInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub priority: Option<Priority>,
    pub target_departments: Option<Vec<String>>,
    pub publish_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnouncementRecord {
    pub title: String,
    pub content: String,
    pub priority: Priority,
    pub target_departments: Vec<String>,
    pub publish_date: DateTime<Utc>,
    pub expiry_date: Option<NaiveDate>,
    pub is_active: bool,
}

impl AnnouncementInput {
    /// `now` stands in for a missing publish date
    pub fn validate(self, now: DateTime<Utc>) -> Result<AnnouncementRecord, ServiceError> {
        let (Some(title), Some(content)) = (clean(self.title), clean(self.content)) else {
            return Err(ServiceError::Validation(TITLE_AND_CONTENT_REQUIRED.to_string()));
        };
        let publish_date = self.publish_date.unwrap_or(now);
        if let Some(expiry) = self.expiry_date {
            if expiry < publish_date.date_naive() {
                return Err(ServiceError::Validation(EXPIRY_BEFORE_PUBLISH.to_string()));
            }
        }

        let mut target_departments: Vec<String> = self
            .target_departments
            .unwrap_or_default()
            .into_iter()
            .filter_map(|d| clean(Some(d)))
            .collect();
        target_departments.sort();
        target_departments.dedup();

        Ok(AnnouncementRecord {
            title,
            content,
            priority: self.priority.unwrap_or_default(),
            target_departments,
            publish_date,
            expiry_date: self.expiry_date,
            is_active: self.is_active.unwrap_or(true),
        })
    }
}

pub struct AnnouncementService {
    pool: PgPool,
}

impl AnnouncementService {
    pub async fn new() -> Result<Self, DatabaseError> {
        Ok(Self::with_pool(DatabaseManager::pool().await?))
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Announcements an employee of `department` should see on `today`
    pub async fn list_visible(
        &self,
        department: Option<&str>,
        today: NaiveDate,
        limit: i64,
    ) -> Result<Vec<Announcement>, ServiceError> {
        let rows = sqlx::query_as::<_, Announcement>(
            r#"
            SELECT * FROM announcements
            WHERE is_active
              AND publish_date <= now()
              AND (expiry_date IS NULL OR expiry_date >= $1)
              AND (
                cardinality(target_departments) = 0
                OR EXISTS (SELECT 1 FROM unnest(target_departments) AS t(dept) WHERE lower(t.dept) = lower($2))
              )
            ORDER BY priority DESC, publish_date DESC
            LIMIT $3
            "#,
        )
        .bind(today)
        .bind(department)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Every announcement, including inactive and expired ones
    pub async fn list_all(&self, limit: Option<i32>, offset: Option<i32>) -> Result<Vec<Announcement>, ServiceError> {
        let filter = FilterData {
            order: Some(json!("publish_date desc")),
            limit,
            offset,
            ..Default::default()
        };
        Ok(Repository::<Announcement>::new(self.pool.clone()).select_any(filter).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Announcement, ServiceError> {
        Repository::<Announcement>::new(self.pool.clone())
            .select_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(ANNOUNCEMENT_NOT_FOUND.to_string()))
    }

    pub async fn create(&self, input: AnnouncementInput, author: Uuid) -> Result<Announcement, ServiceError> {
        let record = input.validate(Utc::now())?;
        let announcement = sqlx::query_as::<_, Announcement>(
            r#"
            INSERT INTO announcements (title, content, author_id, publish_date, is_active, priority, target_departments, expiry_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&record.title)
        .bind(&record.content)
        .bind(author)
        .bind(record.publish_date)
        .bind(record.is_active)
        .bind(record.priority)
        .bind(&record.target_departments)
        .bind(record.expiry_date)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Announcement {} '{}' created", announcement.id, announcement.title);
        Ok(announcement)
    }

    pub async fn update(&self, id: Uuid, input: AnnouncementInput) -> Result<Announcement, ServiceError> {
        let existing = self.get(id).await?;
        let input = AnnouncementInput {
            publish_date: input.publish_date.or(Some(existing.publish_date)),
            ..input
        };
        let record = input.validate(existing.publish_date)?;

        let announcement = sqlx::query_as::<_, Announcement>(
            r#"
            UPDATE announcements
            SET title = $2, content = $3, publish_date = $4, is_active = $5, priority = $6,
                target_departments = $7, expiry_date = $8
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&record.title)
        .bind(&record.content)
        .bind(record.publish_date)
        .bind(record.is_active)
        .bind(record.priority)
        .bind(&record.target_departments)
        .bind(record.expiry_date)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound(ANNOUNCEMENT_NOT_FOUND.to_string()))?;

        Ok(announcement)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = sqlx::query("DELETE FROM announcements WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound(ANNOUNCEMENT_NOT_FOUND.to_string()));
        }
        tracing::info!("Announcement {} deleted", id);
        Ok(())
    }
}
