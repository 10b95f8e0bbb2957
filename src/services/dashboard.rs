use chrono::{Duration, NaiveDate};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::announcement::AnnouncementService;
use super::document::{group_by_type, DocumentGroup, DocumentService, RecentDocument};
use super::employee::EmployeeService;
use super::schedule::{ScheduleQuery, ScheduleService};
use super::time_off::{TimeOffQuery, TimeOffService};
use super::ServiceError;
use crate::database::models::{Announcement, Employee, ScheduleView, TimeOffRequest};
use crate::database::{DatabaseError, DatabaseManager};
use crate::storage::DocumentStore;

const RECENT_DOCUMENTS: i64 = 10;
const DASHBOARD_ANNOUNCEMENTS: i64 = 5;
const DASHBOARD_TIME_OFF: i32 = 10;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DepartmentCount {
    pub department: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminStats {
    pub active_employees: i64,
    pub pending_time_off: i64,
    pub documents_this_month: i64,
    pub departments: Vec<DepartmentCount>,
    pub recent_documents: Vec<RecentDocument>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmployeeDashboard {
    pub profile: Employee,
    pub documents: Vec<DocumentGroup>,
    pub time_off: Vec<TimeOffRequest>,
    pub announcements: Vec<Announcement>,
    pub schedules: Vec<ScheduleView>,
}

pub struct DashboardService {
    pool: PgPool,
    store: DocumentStore,
}

impl DashboardService {
    pub async fn new() -> Result<Self, DatabaseError> {
        Ok(Self::with_pool(DatabaseManager::pool().await?, DocumentStore::from_config()))
    }

    pub fn with_pool(pool: PgPool, store: DocumentStore) -> Self {
        Self { pool, store }
    }

    pub async fn stats(&self) -> Result<AdminStats, ServiceError> {
        let (active_employees,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM employees WHERE status = 'active'")
                .fetch_one(&self.pool)
                .await?;

        let departments = sqlx::query_as::<_, DepartmentCount>(
            r#"
            SELECT COALESCE(NULLIF(TRIM(department), ''), 'Unassigned') AS department, COUNT(*) AS count
            FROM employees
            WHERE status = 'active'
            GROUP BY 1
            ORDER BY count DESC, department ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let documents = DocumentService::with_pool(self.pool.clone(), self.store.clone());
        let pending_time_off = TimeOffService::with_pool(self.pool.clone()).pending_count().await?;

        Ok(AdminStats {
            active_employees,
            pending_time_off,
            documents_this_month: documents.count_uploaded_this_month().await?,
            departments,
            recent_documents: documents.recent(RECENT_DOCUMENTS).await?,
        })
    }

    /// Everything the signed-in employee sees on their landing page
    pub async fn for_user(&self, user_id: Uuid, today: NaiveDate) -> Result<EmployeeDashboard, ServiceError> {
        let profile = EmployeeService::with_pool(self.pool.clone()).profile_for_user(user_id).await?;

        let documents = DocumentService::with_pool(self.pool.clone(), self.store.clone())
            .list_for_employee(profile.id, None)
            .await?;

        let time_off = TimeOffService::with_pool(self.pool.clone())
            .list(&TimeOffQuery {
                employee_id: Some(profile.id),
                limit: Some(DASHBOARD_TIME_OFF),
                ..Default::default()
            })
            .await?;

        let announcements = AnnouncementService::with_pool(self.pool.clone())
            .list_visible(profile.department.as_deref(), today, DASHBOARD_ANNOUNCEMENTS)
            .await?;

        let schedules = ScheduleService::with_pool(self.pool.clone())
            .list(
                &ScheduleQuery {
                    employee_id: Some(profile.id),
                    from: Some(today),
                    to: Some(today + Duration::days(6)),
                },
                today,
            )
            .await?;

        Ok(EmployeeDashboard {
            profile,
            documents: group_by_type(documents),
            time_off,
            announcements,
            schedules,
        })
    }
}
