use chrono::{Duration, NaiveDate, NaiveTime};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::{clean, ServiceError};
use crate::database::models::{Employee, Schedule, ScheduleView};
use crate::database::repository::Repository;
use crate::database::{DatabaseError, DatabaseManager};

pub const SCHEDULE_NOT_FOUND: &str = "Schedule not found.";
pub const END_BEFORE_START: &str = "End time must be after start time.";
const DEFAULT_BREAK_MINUTES: i32 = 30;
const DEFAULT_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleInput {
    pub employee_id: Option<Uuid>,
    pub schedule_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub break_duration: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleRecord {
    pub employee_id: Uuid,
    pub schedule_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub break_duration: i32,
    pub notes: Option<String>,
}

impl ScheduleInput {
    pub fn validate(self) -> Result<ScheduleRecord, ServiceError> {
        let (Some(employee_id), Some(schedule_date), Some(start_time), Some(end_time)) =
            (self.employee_id, self.schedule_date, self.start_time, self.end_time)
        else {
            return Err(ServiceError::Validation(
                "Employee, date, start time and end time are required.".to_string(),
            ));
        };
        if end_time <= start_time {
            return Err(ServiceError::Validation(END_BEFORE_START.to_string()));
        }
        let break_duration = self.break_duration.unwrap_or(DEFAULT_BREAK_MINUTES);
        let shift = (end_time - start_time).num_minutes();
        if break_duration < 0 || i64::from(break_duration) >= shift {
            return Err(ServiceError::Validation(
                "Break duration must be shorter than the shift.".to_string(),
            ));
        }
        Ok(ScheduleRecord {
            employee_id,
            schedule_date,
            start_time,
            end_time,
            break_duration,
            notes: clean(self.notes),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleQuery {
    pub employee_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ScheduleQuery {
    /// Inclusive date window, defaulting to a week starting `today`
    pub fn window(&self, today: NaiveDate) -> Result<(NaiveDate, NaiveDate), ServiceError> {
        let from = self.from.unwrap_or(today);
        let to = match self.to {
            Some(to) => to,
            None => from
                .checked_add_signed(Duration::days(DEFAULT_WINDOW_DAYS))
                .ok_or_else(|| ServiceError::Validation("The start of the range is out of bounds.".to_string()))?,
        };
        if to < from {
            return Err(ServiceError::Validation("The end of the range must not precede its start.".to_string()));
        }
        Ok((from, to))
    }
}

pub struct ScheduleService {
    pool: PgPool,
}

impl ScheduleService {
    pub async fn new() -> Result<Self, DatabaseError> {
        Ok(Self::with_pool(DatabaseManager::pool().await?))
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, query: &ScheduleQuery, today: NaiveDate) -> Result<Vec<ScheduleView>, ServiceError> {
        let (from, to) = query.window(today)?;
        let rows = sqlx::query_as::<_, Schedule>(
            r#"
            SELECT * FROM schedules
            WHERE schedule_date BETWEEN $1 AND $2
              AND ($3::uuid IS NULL OR employee_id = $3)
            ORDER BY schedule_date ASC, start_time ASC
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(query.employee_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ScheduleView::from).collect())
    }

    pub async fn get(&self, id: Uuid) -> Result<ScheduleView, ServiceError> {
        Repository::<Schedule>::new(self.pool.clone())
            .select_id(id)
            .await?
            .map(ScheduleView::from)
            .ok_or_else(|| ServiceError::NotFound(SCHEDULE_NOT_FOUND.to_string()))
    }

    pub async fn create(&self, input: ScheduleInput, created_by: Uuid) -> Result<ScheduleView, ServiceError> {
        let record = input.validate()?;
        self.ensure_employee(record.employee_id).await?;

        let schedule = sqlx::query_as::<_, Schedule>(
            r#"
            INSERT INTO schedules (employee_id, schedule_date, start_time, end_time, break_duration, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(record.employee_id)
        .bind(record.schedule_date)
        .bind(record.start_time)
        .bind(record.end_time)
        .bind(record.break_duration)
        .bind(&record.notes)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Schedule {} created for employee {} on {}", schedule.id, schedule.employee_id, schedule.schedule_date);
        Ok(schedule.into())
    }

    pub async fn update(&self, id: Uuid, input: ScheduleInput) -> Result<ScheduleView, ServiceError> {
        let record = input.validate()?;
        self.ensure_employee(record.employee_id).await?;

        sqlx::query_as::<_, Schedule>(
            r#"
            UPDATE schedules
            SET employee_id = $2, schedule_date = $3, start_time = $4, end_time = $5, break_duration = $6, notes = $7
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(record.employee_id)
        .bind(record.schedule_date)
        .bind(record.start_time)
        .bind(record.end_time)
        .bind(record.break_duration)
        .bind(&record.notes)
        .fetch_optional(&self.pool)
        .await?
        .map(ScheduleView::from)
        .ok_or_else(|| ServiceError::NotFound(SCHEDULE_NOT_FOUND.to_string()))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = sqlx::query("DELETE FROM schedules WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound(SCHEDULE_NOT_FOUND.to_string()));
        }
        Ok(())
    }

    async fn ensure_employee(&self, employee_id: Uuid) -> Result<(), ServiceError> {
        Repository::<Employee>::new(self.pool.clone())
            .select_id(employee_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| ServiceError::NotFound(super::employee::EMPLOYEE_NOT_FOUND.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn input(start: NaiveTime, end: NaiveTime, break_duration: Option<i32>) -> ScheduleInput {
        ScheduleInput {
            employee_id: Some(Uuid::new_v4()),
            schedule_date: NaiveDate::from_ymd_opt(2025, 4, 1),
            start_time: Some(start),
            end_time: Some(end),
            break_duration,
            notes: Some("".into()),
        }
    }

    #[test]
    fn default_break_applies() {
        let record = input(t(9, 0), t(17, 0), None).validate().unwrap();
        assert_eq!(record.break_duration, 30);
        assert_eq!(record.notes, None);
    }

    #[test]
    fn end_must_follow_start() {
        let err = input(t(17, 0), t(9, 0), Some(0)).validate().unwrap_err();
        assert_eq!(err.to_string(), END_BEFORE_START);
        assert!(input(t(9, 0), t(9, 0), Some(0)).validate().is_err());
    }

    #[test]
    fn break_must_fit_inside_shift() {
        assert!(input(t(9, 0), t(9, 30), Some(30)).validate().is_err());
        assert!(input(t(9, 0), t(9, 30), Some(-1)).validate().is_err());
        assert!(input(t(9, 0), t(9, 30), Some(29)).validate().is_ok());
    }

    #[test]
    fn window_defaults_to_next_week() {
        let today = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let (from, to) = ScheduleQuery::default().window(today).unwrap();
        assert_eq!(from, today);
        assert_eq!(to, NaiveDate::from_ymd_opt(2025, 4, 8).unwrap());

        let reversed = ScheduleQuery { from: Some(to), to: Some(from), ..Default::default() };
        assert!(reversed.window(today).is_err());
    }

    #[test]
    fn window_near_the_last_date_is_rejected() {
        let today = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let query = ScheduleQuery { from: Some(NaiveDate::MAX - Duration::days(2)), ..Default::default() };
        assert!(matches!(query.window(today), Err(ServiceError::Validation(_))));

        let bounded = ScheduleQuery { from: Some(NaiveDate::MAX - Duration::days(2)), to: Some(NaiveDate::MAX), ..Default::default() };
        assert!(bounded.window(today).is_ok());
    }
}
