use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use sqlx::PgPool;
use uuid::Uuid;

use super::{clean, ServiceError};
use crate::database::models::{Employee, TimeOffRequest, TimeOffStatus, TimeOffType};
use crate::database::repository::Repository;
use crate::database::{DatabaseError, DatabaseManager};
use crate::filter::FilterData;

pub const REQUIRED_FIELDS: &str = "All required fields must be filled.";
pub const END_BEFORE_START: &str = "End date must be after start date.";
pub const START_IN_PAST: &str = "Start date cannot be in the past.";
pub const REQUEST_NOT_FOUND: &str = "Time off request not found.";
pub const ALREADY_PROCESSED: &str = "This request has already been processed.";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeOffInput {
    pub employee_id: Option<Uuid>,
    pub request_type: Option<TimeOffType>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub days_requested: Option<Decimal>,
    pub reason: Option<String>,
}

/// A submission that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct TimeOffSubmission {
    pub employee_id: Uuid,
    pub request_type: TimeOffType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days_requested: Decimal,
    pub reason: Option<String>,
}

/// Check a submission against the calendar date `today`.
pub fn validate_submission(input: TimeOffInput, today: NaiveDate) -> Result<TimeOffSubmission, ServiceError> {
    let (Some(employee_id), Some(request_type), Some(start_date), Some(end_date), Some(days_requested)) = (
        input.employee_id,
        input.request_type,
        input.start_date,
        input.end_date,
        input.days_requested,
    ) else {
        return Err(ServiceError::Validation(REQUIRED_FIELDS.to_string()));
    };

    if start_date >= end_date {
        return Err(ServiceError::Validation(END_BEFORE_START.to_string()));
    }
    if start_date < today {
        return Err(ServiceError::Validation(START_IN_PAST.to_string()));
    }

    if days_requested <= Decimal::ZERO || !(days_requested * Decimal::from(2)).fract().is_zero() {
        return Err(ServiceError::Validation(
            "Days requested must be a positive number in half-day steps.".to_string(),
        ));
    }
    if days_requested > Decimal::new(995, 1) {
        return Err(ServiceError::Validation("Days requested cannot exceed 99.5.".to_string()));
    }
    let span = (end_date - start_date).num_days() + 1;
    if days_requested > Decimal::from(span) {
        return Err(ServiceError::Validation(format!(
            "Days requested cannot exceed the {} days between start and end date.",
            span
        )));
    }

    Ok(TimeOffSubmission {
        employee_id,
        request_type,
        start_date,
        end_date,
        days_requested: days_requested.normalize(),
        reason: clean(input.reason),
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeOffQuery {
    pub status: Option<TimeOffStatus>,
    pub employee_id: Option<Uuid>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

impl TimeOffQuery {
    fn to_filter(&self) -> FilterData {
        let mut conditions = Map::new();
        if let Some(status) = self.status {
            conditions.insert("status".into(), json!(status));
        }
        if let Some(employee_id) = self.employee_id {
            conditions.insert("employee_id".into(), json!(employee_id));
        }
        FilterData {
            where_clause: Some(Value::Object(conditions)),
            order: Some(json!("request_date desc")),
            limit: self.limit,
            offset: self.offset,
            ..Default::default()
        }
    }
}

/// Approver's decision on a pending request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Deny,
}

impl Decision {
    fn status(self) -> TimeOffStatus {
        match self {
            Decision::Approve => TimeOffStatus::Approved,
            Decision::Deny => TimeOffStatus::Denied,
        }
    }
}

pub struct TimeOffService {
    pool: PgPool,
}

impl TimeOffService {
    pub async fn new() -> Result<Self, DatabaseError> {
        Ok(Self::with_pool(DatabaseManager::pool().await?))
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn submit(&self, input: TimeOffInput, today: NaiveDate) -> Result<TimeOffRequest, ServiceError> {
        let submission = validate_submission(input, today)?;

        Repository::<Employee>::new(self.pool.clone())
            .select_id(submission.employee_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(super::employee::EMPLOYEE_NOT_FOUND.to_string()))?;

        let request = sqlx::query_as::<_, TimeOffRequest>(
            r#"
            INSERT INTO time_off_requests (employee_id, request_type, start_date, end_date, days_requested, reason)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(submission.employee_id)
        .bind(submission.request_type)
        .bind(submission.start_date)
        .bind(submission.end_date)
        .bind(submission.days_requested)
        .bind(&submission.reason)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(
            "Time off request {} submitted for employee {} ({} days)",
            request.id,
            request.employee_id,
            request.days_requested
        );
        Ok(request)
    }

    pub async fn list(&self, query: &TimeOffQuery) -> Result<Vec<TimeOffRequest>, ServiceError> {
        Ok(Repository::<TimeOffRequest>::new(self.pool.clone())
            .select_any(query.to_filter())
            .await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<TimeOffRequest, ServiceError> {
        Repository::<TimeOffRequest>::new(self.pool.clone())
            .select_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(REQUEST_NOT_FOUND.to_string()))
    }

    /// Move a pending request to approved or denied
    pub async fn respond(
        &self,
        id: Uuid,
        decision: Decision,
        approver: Uuid,
        notes: Option<String>,
    ) -> Result<TimeOffRequest, ServiceError> {
        let updated = sqlx::query_as::<_, TimeOffRequest>(
            r#"
            UPDATE time_off_requests
            SET status = $2, approved_by = $3, response_date = now(), notes = $4
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(decision.status())
        .bind(approver)
        .bind(clean(notes))
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(request) => {
                tracing::info!("Time off request {} marked {:?} by {}", id, request.status, approver);
                Ok(request)
            }
            None => {
                // Distinguish a missing request from one already decided
                self.get(id).await?;
                Err(ServiceError::Conflict(ALREADY_PROCESSED.to_string()))
            }
        }
    }

    pub async fn pending_count(&self) -> Result<i64, ServiceError> {
        Ok(Repository::<TimeOffRequest>::new(self.pool.clone())
            .count_scoped(json!({ "status": "pending" }))
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn input(start: NaiveDate, end: NaiveDate, days: &str) -> TimeOffInput {
        TimeOffInput {
            employee_id: Some(Uuid::new_v4()),
            request_type: Some(TimeOffType::Vacation),
            start_date: Some(start),
            end_date: Some(end),
            days_requested: Some(days.parse().unwrap()),
            reason: Some("  family trip ".into()),
        }
    }

    fn message(err: ServiceError) -> String {
        err.to_string()
    }

    #[test]
    fn accepts_valid_request() {
        let today = date(2025, 6, 1);
        let ok = validate_submission(input(date(2025, 6, 2), date(2025, 6, 6), "4.5"), today).unwrap();
        assert_eq!(ok.days_requested, "4.5".parse::<Decimal>().unwrap());
        assert_eq!(ok.reason.as_deref(), Some("family trip"));
    }

    #[test]
    fn missing_fields() {
        let mut req = input(date(2025, 6, 2), date(2025, 6, 6), "1");
        req.request_type = None;
        let err = validate_submission(req, date(2025, 6, 1)).unwrap_err();
        assert_eq!(message(err), REQUIRED_FIELDS);
    }

    #[test]
    fn end_must_follow_start() {
        let today = date(2025, 6, 1);
        let same_day = validate_submission(input(date(2025, 6, 2), date(2025, 6, 2), "1"), today).unwrap_err();
        assert_eq!(message(same_day), END_BEFORE_START);
        let reversed = validate_submission(input(date(2025, 6, 5), date(2025, 6, 2), "1"), today).unwrap_err();
        assert_eq!(message(reversed), END_BEFORE_START);
    }

    #[test]
    fn start_in_the_past_is_rejected_but_today_is_fine() {
        let today = date(2025, 6, 10);
        let err = validate_submission(input(date(2025, 6, 9), date(2025, 6, 12), "1"), today).unwrap_err();
        assert_eq!(message(err), START_IN_PAST);
        assert!(validate_submission(input(today, date(2025, 6, 12), "1"), today).is_ok());
    }

    #[test]
    fn day_counts() {
        let today = date(2025, 6, 1);
        let (start, end) = (date(2025, 6, 2), date(2025, 6, 4));
        assert!(validate_submission(input(start, end, "0"), today).is_err());
        assert!(validate_submission(input(start, end, "1.25"), today).is_err());
        assert!(validate_submission(input(start, end, "3.5"), today).is_err());
        assert!(validate_submission(input(start, end, "3"), today).is_ok());
        assert!(validate_submission(input(start, date(2025, 12, 31), "100"), today).is_err());
    }

    #[test]
    fn query_filter() {
        let filter = TimeOffQuery { status: Some(TimeOffStatus::Pending), ..Default::default() }.to_filter();
        assert_eq!(filter.where_clause, Some(json!({ "status": "pending" })));
        assert_eq!(filter.order, Some(json!("request_date desc")));
    }
}
