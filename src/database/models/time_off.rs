use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Table;
use crate::filter::{Column, ColumnKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "time_off_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TimeOffType {
    Vacation,
    Sick,
    Personal,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "time_off_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TimeOffStatus {
    Pending,
    Approved,
    Denied,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TimeOffRequest {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub request_type: TimeOffType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days_requested: Decimal,
    pub reason: Option<String>,
    pub status: TimeOffStatus,
    pub approved_by: Option<Uuid>,
    pub request_date: DateTime<Utc>,
    pub response_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl Table for TimeOffRequest {
    const NAME: &'static str = "time_off_requests";
    const COLUMNS: &'static [Column] = &[
        Column::new("id", ColumnKind::Uuid),
        Column::new("employee_id", ColumnKind::Uuid),
        Column::new("request_type", ColumnKind::Enum),
        Column::new("start_date", ColumnKind::Date),
        Column::new("end_date", ColumnKind::Date),
        Column::new("days_requested", ColumnKind::Numeric),
        Column::new("status", ColumnKind::Enum),
        Column::new("approved_by", ColumnKind::Uuid),
        Column::new("request_date", ColumnKind::Timestamp),
        Column::new("response_date", ColumnKind::Timestamp),
    ];
}
