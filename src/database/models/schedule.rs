use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Table;
use crate::filter::{Column, ColumnKind};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Schedule {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub schedule_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// Minutes
    pub break_duration: i32,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Schedule {
    /// Shift length minus the break, never negative
    pub fn worked_minutes(&self) -> i64 {
        let shift = (self.end_time - self.start_time).num_minutes();
        (shift - self.break_duration as i64).max(0)
    }
}

impl Table for Schedule {
    const NAME: &'static str = "schedules";
    const COLUMNS: &'static [Column] = &[
        Column::new("id", ColumnKind::Uuid),
        Column::new("employee_id", ColumnKind::Uuid),
        Column::new("schedule_date", ColumnKind::Date),
        Column::new("start_time", ColumnKind::Time),
        Column::new("end_time", ColumnKind::Time),
        Column::new("break_duration", ColumnKind::Integer),
        Column::new("created_by", ColumnKind::Uuid),
        Column::new("created_at", ColumnKind::Timestamp),
    ];
}

/// Schedule as returned by the API
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleView {
    #[serde(flatten)]
    pub schedule: Schedule,
    pub worked_minutes: i64,
}

impl From<Schedule> for ScheduleView {
    fn from(schedule: Schedule) -> Self {
        let worked_minutes = schedule.worked_minutes();
        Self { schedule, worked_minutes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shift(start: (u32, u32), end: (u32, u32), break_duration: i32) -> Schedule {
        Schedule {
            id: Uuid::new_v4(),
            employee_id: Uuid::new_v4(),
            schedule_date: NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
            start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
            break_duration,
            notes: None,
            created_by: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn worked_minutes_subtracts_break() {
        assert_eq!(shift((9, 0), (17, 0), 30).worked_minutes(), 450);
        assert_eq!(shift((9, 0), (9, 20), 30).worked_minutes(), 0);
    }

    #[test]
    fn view_serializes_flat() {
        let view = ScheduleView::from(shift((8, 30), (12, 30), 0));
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["worked_minutes"], 240);
        assert_eq!(json["break_duration"], 0);
        assert_eq!(json["start_time"], "08:30:00");
    }
}
