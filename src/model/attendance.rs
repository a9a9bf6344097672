use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

/// Minimum worked minutes for a full day.
pub const FULL_DAY_MINUTES: i64 = 480;
/// Minimum worked minutes for a half day.
pub const HALF_DAY_MINUTES: i64 = 240;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    FullDay,
    HalfDay,
    Incomplete,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::FullDay => "full_day",
            AttendanceStatus::HalfDay => "half_day",
            AttendanceStatus::Incomplete => "incomplete",
            AttendanceStatus::Absent => "absent",
        }
    }
}

/// Status is a deterministic function of worked minutes at check-out time.
pub fn classify(worked_minutes: i64) -> AttendanceStatus {
    if worked_minutes >= FULL_DAY_MINUTES {
        AttendanceStatus::FullDay
    } else if worked_minutes >= HALF_DAY_MINUTES {
        AttendanceStatus::HalfDay
    } else {
        AttendanceStatus::Incomplete
    }
}

/// Minutes between check-in and check-out, clamped at zero.
/// Server local time only; overnight spans are not handled.
pub fn worked_minutes(check_in: NaiveTime, check_out: NaiveTime) -> i64 {
    (check_out - check_in).num_minutes().max(0)
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Attendance {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 42)]
    pub user_id: u64,
    #[schema(example = "2026-01-05", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "09:00:00", value_type = String, nullable = true)]
    pub check_in: Option<NaiveTime>,
    #[schema(example = "17:30:00", value_type = String, nullable = true)]
    pub check_out: Option<NaiveTime>,
    #[schema(example = 510, nullable = true)]
    pub worked_minutes: Option<i32>,
    #[schema(example = "full_day")]
    pub status: String,
    #[schema(example = "2026-01-05T09:00:00Z", value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_day_at_exactly_480() {
        assert_eq!(classify(480), AttendanceStatus::FullDay);
        assert_eq!(classify(600), AttendanceStatus::FullDay);
    }

    #[test]
    fn half_day_between_240_and_479() {
        assert_eq!(classify(240), AttendanceStatus::HalfDay);
        assert_eq!(classify(479), AttendanceStatus::HalfDay);
    }

    #[test]
    fn incomplete_below_240() {
        assert_eq!(classify(239), AttendanceStatus::Incomplete);
        assert_eq!(classify(0), AttendanceStatus::Incomplete);
    }

    #[test]
    fn classification_is_total() {
        for minutes in 0..=1440 {
            // must never panic, and absent is never produced by classification
            assert_ne!(classify(minutes), AttendanceStatus::Absent);
        }
    }

    #[test]
    fn worked_minutes_simple_span() {
        let check_in = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let check_out = NaiveTime::from_hms_opt(17, 30, 0).unwrap();
        assert_eq!(worked_minutes(check_in, check_out), 510);
    }

    #[test]
    fn worked_minutes_clamps_negative_spans() {
        let check_in = NaiveTime::from_hms_opt(22, 0, 0).unwrap();
        let check_out = NaiveTime::from_hms_opt(6, 0, 0).unwrap();
        assert_eq!(worked_minutes(check_in, check_out), 0);
    }

    #[test]
    fn status_strings_match_storage_format() {
        assert_eq!(AttendanceStatus::FullDay.as_str(), "full_day");
        assert_eq!(AttendanceStatus::HalfDay.to_string(), "half_day");
        assert_eq!(
            "incomplete".parse::<AttendanceStatus>().unwrap(),
            AttendanceStatus::Incomplete
        );
        assert_eq!(
            "absent".parse::<AttendanceStatus>().unwrap(),
            AttendanceStatus::Absent
        );
    }
}
