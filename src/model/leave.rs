use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveStatus::Pending => "pending",
            LeaveStatus::Approved => "approved",
            LeaveStatus::Rejected => "rejected",
            LeaveStatus::Cancelled => "cancelled",
        }
    }

    /// Approved, rejected and cancelled accept no further transition.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LeaveStatus::Pending)
    }

    pub fn can_transition_to(&self, next: LeaveStatus) -> bool {
        matches!(self, LeaveStatus::Pending) && next != LeaveStatus::Pending
    }
}

/// Inclusive number of days covered by a leave request.
pub fn requested_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveType {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1)]
    pub organization_id: u64,
    #[schema(example = "annual")]
    pub name: String,
    #[schema(example = 20)]
    pub default_days: u32,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 42)]
    pub user_id: u64,
    #[schema(example = 1)]
    pub leave_type_id: u64,
    #[schema(example = "2026-02-02", value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(example = "2026-02-04", value_type = String, format = "date")]
    pub end_date: NaiveDate,
    #[schema(example = "pending")]
    pub status: String,
    #[schema(example = 7, nullable = true)]
    pub approver_id: Option<u64>,
    #[schema(example = "2026-02-01T10:00:00Z", value_type = String, format = "date-time", nullable = true)]
    pub approved_at: Option<DateTime<Utc>>,
    #[schema(example = "2026-01-30T08:00:00Z", value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_reaches_every_terminal_state() {
        for next in [
            LeaveStatus::Approved,
            LeaveStatus::Rejected,
            LeaveStatus::Cancelled,
        ] {
            assert!(LeaveStatus::Pending.can_transition_to(next));
        }
    }

    #[test]
    fn terminal_states_accept_no_transition() {
        for from in [
            LeaveStatus::Approved,
            LeaveStatus::Rejected,
            LeaveStatus::Cancelled,
        ] {
            assert!(from.is_terminal());
            for next in [
                LeaveStatus::Pending,
                LeaveStatus::Approved,
                LeaveStatus::Rejected,
                LeaveStatus::Cancelled,
            ] {
                assert!(!from.can_transition_to(next));
            }
        }
    }

    #[test]
    fn pending_cannot_loop_to_pending() {
        assert!(!LeaveStatus::Pending.can_transition_to(LeaveStatus::Pending));
    }

    #[test]
    fn requested_days_is_inclusive() {
        let start = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();
        assert_eq!(requested_days(start, start), 1);
        let end = NaiveDate::from_ymd_opt(2026, 2, 4).unwrap();
        assert_eq!(requested_days(start, end), 3);
    }

    #[test]
    fn status_strings_round_trip() {
        for status in [
            LeaveStatus::Pending,
            LeaveStatus::Approved,
            LeaveStatus::Rejected,
            LeaveStatus::Cancelled,
        ] {
            assert_eq!(
                status.as_str().parse::<LeaveStatus>().unwrap(),
                status
            );
        }
    }
}
