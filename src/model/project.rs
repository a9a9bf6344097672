use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Active,
    OnHold,
    Completed,
    Archived,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Project {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1)]
    pub organization_id: u64,
    #[schema(example = "Payroll revamp")]
    pub name: String,
    #[schema(example = "Quarterly payroll engine overhaul", nullable = true)]
    pub description: Option<String>,
    #[schema(example = "active")]
    pub status: String,
    #[schema(example = "2026-01-01", value_type = String, format = "date", nullable = true)]
    pub start_date: Option<NaiveDate>,
    #[schema(example = "2026-06-30", value_type = String, format = "date", nullable = true)]
    pub end_date: Option<NaiveDate>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ProjectTask {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1)]
    pub project_id: u64,
    #[schema(example = 42, nullable = true)]
    pub assignee_id: Option<u64>,
    #[schema(example = "Draft schema")]
    pub title: String,
    #[schema(example = "todo")]
    pub status: String,
    #[schema(example = "2026-02-15", value_type = String, format = "date", nullable = true)]
    pub due_date: Option<NaiveDate>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_round_trip() {
        assert_eq!(ProjectStatus::OnHold.to_string(), "on_hold");
        assert_eq!("in_progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert!("bogus".parse::<TaskStatus>().is_err());
    }
}
