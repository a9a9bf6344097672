use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Organization {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Acme Corp")]
    pub name: String,
    #[schema(example = "2026-01-01T00:00:00Z", value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}
