use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Restore,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
            AuditAction::Restore => "restore",
        }
    }
}

/// Append-only trail row. `old_values` is NULL on create,
/// `new_values` is NULL on delete.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AuditEntry {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 7, nullable = true)]
    pub user_id: Option<u64>,
    #[schema(example = "update")]
    pub action: String,
    #[schema(example = "employee")]
    pub entity_type: String,
    #[schema(example = 42)]
    pub entity_id: u64,
    #[schema(value_type = Object, nullable = true)]
    pub old_values: Option<Value>,
    #[schema(value_type = Object, nullable = true)]
    pub new_values: Option<Value>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}
