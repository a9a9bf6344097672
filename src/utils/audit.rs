use serde::Serialize;
use serde_json::Value;
use sqlx::MySqlPool;

use crate::model::audit::AuditAction;

/// Writes one append-only trail entry per tracked mutation.
/// `old` is None on create, `new` is None on delete. Failures are logged
/// and never bubble into the request outcome.
pub async fn record(
    pool: &MySqlPool,
    actor_id: Option<u64>,
    action: AuditAction,
    entity_type: &str,
    entity_id: u64,
    old: Option<Value>,
    new: Option<Value>,
) {
    let result = sqlx::query(
        r#"
        INSERT INTO audit_log (user_id, action, entity_type, entity_id, old_values, new_values)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(actor_id)
    .bind(action.as_str())
    .bind(entity_type)
    .bind(entity_id)
    .bind(old)
    .bind(new)
    .execute(pool)
    .await;

    if let Err(e) = result {
        tracing::warn!(
            error = %e,
            action = action.as_str(),
            entity_type,
            entity_id,
            "Failed to write audit entry"
        );
    }
}

/// Serializes an entity snapshot for `old_values`/`new_values`.
pub fn snapshot<T: Serialize>(entity: &T) -> Option<Value> {
    match serde_json::to_value(entity) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to serialize audit snapshot");
            None
        }
    }
}
