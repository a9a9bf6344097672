use crate::auth::auth::AuthUser;
use crate::model::audit::AuditEntry;
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AuditLogQuery {
    #[schema(example = 1)]
    pub page: Option<u32>,

    #[schema(example = 10)]
    pub per_page: Option<u32>,

    #[schema(example = "employee")]
    pub entity_type: Option<String>,

    #[schema(example = 7)]
    pub user_id: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedAuditResponse {
    pub data: Vec<AuditEntry>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

const AUDIT_COLUMNS: &str =
    "id, user_id, action, entity_type, entity_id, old_values, new_values, created_at";

/// Browse the audit trail (Super Admin only)
#[utoipa::path(
    get,
    path = "/api/audit-log",
    params(AuditLogQuery),
    responses(
        (status = 200, description = "Audit entries", body = PaginatedAuditResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Audit"
)]
pub async fn list_audit_log(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AuditLogQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_super_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE 1 = 1");
    if query.entity_type.is_some() {
        where_sql.push_str(" AND entity_type = ?");
    }
    if query.user_id.is_some() {
        where_sql.push_str(" AND user_id = ?");
    }

    let count_sql = format!("SELECT COUNT(*) FROM audit_log{}", where_sql);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(entity_type) = &query.entity_type {
        count_q = count_q.bind(entity_type);
    }
    if let Some(user_id) = query.user_id {
        count_q = count_q.bind(user_id);
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count audit entries");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        "SELECT {AUDIT_COLUMNS} FROM audit_log{} ORDER BY id DESC LIMIT ? OFFSET ?",
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, AuditEntry>(&data_sql);
    if let Some(entity_type) = &query.entity_type {
        data_q = data_q.bind(entity_type);
    }
    if let Some(user_id) = query.user_id {
        data_q = data_q.bind(user_id);
    }

    let data = data_q
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch audit entries");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(PaginatedAuditResponse {
        data,
        page,
        per_page,
        total,
    }))
}
