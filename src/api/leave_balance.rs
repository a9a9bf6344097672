use crate::auth::auth::AuthUser;
use crate::model::audit::AuditAction;
use crate::model::leave_balance::LeaveBalance;
use crate::utils::audit;
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct UpsertBalance {
    #[schema(example = 42)]
    pub user_id: u64,
    #[schema(example = 1)]
    pub leave_type_id: u64,
    #[schema(example = 2026)]
    pub year: u16,
    #[schema(example = 20)]
    pub total_days: i32,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct BalanceFilter {
    /// User whose balances to list (HR/Super Admin only)
    #[schema(example = 42)]
    pub user_id: Option<u64>,
    #[schema(example = 2026)]
    pub year: Option<u16>,
}

#[derive(Serialize, ToSchema)]
pub struct BalanceListResponse {
    pub data: Vec<LeaveBalance>,
}

const BALANCE_COLUMNS: &str =
    "id, user_id, leave_type_id, year, total_days, used_days, remaining_days";

/// Allot or reset a yearly balance. `total_days` is replaced,
/// `used_days` survives, `remaining_days` is recomputed in the same
/// statement so the ledger invariant holds.
#[utoipa::path(
    put,
    path = "/api/leave-balances",
    request_body = UpsertBalance,
    responses(
        (status = 200, description = "Balance allotted", body = LeaveBalance),
        (status = 404, description = "User or leave type not found"),
        (status = 422, description = "Validation failed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "LeaveBalance"
)]
pub async fn upsert_balance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<UpsertBalance>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    if payload.total_days < 0 {
        let mut errors = crate::utils::validation::FieldErrors::new();
        errors.push("total_days", "must not be negative");
        return Ok(errors.into_response());
    }

    let target_org = sqlx::query_scalar::<_, u64>("SELECT organization_id FROM users WHERE id = ?")
        .bind(payload.user_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch balance target user");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let target_org = match target_org {
        Some(org) => org,
        None => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "message": "User not found"
            })));
        }
    };
    auth.require_org(target_org)?;

    let existing = sqlx::query_as::<_, LeaveBalance>(&format!(
        "SELECT {BALANCE_COLUMNS} FROM leave_balances \
         WHERE user_id = ? AND leave_type_id = ? AND year = ?"
    ))
    .bind(payload.user_id)
    .bind(payload.leave_type_id)
    .bind(payload.year)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch existing balance");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    sqlx::query(
        r#"
        INSERT INTO leave_balances (user_id, leave_type_id, year, total_days, used_days, remaining_days)
        VALUES (?, ?, ?, ?, 0, ?)
        ON DUPLICATE KEY UPDATE
            total_days = VALUES(total_days),
            remaining_days = VALUES(total_days) - used_days
        "#,
    )
    .bind(payload.user_id)
    .bind(payload.leave_type_id)
    .bind(payload.year)
    .bind(payload.total_days)
    .bind(payload.total_days)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to upsert leave balance");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let updated = sqlx::query_as::<_, LeaveBalance>(&format!(
        "SELECT {BALANCE_COLUMNS} FROM leave_balances \
         WHERE user_id = ? AND leave_type_id = ? AND year = ?"
    ))
    .bind(payload.user_id)
    .bind(payload.leave_type_id)
    .bind(payload.year)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to reload leave balance");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let (action, old) = match &existing {
        Some(before) => (AuditAction::Update, audit::snapshot(before)),
        None => (AuditAction::Create, None),
    };
    audit::record(
        pool.get_ref(),
        Some(auth.user_id),
        action,
        "leave_balance",
        updated.id,
        old,
        audit::snapshot(&updated),
    )
    .await;

    Ok(HttpResponse::Ok().json(updated))
}

/// List balances: employees see their own, HR+ may pass `user_id`
#[utoipa::path(
    get,
    path = "/api/leave-balances",
    params(BalanceFilter),
    responses(
        (status = 200, description = "Balances", body = BalanceListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "LeaveBalance"
)]
pub async fn list_balances(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<BalanceFilter>,
) -> actix_web::Result<impl Responder> {
    let user_id = match query.user_id {
        Some(other) if other != auth.user_id => {
            auth.require_hr_or_admin()?;
            let target_org =
                sqlx::query_scalar::<_, u64>("SELECT organization_id FROM users WHERE id = ?")
                    .bind(other)
                    .fetch_optional(pool.get_ref())
                    .await
                    .map_err(|e| {
                        tracing::error!(error = %e, "Failed to fetch balance target user");
                        actix_web::error::ErrorInternalServerError("Internal Server Error")
                    })?;
            match target_org {
                Some(org) => auth.require_org(org)?,
                None => {
                    return Ok(HttpResponse::NotFound().json(serde_json::json!({
                        "message": "User not found"
                    })));
                }
            }
            other
        }
        _ => auth.user_id,
    };

    let mut sql = format!("SELECT {BALANCE_COLUMNS} FROM leave_balances WHERE user_id = ?");
    if query.year.is_some() {
        sql.push_str(" AND year = ?");
    }
    sql.push_str(" ORDER BY year DESC, leave_type_id");

    let mut q = sqlx::query_as::<_, LeaveBalance>(&sql).bind(user_id);
    if let Some(year) = query.year {
        q = q.bind(year);
    }

    let balances = q.fetch_all(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch leave balances");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(BalanceListResponse { data: balances }))
}
