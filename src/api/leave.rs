use crate::auth::auth::AuthUser;
use crate::model::audit::AuditAction;
use crate::model::leave::{LeaveRequest, LeaveStatus, requested_days};
use crate::model::role::Role;
use crate::utils::audit;
use crate::utils::validation::FieldErrors;
use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = 1)]
    pub leave_type_id: u64,
    #[schema(example = "2026-02-02", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-02-04", format = "date", value_type = String)]
    pub end_date: NaiveDate,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    /// Filter by requesting user (HR/Super Admin only)
    #[schema(example = 42)]
    pub user_id: Option<u64>,
    /// Filter by leave status
    #[schema(example = "pending")]
    pub status: Option<String>,
    /// Pagination page number (starts at 1)
    #[schema(example = 1)]
    pub page: Option<u64>,
    /// Items per page
    #[schema(example = 10)]
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

const LEAVE_COLUMNS: &str =
    "id, user_id, leave_type_id, start_date, end_date, status, approver_id, approved_at, created_at";

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = Object, example = json!({
            "message": "Leave request submitted",
            "status": "pending"
        })),
        (status = 422, description = "Validation failed"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let mut errors = FieldErrors::new();
    if payload.start_date > payload.end_date {
        errors.push("end_date", "must not be before start_date");
    }

    // Leave type must exist inside the requester's organization
    let type_org = sqlx::query_scalar::<_, u64>(
        "SELECT organization_id FROM leave_types WHERE id = ?",
    )
    .bind(payload.leave_type_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to look up leave type");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    match type_org {
        Some(org) if org == auth.organization_id => {}
        _ => errors.push("leave_type_id", "unknown leave type for your organization"),
    }

    if !errors.is_empty() {
        return Ok(errors.into_response());
    }

    let result = sqlx::query(
        r#"
        INSERT INTO leave_requests (user_id, leave_type_id, start_date, end_date, status)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(auth.user_id)
    .bind(payload.leave_type_id)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(LeaveStatus::Pending.as_str())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, user_id = auth.user_id, "Failed to create leave request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let leave_id = result.last_insert_id();

    audit::record(
        pool.get_ref(),
        Some(auth.user_id),
        AuditAction::Create,
        "leave_request",
        leave_id,
        None,
        Some(serde_json::json!({
            "user_id": auth.user_id,
            "leave_type_id": payload.leave_type_id,
            "start_date": payload.start_date,
            "end_date": payload.end_date,
            "status": "pending"
        })),
    )
    .await;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Leave request submitted",
        "status": "pending"
    })))
}

#[derive(sqlx::FromRow)]
struct LeaveForDecision {
    user_id: u64,
    leave_type_id: u64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: String,
}

/// Shared eligibility check for approve/reject: the actor's role must
/// strictly dominate the requester's role and share the organization;
/// SuperAdmin acts unconditionally.
fn check_decision_eligibility(
    auth: &AuthUser,
    requester_role: Role,
    requester_org: u64,
) -> actix_web::Result<()> {
    if !auth.role.can_approve(requester_role) {
        return Err(actix_web::error::ErrorForbidden(
            "Your role cannot act on this request",
        ));
    }
    auth.require_org(requester_org)
}

/* =========================
Approve leave
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(("leave_id" = u64, Path, description = "ID of the leave request to approve")),
    responses(
        (status = 200, description = "Leave approved", body = Object, example = json!({
            "message": "Leave approved"
        })),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Already processed, or insufficient balance"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    let mut tx = pool.begin().await.map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to open transaction");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // Row lock serializes concurrent decisions on the same request and
    // on the requester's balance.
    let leave = sqlx::query_as::<_, LeaveForDecision>(
        "SELECT user_id, leave_type_id, start_date, end_date, status \
         FROM leave_requests WHERE id = ? FOR UPDATE",
    )
    .bind(leave_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to fetch leave request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let leave = match leave {
        Some(l) => l,
        None => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "message": "Leave request not found"
            })));
        }
    };

    let requester = sqlx::query_as::<_, (u8, u64)>(
        "SELECT role_id, organization_id FROM users WHERE id = ?",
    )
    .bind(leave.user_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to fetch requester");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let requester_role = Role::from_id(requester.0)
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("Corrupt requester role"))?;
    check_decision_eligibility(&auth, requester_role, requester.1)?;

    if leave.status != LeaveStatus::Pending.as_str() {
        return Ok(HttpResponse::Conflict().json(serde_json::json!({
            "message": "Leave request already processed"
        })));
    }

    let days = requested_days(leave.start_date, leave.end_date);
    let year = leave.start_date.year();

    // Atomic deduction: both columns move in one guarded statement, so
    // remaining_days = total_days - used_days holds on commit and two
    // racing approvals cannot overdraw the allotment.
    let deducted = sqlx::query(
        r#"
        UPDATE leave_balances
        SET remaining_days = total_days - (used_days + ?),
            used_days = used_days + ?
        WHERE user_id = ? AND leave_type_id = ? AND year = ?
          AND used_days + ? <= total_days
        "#,
    )
    .bind(days)
    .bind(days)
    .bind(leave.user_id)
    .bind(leave.leave_type_id)
    .bind(year)
    .bind(days)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to deduct leave balance");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if deducted.rows_affected() == 0 {
        tx.rollback().await.ok();
        return Ok(HttpResponse::Conflict().json(serde_json::json!({
            "message": "Insufficient leave balance or no allotment for this year"
        })));
    }

    let updated = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = ?, approver_id = ?, approved_at = NOW()
        WHERE id = ? AND status = ?
        "#,
    )
    .bind(LeaveStatus::Approved.as_str())
    .bind(auth.user_id)
    .bind(leave_id)
    .bind(LeaveStatus::Pending.as_str())
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Approve leave failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if updated.rows_affected() == 0 {
        tx.rollback().await.ok();
        return Ok(HttpResponse::Conflict().json(serde_json::json!({
            "message": "Leave request already processed"
        })));
    }

    tx.commit().await.map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to commit approval");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    audit::record(
        pool.get_ref(),
        Some(auth.user_id),
        AuditAction::Update,
        "leave_request",
        leave_id,
        Some(serde_json::json!({ "status": "pending" })),
        Some(serde_json::json!({ "status": "approved", "approver_id": auth.user_id })),
    )
    .await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave approved"
    })))
}

/* =========================
Reject leave
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(("leave_id" = u64, Path, description = "ID of the leave request to reject")),
    responses(
        (status = 200, description = "Leave rejected", body = Object, example = json!({
            "message": "Leave rejected"
        })),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    let leave = sqlx::query_as::<_, (u64, String)>(
        "SELECT user_id, status FROM leave_requests WHERE id = ?",
    )
    .bind(leave_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to fetch leave request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let (requester_id, status) = match leave {
        Some(l) => l,
        None => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "message": "Leave request not found"
            })));
        }
    };

    let requester = sqlx::query_as::<_, (u8, u64)>(
        "SELECT role_id, organization_id FROM users WHERE id = ?",
    )
    .bind(requester_id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to fetch requester");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let requester_role = Role::from_id(requester.0)
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("Corrupt requester role"))?;
    check_decision_eligibility(&auth, requester_role, requester.1)?;

    if status != LeaveStatus::Pending.as_str() {
        return Ok(HttpResponse::Conflict().json(serde_json::json!({
            "message": "Leave request already processed"
        })));
    }

    // No balance was deducted for a pending request, so rejection has
    // no ledger effect.
    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = ?, approver_id = ?
        WHERE id = ? AND status = ?
        "#,
    )
    .bind(LeaveStatus::Rejected.as_str())
    .bind(auth.user_id)
    .bind(leave_id)
    .bind(LeaveStatus::Pending.as_str())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Reject leave failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::Conflict().json(serde_json::json!({
            "message": "Leave request already processed"
        })));
    }

    audit::record(
        pool.get_ref(),
        Some(auth.user_id),
        AuditAction::Update,
        "leave_request",
        leave_id,
        Some(serde_json::json!({ "status": "pending" })),
        Some(serde_json::json!({ "status": "rejected", "approver_id": auth.user_id })),
    )
    .await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave rejected"
    })))
}

/* =========================
Cancel leave (requester)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/cancel",
    params(("leave_id" = u64, Path, description = "ID of the leave request to cancel")),
    responses(
        (status = 200, description = "Leave cancelled", body = Object, example = json!({
            "message": "Leave cancelled"
        })),
        (status = 409, description = "Not found, not yours, or already processed"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    // Only the requester may cancel, and only while pending.
    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = ?
        WHERE id = ? AND user_id = ? AND status = ?
        "#,
    )
    .bind(LeaveStatus::Cancelled.as_str())
    .bind(leave_id)
    .bind(auth.user_id)
    .bind(LeaveStatus::Pending.as_str())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Cancel leave failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::Conflict().json(serde_json::json!({
            "message": "Leave request not found, not yours, or already processed"
        })));
    }

    audit::record(
        pool.get_ref(),
        Some(auth.user_id),
        AuditAction::Update,
        "leave_request",
        leave_id,
        Some(serde_json::json!({ "status": "pending" })),
        Some(serde_json::json!({ "status": "cancelled" })),
    )
    .await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave cancelled"
    })))
}

/// Leave request details
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(("leave_id" = u64, Path, description = "ID of the leave request to fetch")),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    let leave = sqlx::query_as::<_, LeaveRequest>(&format!(
        "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?"
    ))
    .bind(leave_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to fetch leave request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let leave = match leave {
        Some(l) => l,
        None => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "message": "Leave request not found"
            })));
        }
    };

    // Owners see their own requests; everyone else needs HR rights within
    // the requester's organization.
    if leave.user_id != auth.user_id {
        auth.require_hr_or_admin()?;
        let requester_org = sqlx::query_scalar::<_, u64>(
            "SELECT organization_id FROM users WHERE id = ?",
        )
        .bind(leave.user_id)
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_id, "Failed to fetch requester org");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;
        auth.require_org(requester_org)?;
    }

    Ok(HttpResponse::Ok().json(leave))
}

/// Paginated leave listing
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    match auth.role {
        Role::Employee | Role::Manager => {
            where_sql.push_str(" AND lr.user_id = ?");
            args.push(FilterValue::U64(auth.user_id));
        }
        Role::Hr => {
            where_sql.push_str(" AND u.organization_id = ?");
            args.push(FilterValue::U64(auth.organization_id));
            if let Some(user_id) = query.user_id {
                where_sql.push_str(" AND lr.user_id = ?");
                args.push(FilterValue::U64(user_id));
            }
        }
        Role::SuperAdmin => {
            if let Some(user_id) = query.user_id {
                where_sql.push_str(" AND lr.user_id = ?");
                args.push(FilterValue::U64(user_id));
            }
        }
    }

    if let Some(status) = query.status.as_deref() {
        where_sql.push_str(" AND lr.status = ?");
        args.push(FilterValue::Str(status));
    }

    let count_sql = format!(
        "SELECT COUNT(*) FROM leave_requests lr JOIN users u ON u.id = lr.user_id{}",
        where_sql
    );

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count leave requests");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        r#"
        SELECT lr.id, lr.user_id, lr.leave_type_id, lr.start_date, lr.end_date,
               lr.status, lr.approver_id, lr.approved_at, lr.created_at
        FROM leave_requests lr
        JOIN users u ON u.id = lr.user_id
        {}
        ORDER BY lr.created_at DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, LeaveRequest>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let leaves = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch leave list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data: leaves,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}
