use crate::auth::auth::AuthUser;
use crate::model::attendance::{Attendance, AttendanceStatus, classify, worked_minutes};
use actix_web::{HttpResponse, Responder, web};
use chrono::{Local, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

/// Opens today's attendance row for a user. Idempotent: the first
/// check-in of the day wins. Used by the login hook and never fails
/// the caller.
pub async fn open_for_user(pool: &MySqlPool, user_id: u64) {
    let today = Local::now().date_naive();
    let now = Local::now().time();

    let result = sqlx::query(
        r#"
        INSERT INTO attendance (user_id, date, check_in, status)
        VALUES (?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE id = id
        "#,
    )
    .bind(user_id)
    .bind(today)
    .bind(now)
    .bind(AttendanceStatus::Incomplete.as_str())
    .execute(pool)
    .await;

    if let Err(e) = result {
        tracing::warn!(error = %e, user_id, "Failed to open attendance on login");
    }
}

/// Closes today's open attendance row: stamps check-out, computes worked
/// minutes and classifies the day. Returns false when there is nothing
/// to close (already closed, or never checked in).
pub async fn close_for_user(pool: &MySqlPool, user_id: u64) -> bool {
    let today = Local::now().date_naive();
    let now = Local::now().time();

    let open_row = sqlx::query_as::<_, (u64, Option<NaiveTime>)>(
        r#"
        SELECT id, check_in
        FROM attendance
        WHERE user_id = ? AND date = ? AND check_out IS NULL
        "#,
    )
    .bind(user_id)
    .bind(today)
    .fetch_optional(pool)
    .await;

    let (row_id, check_in) = match open_row {
        Ok(Some((id, Some(check_in)))) => (id, check_in),
        Ok(_) => return false,
        Err(e) => {
            tracing::warn!(error = %e, user_id, "Failed to look up open attendance");
            return false;
        }
    };

    let minutes = worked_minutes(check_in, now);
    let status = classify(minutes);

    let result = sqlx::query(
        r#"
        UPDATE attendance
        SET check_out = ?, worked_minutes = ?, status = ?
        WHERE id = ? AND check_out IS NULL
        "#,
    )
    .bind(now)
    .bind(minutes as i32)
    .bind(status.as_str())
    .bind(row_id)
    .execute(pool)
    .await;

    match result {
        Ok(r) => r.rows_affected() > 0,
        Err(e) => {
            tracing::warn!(error = %e, user_id, "Failed to close attendance");
            false
        }
    }
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    responses(
        (status = 200, description = "Checked in successfully", body = Object, example = json!({
            "message": "Checked in successfully"
        })),
        (status = 409, description = "A check-in or absent mark already exists for today", body = Object, example = json!({
            "message": "Already checked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let today = Local::now().date_naive();
    let now = Local::now().time();

    let result = sqlx::query(
        r#"
        INSERT INTO attendance (user_id, date, check_in, status)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(auth.user_id)
    .bind(today)
    .bind(now)
    .bind(AttendanceStatus::Incomplete.as_str())
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "Checked in successfully"
        }))),

        Err(e) => {
            // A row already exists for today: either a real check-in or
            // an absent mark placed by HR. The conflict message says which.
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    let existing = sqlx::query_scalar::<_, String>(
                        "SELECT status FROM attendance WHERE user_id = ? AND date = ?",
                    )
                    .bind(auth.user_id)
                    .bind(today)
                    .fetch_optional(pool.get_ref())
                    .await
                    .ok()
                    .flatten()
                    .and_then(|s| s.parse::<AttendanceStatus>().ok());

                    return Ok(HttpResponse::Conflict().json(serde_json::json!({
                        "message": check_in_conflict_message(existing)
                    })));
                }
            }

            tracing::error!(error = %e, user_id = auth.user_id, "Check-in failed");
            Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ))
        }
    }
}

fn check_in_conflict_message(existing: Option<AttendanceStatus>) -> &'static str {
    match existing {
        Some(AttendanceStatus::Absent) => "Marked absent for today",
        _ => "Already checked in today",
    }
}

/// Check-out endpoint
#[utoipa::path(
    put,
    path = "/api/attendance/check-out",
    responses(
        (status = 200, description = "Checked out successfully", body = Object, example = json!({
            "message": "Checked out successfully"
        })),
        (status = 400, description = "No active check-in found for today", body = Object, example = json!({
            "message": "No active check-in found for today"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    if close_for_user(pool.get_ref(), auth.user_id).await {
        Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "Checked out successfully"
        })))
    } else {
        Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "No active check-in found for today"
        })))
    }
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AttendanceFilter {
    /// Filter by user (HR/Super Admin only; employees always see their own)
    #[schema(example = 42)]
    pub user_id: Option<u64>,
    #[schema(example = "2026-01-01", value_type = String, format = "date")]
    pub from: Option<NaiveDate>,
    #[schema(example = "2026-01-31", value_type = String, format = "date")]
    pub to: Option<NaiveDate>,
    #[schema(example = "full_day")]
    pub status: Option<String>,
    #[schema(example = 1)]
    pub page: Option<u64>,
    #[schema(example = 10)]
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub data: Vec<Attendance>,
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
    Date(NaiveDate),
}

/// Attendance listing: employees see their own rows, HR and above see the
/// organization; SuperAdmin sees everything.
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceFilter),
    responses(
        (status = 200, description = "Paginated attendance list", body = AttendanceListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn list_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceFilter>,
) -> actix_web::Result<impl Responder> {
    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    use crate::model::role::Role;
    match auth.role {
        Role::Employee | Role::Manager => {
            where_sql.push_str(" AND a.user_id = ?");
            args.push(FilterValue::U64(auth.user_id));
        }
        Role::Hr => {
            where_sql.push_str(" AND u.organization_id = ?");
            args.push(FilterValue::U64(auth.organization_id));
            if let Some(user_id) = query.user_id {
                where_sql.push_str(" AND a.user_id = ?");
                args.push(FilterValue::U64(user_id));
            }
        }
        Role::SuperAdmin => {
            if let Some(user_id) = query.user_id {
                where_sql.push_str(" AND a.user_id = ?");
                args.push(FilterValue::U64(user_id));
            }
        }
    }

    if let Some(from) = query.from {
        where_sql.push_str(" AND a.date >= ?");
        args.push(FilterValue::Date(from));
    }
    if let Some(to) = query.to {
        where_sql.push_str(" AND a.date <= ?");
        args.push(FilterValue::Date(to));
    }
    if let Some(status) = query.status.as_deref() {
        where_sql.push_str(" AND a.status = ?");
        args.push(FilterValue::Str(status));
    }

    let count_sql = format!(
        "SELECT COUNT(*) FROM attendance a JOIN users u ON u.id = a.user_id{}",
        where_sql
    );

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
            FilterValue::Date(d) => count_q.bind(*d),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count attendance rows");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        r#"
        SELECT a.id, a.user_id, a.date, a.check_in, a.check_out, a.worked_minutes, a.status, a.created_at
        FROM attendance a
        JOIN users u ON u.id = a.user_id
        {}
        ORDER BY a.date DESC, a.user_id
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, Attendance>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
            FilterValue::Date(d) => data_q.bind(d),
        };
    }

    let rows = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch attendance list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        data: rows,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

#[derive(Deserialize, ToSchema)]
pub struct MarkAbsent {
    #[schema(example = "2026-01-05", value_type = String, format = "date")]
    pub date: NaiveDate,
}

/// Mark a user absent for a date (HR and above, same organization)
#[utoipa::path(
    put,
    path = "/api/attendance/{user_id}/absent",
    params(("user_id" = u64, Path, description = "User to mark absent")),
    request_body = MarkAbsent,
    responses(
        (status = 200, description = "Marked absent"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn mark_absent(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<MarkAbsent>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let user_id = path.into_inner();

    let target_org = sqlx::query_scalar::<_, u64>("SELECT organization_id FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id, "Failed to fetch user for absence");
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

    sqlx::query(
        r#"
        INSERT INTO attendance (user_id, date, status)
        VALUES (?, ?, ?)
        ON DUPLICATE KEY UPDATE
            status = VALUES(status),
            check_in = NULL,
            check_out = NULL,
            worked_minutes = NULL
        "#,
    )
    .bind(user_id)
    .bind(payload.date)
    .bind(AttendanceStatus::Absent.as_str())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, user_id, "Failed to mark absent");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Marked absent"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_message_tells_absent_apart_from_checked_in() {
        assert_eq!(
            check_in_conflict_message(Some(AttendanceStatus::Absent)),
            "Marked absent for today"
        );
        assert_eq!(
            check_in_conflict_message(Some(AttendanceStatus::Incomplete)),
            "Already checked in today"
        );
        assert_eq!(check_in_conflict_message(None), "Already checked in today");
    }
}
