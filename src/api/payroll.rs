use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::model::audit::AuditAction;
use crate::model::payroll::{Payroll, net_salary};
use crate::utils::audit;

#[derive(Deserialize, ToSchema)]
pub struct CreatePayroll {
    #[schema(example = 1001)]
    pub employee_id: u64,

    #[schema(example = "2026-01-01", value_type = String, format = "date")]
    pub month: NaiveDate,

    #[schema(example = 50000.0)]
    pub base_salary: f64,

    #[schema(example = 5000.0)]
    pub bonus: f64,

    #[schema(example = 2000.0)]
    pub deductions: f64,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdatePayroll {
    #[schema(example = 52000.0)]
    pub base_salary: Option<f64>,

    #[schema(example = 6000.0)]
    pub bonus: Option<f64>,

    #[schema(example = 2500.0)]
    pub deductions: Option<f64>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PayrollQuery {
    #[schema(example = 1)]
    pub page: Option<u32>,

    #[schema(example = 10)]
    pub per_page: Option<u32>,

    #[schema(example = 1001)]
    pub employee_id: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedPayrollResponse {
    pub data: Vec<Payroll>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

const PAYROLL_COLUMNS: &str =
    "id, employee_id, month, base_salary, bonus, deductions, net_salary";

async fn employee_org(pool: &MySqlPool, employee_id: u64) -> actix_web::Result<Option<u64>> {
    sqlx::query_scalar::<_, u64>("SELECT organization_id FROM employees WHERE id = ?")
        .bind(employee_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Failed to fetch employee org");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })
}

#[utoipa::path(
    post,
    path = "/api/payroll",
    request_body = CreatePayroll,
    responses(
        (status = 201, description = "Payroll created", body = Payroll),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Payroll already exists for this month"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn create_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreatePayroll>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let org = match employee_org(pool.get_ref(), payload.employee_id).await? {
        Some(org) => org,
        None => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "message": "Employee not found"
            })));
        }
    };
    auth.require_org(org)?;

    let net = net_salary(payload.base_salary, payload.bonus, payload.deductions);

    let result = sqlx::query(
        r#"
        INSERT INTO payrolls
        (employee_id, month, base_salary, bonus, deductions, net_salary)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.employee_id)
    .bind(payload.month)
    .bind(payload.base_salary)
    .bind(payload.bonus)
    .bind(payload.deductions)
    .bind(net)
    .execute(pool.get_ref())
    .await;

    let payroll_id = match result {
        Ok(r) => r.last_insert_id(),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(serde_json::json!({
                        "message": "Payroll already exists for this employee and month"
                    })));
                }
            }
            tracing::error!(error = %e, "Failed to create payroll");
            return Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ));
        }
    };

    let payroll = sqlx::query_as::<_, Payroll>(&format!(
        "SELECT {PAYROLL_COLUMNS} FROM payrolls WHERE id = ?"
    ))
    .bind(payroll_id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, payroll_id, "Failed to reload payroll");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    audit::record(
        pool.get_ref(),
        Some(auth.user_id),
        AuditAction::Create,
        "payroll",
        payroll_id,
        None,
        audit::snapshot(&payroll),
    )
    .await;

    Ok(HttpResponse::Created().json(payroll))
}

#[utoipa::path(
    put,
    path = "/api/payroll/{payroll_id}",
    request_body = UpdatePayroll,
    params(("payroll_id" = u64, Path, description = "Payroll ID")),
    responses(
        (status = 200, description = "Payroll updated", body = Payroll),
        (status = 404, description = "Payroll not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn update_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdatePayroll>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let payroll_id = path.into_inner();

    let current = sqlx::query_as::<_, Payroll>(&format!(
        "SELECT {PAYROLL_COLUMNS} FROM payrolls WHERE id = ?"
    ))
    .bind(payroll_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, payroll_id, "Failed to fetch payroll");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let current = match current {
        Some(c) => c,
        None => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "message": "Payroll record not found"
            })));
        }
    };

    match employee_org(pool.get_ref(), current.employee_id).await? {
        Some(org) => auth.require_org(org)?,
        None => {
            return Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ));
        }
    }

    let base_salary = body.base_salary.unwrap_or(current.base_salary);
    let bonus = body.bonus.unwrap_or(current.bonus);
    let deductions = body.deductions.unwrap_or(current.deductions);
    let net = net_salary(base_salary, bonus, deductions);

    sqlx::query(
        r#"
        UPDATE payrolls
        SET base_salary = ?, bonus = ?, deductions = ?, net_salary = ?
        WHERE id = ?
        "#,
    )
    .bind(base_salary)
    .bind(bonus)
    .bind(deductions)
    .bind(net)
    .bind(payroll_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, payroll_id, "Failed to update payroll");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let updated = sqlx::query_as::<_, Payroll>(&format!(
        "SELECT {PAYROLL_COLUMNS} FROM payrolls WHERE id = ?"
    ))
    .bind(payroll_id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, payroll_id, "Failed to reload payroll");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    audit::record(
        pool.get_ref(),
        Some(auth.user_id),
        AuditAction::Update,
        "payroll",
        payroll_id,
        audit::snapshot(&current),
        audit::snapshot(&updated),
    )
    .await;

    Ok(HttpResponse::Ok().json(updated))
}

#[utoipa::path(
    get,
    path = "/api/payroll/{payroll_id}",
    params(("payroll_id" = u64, Path, description = "Payroll ID")),
    responses(
        (status = 200, body = Payroll),
        (status = 404, description = "Payroll not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn get_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let payroll_id = path.into_inner();

    let payroll = sqlx::query_as::<_, Payroll>(&format!(
        "SELECT {PAYROLL_COLUMNS} FROM payrolls WHERE id = ?"
    ))
    .bind(payroll_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, payroll_id, "Failed to fetch payroll");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    match payroll {
        Some(p) => {
            match employee_org(pool.get_ref(), p.employee_id).await? {
                Some(org) => auth.require_org(org)?,
                None => {
                    return Err(actix_web::error::ErrorInternalServerError(
                        "Internal Server Error",
                    ));
                }
            }
            Ok(HttpResponse::Ok().json(p))
        }
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Payroll not found"
        }))),
    }
}

#[utoipa::path(
    get,
    path = "/api/payroll",
    params(PayrollQuery),
    responses(
        (status = 200, body = PaginatedPayrollResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn list_payrolls(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<PayrollQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE 1 = 1");
    if auth.org_filter().is_some() {
        where_sql.push_str(" AND e.organization_id = ?");
    }
    if query.employee_id.is_some() {
        where_sql.push_str(" AND p.employee_id = ?");
    }

    let count_sql = format!(
        "SELECT COUNT(*) FROM payrolls p JOIN employees e ON e.id = p.employee_id{}",
        where_sql
    );

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(org) = auth.org_filter() {
        count_q = count_q.bind(org);
    }
    if let Some(employee_id) = query.employee_id {
        count_q = count_q.bind(employee_id);
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count payrolls");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        r#"
        SELECT p.id, p.employee_id, p.month, p.base_salary, p.bonus, p.deductions, p.net_salary
        FROM payrolls p
        JOIN employees e ON e.id = p.employee_id
        {}
        ORDER BY p.month DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, Payroll>(&data_sql);
    if let Some(org) = auth.org_filter() {
        data_q = data_q.bind(org);
    }
    if let Some(employee_id) = query.employee_id {
        data_q = data_q.bind(employee_id);
    }

    let data = data_q
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch payroll list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(PaginatedPayrollResponse {
        data,
        page,
        per_page,
        total,
    }))
}
