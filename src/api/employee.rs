use crate::auth::auth::AuthUser;
use crate::model::audit::AuditAction;
use crate::model::employee::{Employee, EmployeeProfile, ProfilePayload};
use crate::utils::audit;
use crate::utils::validation::FieldErrors;
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "John")]
    pub first_name: String,
    #[schema(example = "Doe")]
    pub last_name: String,
    #[schema(example = "john@email.com", format = "email")]
    pub email: String,
    #[schema(example = "+8801712345678", nullable = true)]
    pub phone: Option<String>,
    #[schema(example = "Engineering", nullable = true)]
    pub department: Option<String>,
    #[schema(example = "Backend Developer", nullable = true)]
    pub job_title: Option<String>,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub hire_date: NaiveDate,
    /// Target organization (Super Admin only; defaults to the caller's)
    #[schema(example = 1, nullable = true)]
    pub organization_id: Option<u64>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateEmployee {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[schema(format = "email")]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub job_title: Option<String>,
    pub status: Option<String>,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub hire_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct EmployeeQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub department: Option<String>,
    pub status: Option<String>,
    /// Search by name or email
    pub search: Option<String>,
    /// Include soft-deleted rows (HR/Super Admin only)
    pub include_deleted: Option<bool>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 10)]
    pub total: i64,
}

const EMPLOYEE_COLUMNS: &str = "id, organization_id, employee_code, first_name, last_name, \
     email, phone, department, job_title, hire_date, status, deleted_at";

const CODE_ALLOCATION_ATTEMPTS: u32 = 3;

/// Tells an `(organization_id, employee_code)` duplicate apart from an
/// email duplicate. MySQL names the violated key in the error message.
fn is_code_collision(message: &str) -> bool {
    message.contains("uq_employees_org_code") || message.contains("employee_code")
}

/// Allocates the next sequential employee code for an organization.
/// The MAX is taken under a row lock so two concurrent creates cannot
/// draw the same number; the unique index is the backstop.
async fn next_employee_code(
    tx: &mut sqlx::Transaction<'_, sqlx::MySql>,
    organization_id: u64,
) -> Result<String, sqlx::Error> {
    let max_seq = sqlx::query_scalar::<_, u64>(
        r#"
        SELECT COALESCE(MAX(CAST(SUBSTRING(employee_code, 5) AS UNSIGNED)), 0)
        FROM employees
        WHERE organization_id = ?
        FOR UPDATE
        "#,
    )
    .bind(organization_id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(format!("EMP-{:04}", max_seq + 1))
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 409, description = "Email already registered"),
        (status = 422, description = "Validation failed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let mut errors = FieldErrors::new();
    if payload.first_name.trim().is_empty() {
        errors.push("first_name", "must not be empty");
    }
    if payload.last_name.trim().is_empty() {
        errors.push("last_name", "must not be empty");
    }
    if !payload.email.contains('@') {
        errors.push("email", "must be a valid email address");
    }
    if !errors.is_empty() {
        return Ok(errors.into_response());
    }

    let organization_id = auth.target_org(payload.organization_id)?;
    if payload.organization_id.is_some() {
        let org_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM organizations WHERE id = ? LIMIT 1)",
        )
        .bind(organization_id)
        .fetch_one(pool.get_ref())
        .await
        .unwrap_or(false);
        if !org_exists {
            let mut errors = FieldErrors::new();
            errors.push("organization_id", "unknown organization");
            return Ok(errors.into_response());
        }
    }

    // The MAX scan locks no rows in an empty organization, so two racing
    // first-creates can draw the same code and trip the unique index.
    // Code collisions are retried with a fresh allocation; an email
    // duplicate surfaces as the conflict it is.
    let mut employee_id = 0u64;
    for attempt in 1..=CODE_ALLOCATION_ATTEMPTS {
        let mut tx = pool.begin().await.map_err(|e| {
            error!(error = %e, "Failed to open transaction");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

        let code = next_employee_code(&mut tx, organization_id)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to allocate employee code");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;

        let result = sqlx::query(
            r#"
            INSERT INTO employees
            (organization_id, employee_code, first_name, last_name, email, phone, department, job_title, hire_date)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(organization_id)
        .bind(&code)
        .bind(payload.first_name.trim())
        .bind(payload.last_name.trim())
        .bind(payload.email.trim())
        .bind(&payload.phone)
        .bind(&payload.department)
        .bind(&payload.job_title)
        .bind(payload.hire_date)
        .execute(&mut *tx)
        .await;

        match result {
            Ok(r) => {
                employee_id = r.last_insert_id();
                tx.commit().await.map_err(|e| {
                    error!(error = %e, "Failed to commit employee create");
                    actix_web::error::ErrorInternalServerError("Internal Server Error")
                })?;
                break;
            }
            Err(e) => {
                tx.rollback().await.ok();
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.code().as_deref() == Some("23000") {
                        if is_code_collision(db_err.message()) {
                            if attempt < CODE_ALLOCATION_ATTEMPTS {
                                continue;
                            }
                            error!(code = %code, "Employee code allocation kept colliding");
                            return Err(actix_web::error::ErrorInternalServerError(
                                "Internal Server Error",
                            ));
                        }
                        return Ok(HttpResponse::Conflict().json(json!({
                            "message": "Email already registered"
                        })));
                    }
                }
                error!(error = %e, "Failed to create employee");
                return Err(actix_web::error::ErrorInternalServerError(
                    "Internal Server Error",
                ));
            }
        }
    }

    let employee = fetch_employee(pool.get_ref(), employee_id).await?;
    let employee = match employee {
        Some(e) => e,
        None => {
            return Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ));
        }
    };

    audit::record(
        pool.get_ref(),
        Some(auth.user_id),
        AuditAction::Create,
        "employee",
        employee_id,
        None,
        audit::snapshot(&employee),
    )
    .await;

    Ok(HttpResponse::Created().json(employee))
}

async fn fetch_employee(
    pool: &MySqlPool,
    employee_id: u64,
) -> actix_web::Result<Option<Employee>> {
    sqlx::query_as::<_, Employee>(&format!(
        "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?"
    ))
    .bind(employee_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to fetch employee");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })
}

/// Paginated employee list, organization scoped
#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> actix_web::Result<impl Responder> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let mut conditions: Vec<String> = Vec::new();
    let mut bindings: Vec<sqlx::types::JsonValue> = Vec::new();

    if let Some(org) = auth.org_filter() {
        conditions.push("organization_id = ?".to_string());
        bindings.push(org.into());
    }

    let include_deleted =
        query.include_deleted.unwrap_or(false) && auth.require_hr_or_admin().is_ok();
    if !include_deleted {
        conditions.push("deleted_at IS NULL".to_string());
    }

    if let Some(department) = &query.department {
        conditions.push("department = ?".to_string());
        bindings.push(department.clone().into());
    }

    if let Some(status) = &query.status {
        conditions.push("status = ?".to_string());
        bindings.push(status.clone().into());
    }

    if let Some(search) = &query.search {
        conditions.push("(first_name LIKE ? OR last_name LIKE ? OR email LIKE ?)".to_string());
        let like = format!("%{}%", search);
        bindings.push(like.clone().into());
        bindings.push(like.clone().into());
        bindings.push(like.into());
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM employees {}", where_clause);

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = count_query.bind(b);
    }

    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %count_sql, "Failed to count employees");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        "SELECT {EMPLOYEE_COLUMNS} FROM employees {} ORDER BY id DESC LIMIT ? OFFSET ?",
        where_clause
    );

    let mut data_query = sqlx::query_as::<_, Employee>(&data_sql);
    for b in &bindings {
        data_query = data_query.bind(b);
    }
    data_query = data_query.bind(per_page as i64).bind(offset as i64);

    let employees = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %data_sql, "Failed to fetch employees");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data: employees,
        page,
        per_page,
        total,
    }))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}",
    params(("employee_id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn get_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();

    let employee = fetch_employee(pool.get_ref(), employee_id).await?;

    match employee {
        Some(emp) if auth.can_access_org(emp.organization_id) => {
            Ok(HttpResponse::Ok().json(emp))
        }
        Some(_) => Err(actix_web::error::ErrorForbidden("Outside your organization")),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        }))),
    }
}

/// Update Employee (audited with before/after snapshots)
#[utoipa::path(
    put,
    path = "/api/employees/{employee_id}",
    params(("employee_id" = u64, Path, description = "Employee ID")),
    request_body = UpdateEmployee,
    responses(
        (status = 200, description = "Employee updated", body = Employee),
        (status = 404, description = "Employee not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdateEmployee>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let employee_id = path.into_inner();

    let current = match fetch_employee(pool.get_ref(), employee_id).await? {
        Some(e) => e,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Employee not found"
            })));
        }
    };
    auth.require_org(current.organization_id)?;

    let first_name = body.first_name.as_deref().unwrap_or(&current.first_name);
    let last_name = body.last_name.as_deref().unwrap_or(&current.last_name);
    let email = body.email.as_deref().unwrap_or(&current.email);
    let phone = body.phone.as_deref().or(current.phone.as_deref());
    let department = body.department.as_deref().or(current.department.as_deref());
    let job_title = body.job_title.as_deref().or(current.job_title.as_deref());
    let status = body.status.as_deref().unwrap_or(&current.status);
    let hire_date = body.hire_date.unwrap_or(current.hire_date);

    sqlx::query(
        r#"
        UPDATE employees
        SET first_name = ?, last_name = ?, email = ?, phone = ?,
            department = ?, job_title = ?, status = ?, hire_date = ?
        WHERE id = ?
        "#,
    )
    .bind(first_name)
    .bind(last_name)
    .bind(email)
    .bind(phone)
    .bind(department)
    .bind(job_title)
    .bind(status)
    .bind(hire_date)
    .bind(employee_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to update employee");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let updated = match fetch_employee(pool.get_ref(), employee_id).await? {
        Some(e) => e,
        None => {
            return Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ));
        }
    };

    audit::record(
        pool.get_ref(),
        Some(auth.user_id),
        AuditAction::Update,
        "employee",
        employee_id,
        audit::snapshot(&current),
        audit::snapshot(&updated),
    )
    .await;

    Ok(HttpResponse::Ok().json(updated))
}

/// Soft-delete Employee
#[utoipa::path(
    delete,
    path = "/api/employees/{employee_id}",
    params(("employee_id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee deleted"),
        (status = 404, description = "Employee not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn delete_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let employee_id = path.into_inner();

    let current = match fetch_employee(pool.get_ref(), employee_id).await? {
        Some(e) if e.deleted_at.is_none() => e,
        _ => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Employee not found"
            })));
        }
    };
    auth.require_org(current.organization_id)?;

    sqlx::query(
        "UPDATE employees SET deleted_at = NOW(), status = 'inactive' WHERE id = ? AND deleted_at IS NULL",
    )
    .bind(employee_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to delete employee");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    audit::record(
        pool.get_ref(),
        Some(auth.user_id),
        AuditAction::Delete,
        "employee",
        employee_id,
        audit::snapshot(&current),
        None,
    )
    .await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee deleted"
    })))
}

/// Restore a soft-deleted Employee
#[utoipa::path(
    post,
    path = "/api/employees/{employee_id}/restore",
    params(("employee_id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee restored", body = Employee),
        (status = 404, description = "No deleted employee with this ID"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn restore_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let employee_id = path.into_inner();

    let current = match fetch_employee(pool.get_ref(), employee_id).await? {
        Some(e) if e.deleted_at.is_some() => e,
        _ => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "No deleted employee with this ID"
            })));
        }
    };
    auth.require_org(current.organization_id)?;

    sqlx::query(
        "UPDATE employees SET deleted_at = NULL, status = 'active' WHERE id = ? AND deleted_at IS NOT NULL",
    )
    .bind(employee_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to restore employee");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let restored = match fetch_employee(pool.get_ref(), employee_id).await? {
        Some(e) => e,
        None => {
            return Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ));
        }
    };

    audit::record(
        pool.get_ref(),
        Some(auth.user_id),
        AuditAction::Restore,
        "employee",
        employee_id,
        audit::snapshot(&current),
        audit::snapshot(&restored),
    )
    .await;

    Ok(HttpResponse::Ok().json(restored))
}

/// Fetch an employee's profile (empty collections when never written)
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}/profile",
    params(("employee_id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Profile", body = EmployeeProfile),
        (status = 404, description = "Employee not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn get_profile(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();

    let employee = match fetch_employee(pool.get_ref(), employee_id).await? {
        Some(e) => e,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Employee not found"
            })));
        }
    };
    auth.require_org(employee.organization_id)?;

    let profile = sqlx::query_as::<_, EmployeeProfile>(
        r#"
        SELECT employee_id, skills, certifications, work_experience, education
        FROM employee_profiles
        WHERE employee_id = ?
        "#,
    )
    .bind(employee_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to fetch profile");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    match profile {
        Some(p) => Ok(HttpResponse::Ok().json(p)),
        None => Ok(HttpResponse::Ok().json(json!({
            "employee_id": employee_id,
            "skills": [],
            "certifications": [],
            "work_experience": [],
            "education": []
        }))),
    }
}

/// Replace an employee's profile; every dated span is validated
#[utoipa::path(
    put,
    path = "/api/employees/{employee_id}/profile",
    params(("employee_id" = u64, Path, description = "Employee ID")),
    request_body = ProfilePayload,
    responses(
        (status = 200, description = "Profile saved"),
        (status = 404, description = "Employee not found"),
        (status = 422, description = "Validation failed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn put_profile(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<ProfilePayload>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();

    // Employees may edit their own profile, everyone else needs HR rights
    if auth.employee_id != Some(employee_id) {
        auth.require_hr_or_admin()?;
    }

    let employee = match fetch_employee(pool.get_ref(), employee_id).await? {
        Some(e) => e,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Employee not found"
            })));
        }
    };
    auth.require_org(employee.organization_id)?;

    let errors = payload.validate();
    if !errors.is_empty() {
        return Ok(errors.into_response());
    }

    sqlx::query(
        r#"
        INSERT INTO employee_profiles (employee_id, skills, certifications, work_experience, education)
        VALUES (?, ?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            skills = VALUES(skills),
            certifications = VALUES(certifications),
            work_experience = VALUES(work_experience),
            education = VALUES(education)
        "#,
    )
    .bind(employee_id)
    .bind(serde_json::to_value(&payload.skills).unwrap_or_default())
    .bind(serde_json::to_value(&payload.certifications).unwrap_or_default())
    .bind(serde_json::to_value(&payload.work_experience).unwrap_or_default())
    .bind(serde_json::to_value(&payload.education).unwrap_or_default())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to save profile");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Profile saved"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_key_messages_are_told_apart() {
        assert!(is_code_collision(
            "Duplicate entry '1-EMP-0001' for key 'employees.uq_employees_org_code'"
        ));
        assert!(!is_code_collision(
            "Duplicate entry 'john@email.com' for key 'employees.email'"
        ));
    }
}
