use crate::auth::auth::AuthUser;
use crate::model::leave::LeaveType;
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateLeaveType {
    #[schema(example = "annual")]
    pub name: String,
    #[schema(example = 20)]
    pub default_days: u32,
    /// Target organization (Super Admin only; defaults to the caller's)
    #[schema(example = 1, nullable = true)]
    pub organization_id: Option<u64>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateLeaveType {
    #[schema(example = "annual")]
    pub name: Option<String>,
    #[schema(example = 25)]
    pub default_days: Option<u32>,
}

/// Create a leave type in the caller's organization
#[utoipa::path(
    post,
    path = "/api/leave-types",
    request_body = CreateLeaveType,
    responses(
        (status = 201, description = "Leave type created"),
        (status = 409, description = "Name already exists in this organization"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "LeaveType"
)]
pub async fn create_leave_type(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeaveType>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

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
            let mut errors = crate::utils::validation::FieldErrors::new();
            errors.push("organization_id", "unknown organization");
            return Ok(errors.into_response());
        }
    }

    let result = sqlx::query(
        r#"
        INSERT INTO leave_types (organization_id, name, default_days)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(organization_id)
    .bind(payload.name.trim())
    .bind(payload.default_days)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(r) => Ok(HttpResponse::Created().json(serde_json::json!({
            "message": "Leave type created",
            "id": r.last_insert_id()
        }))),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(serde_json::json!({
                        "message": "Leave type already exists in this organization"
                    })));
                }
            }
            tracing::error!(error = %e, "Failed to create leave type");
            Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ))
        }
    }
}

/// List the organization's leave types
#[utoipa::path(
    get,
    path = "/api/leave-types",
    responses(
        (status = 200, description = "Leave types", body = [LeaveType]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "LeaveType"
)]
pub async fn list_leave_types(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let mut sql =
        String::from("SELECT id, organization_id, name, default_days FROM leave_types");
    if auth.org_filter().is_some() {
        sql.push_str(" WHERE organization_id = ?");
    }
    sql.push_str(" ORDER BY organization_id, name");

    let mut q = sqlx::query_as::<_, LeaveType>(&sql);
    if let Some(org) = auth.org_filter() {
        q = q.bind(org);
    }

    let types = q.fetch_all(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch leave types");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(types))
}

/// Update a leave type
#[utoipa::path(
    put,
    path = "/api/leave-types/{id}",
    params(("id" = u64, Path, description = "Leave type ID")),
    request_body = UpdateLeaveType,
    responses(
        (status = 200, description = "Leave type updated"),
        (status = 404, description = "Leave type not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "LeaveType"
)]
pub async fn update_leave_type(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateLeaveType>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let id = path.into_inner();

    let current = sqlx::query_as::<_, LeaveType>(
        "SELECT id, organization_id, name, default_days FROM leave_types WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, id, "Failed to fetch leave type");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let current = match current {
        Some(c) => c,
        None => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "message": "Leave type not found"
            })));
        }
    };
    auth.require_org(current.organization_id)?;

    let name = payload.name.as_deref().unwrap_or(&current.name);
    let default_days = payload.default_days.unwrap_or(current.default_days);

    sqlx::query("UPDATE leave_types SET name = ?, default_days = ? WHERE id = ?")
        .bind(name.trim())
        .bind(default_days)
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, id, "Failed to update leave type");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave type updated"
    })))
}

/// Delete a leave type (fails while requests reference it)
#[utoipa::path(
    delete,
    path = "/api/leave-types/{id}",
    params(("id" = u64, Path, description = "Leave type ID")),
    responses(
        (status = 200, description = "Leave type deleted"),
        (status = 404, description = "Leave type not found"),
        (status = 409, description = "Leave type is still referenced"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "LeaveType"
)]
pub async fn delete_leave_type(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let id = path.into_inner();

    let org = sqlx::query_scalar::<_, u64>("SELECT organization_id FROM leave_types WHERE id = ?")
        .bind(id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, id, "Failed to fetch leave type");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let org = match org {
        Some(org) => org,
        None => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "message": "Leave type not found"
            })));
        }
    };
    auth.require_org(org)?;

    match sqlx::query("DELETE FROM leave_types WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await
    {
        Ok(_) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "Leave type deleted"
        }))),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(serde_json::json!({
                        "message": "Leave type is referenced by requests or balances"
                    })));
                }
            }
            tracing::error!(error = %e, id, "Failed to delete leave type");
            Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ))
        }
    }
}
