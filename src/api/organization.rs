use crate::auth::auth::AuthUser;
use crate::model::organization::Organization;
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateOrganization {
    #[schema(example = "Acme Corp")]
    pub name: String,
}

/// Create an organization (Super Admin only)
#[utoipa::path(
    post,
    path = "/api/organizations",
    request_body = CreateOrganization,
    responses(
        (status = 201, description = "Organization created", body = Organization),
        (status = 409, description = "Name already exists"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Organization"
)]
pub async fn create_organization(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateOrganization>,
) -> actix_web::Result<impl Responder> {
    auth.require_super_admin()?;

    let result = sqlx::query("INSERT INTO organizations (name) VALUES (?)")
        .bind(payload.name.trim())
        .execute(pool.get_ref())
        .await;

    let org_id = match result {
        Ok(r) => r.last_insert_id(),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(serde_json::json!({
                        "message": "Organization name already exists"
                    })));
                }
            }
            tracing::error!(error = %e, "Failed to create organization");
            return Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ));
        }
    };

    let org = sqlx::query_as::<_, Organization>(
        "SELECT id, name, created_at FROM organizations WHERE id = ?",
    )
    .bind(org_id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, org_id, "Failed to reload organization");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Created().json(org))
}

/// List organizations (Super Admin only)
#[utoipa::path(
    get,
    path = "/api/organizations",
    responses(
        (status = 200, description = "Organizations", body = [Organization]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Organization"
)]
pub async fn list_organizations(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_super_admin()?;

    let orgs = sqlx::query_as::<_, Organization>(
        "SELECT id, name, created_at FROM organizations ORDER BY name",
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch organizations");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(orgs))
}

/// Fetch a single organization (own org, or Super Admin)
#[utoipa::path(
    get,
    path = "/api/organizations/{id}",
    params(("id" = u64, Path, description = "Organization ID")),
    responses(
        (status = 200, description = "Organization", body = Organization),
        (status = 404, description = "Organization not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Organization"
)]
pub async fn get_organization(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();
    auth.require_org(id)?;

    let org = sqlx::query_as::<_, Organization>(
        "SELECT id, name, created_at FROM organizations WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, id, "Failed to fetch organization");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    match org {
        Some(org) => Ok(HttpResponse::Ok().json(org)),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Organization not found"
        }))),
    }
}
