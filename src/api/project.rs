use crate::auth::auth::AuthUser;
use crate::model::audit::AuditAction;
use crate::model::project::{Project, ProjectStatus, ProjectTask, TaskStatus};
use crate::utils::audit;
use crate::utils::validation::FieldErrors;
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateProject {
    #[schema(example = "Payroll revamp")]
    pub name: String,
    #[schema(example = "Quarterly payroll engine overhaul", nullable = true)]
    pub description: Option<String>,
    #[schema(example = "2026-01-01", value_type = String, format = "date", nullable = true)]
    pub start_date: Option<NaiveDate>,
    #[schema(example = "2026-06-30", value_type = String, format = "date", nullable = true)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    #[schema(example = "completed")]
    pub status: Option<String>,
    #[schema(value_type = String, format = "date", nullable = true)]
    pub start_date: Option<NaiveDate>,
    #[schema(value_type = String, format = "date", nullable = true)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateTask {
    #[schema(example = "Draft schema")]
    pub title: String,
    #[schema(example = 42, nullable = true)]
    pub assignee_id: Option<u64>,
    #[schema(example = "2026-02-15", value_type = String, format = "date", nullable = true)]
    pub due_date: Option<NaiveDate>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateTask {
    pub title: Option<String>,
    #[schema(example = "in_progress")]
    pub status: Option<String>,
    pub assignee_id: Option<u64>,
    #[schema(value_type = String, format = "date", nullable = true)]
    pub due_date: Option<NaiveDate>,
}

const PROJECT_COLUMNS: &str =
    "id, organization_id, name, description, status, start_date, end_date, created_at";
const TASK_COLUMNS: &str = "id, project_id, assignee_id, title, status, due_date, created_at";

async fn fetch_project(pool: &MySqlPool, id: u64) -> actix_web::Result<Option<Project>> {
    sqlx::query_as::<_, Project>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, project_id = id, "Failed to fetch project");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })
}

/// Create a project (Manager and above)
#[utoipa::path(
    post,
    path = "/api/projects",
    request_body = CreateProject,
    responses(
        (status = 201, description = "Project created", body = Project),
        (status = 422, description = "Validation failed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Project"
)]
pub async fn create_project(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateProject>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_above()?;

    let mut errors = FieldErrors::new();
    if payload.name.trim().is_empty() {
        errors.push("name", "must not be empty");
    }
    if let (Some(start), Some(end)) = (payload.start_date, payload.end_date) {
        if end < start {
            errors.push("end_date", "must not be before start_date");
        }
    }
    if !errors.is_empty() {
        return Ok(errors.into_response());
    }

    let result = sqlx::query(
        r#"
        INSERT INTO projects (organization_id, name, description, status, start_date, end_date)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(auth.organization_id)
    .bind(payload.name.trim())
    .bind(&payload.description)
    .bind(ProjectStatus::Active.to_string())
    .bind(payload.start_date)
    .bind(payload.end_date)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to create project");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let project_id = result.last_insert_id();
    let project = match fetch_project(pool.get_ref(), project_id).await? {
        Some(p) => p,
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
        "project",
        project_id,
        None,
        audit::snapshot(&project),
    )
    .await;

    Ok(HttpResponse::Created().json(project))
}

/// List the organization's projects
#[utoipa::path(
    get,
    path = "/api/projects",
    responses(
        (status = 200, description = "Projects", body = [Project]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Project"
)]
pub async fn list_projects(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let mut sql = format!("SELECT {PROJECT_COLUMNS} FROM projects");
    if auth.org_filter().is_some() {
        sql.push_str(" WHERE organization_id = ?");
    }
    sql.push_str(" ORDER BY created_at DESC");

    let mut q = sqlx::query_as::<_, Project>(&sql);
    if let Some(org) = auth.org_filter() {
        q = q.bind(org);
    }

    let projects = q.fetch_all(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch projects");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(projects))
}

/// Fetch a single project
#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    params(("id" = u64, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project", body = Project),
        (status = 404, description = "Project not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Project"
)]
pub async fn get_project(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();

    match fetch_project(pool.get_ref(), id).await? {
        Some(p) => {
            auth.require_org(p.organization_id)?;
            Ok(HttpResponse::Ok().json(p))
        }
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Project not found"
        }))),
    }
}

/// Update a project (Manager and above, audited)
#[utoipa::path(
    put,
    path = "/api/projects/{id}",
    params(("id" = u64, Path, description = "Project ID")),
    request_body = UpdateProject,
    responses(
        (status = 200, description = "Project updated", body = Project),
        (status = 404, description = "Project not found"),
        (status = 422, description = "Validation failed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Project"
)]
pub async fn update_project(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdateProject>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_above()?;

    let id = path.into_inner();

    let current = match fetch_project(pool.get_ref(), id).await? {
        Some(p) => p,
        None => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "message": "Project not found"
            })));
        }
    };
    auth.require_org(current.organization_id)?;

    if let Some(status) = body.status.as_deref() {
        if status.parse::<ProjectStatus>().is_err() {
            let mut errors = FieldErrors::new();
            errors.push("status", "must be one of: active, on_hold, completed, archived");
            return Ok(errors.into_response());
        }
    }

    let name = body.name.as_deref().unwrap_or(&current.name);
    let description = body.description.as_deref().or(current.description.as_deref());
    let status = body.status.as_deref().unwrap_or(&current.status);
    let start_date = body.start_date.or(current.start_date);
    let end_date = body.end_date.or(current.end_date);

    sqlx::query(
        r#"
        UPDATE projects
        SET name = ?, description = ?, status = ?, start_date = ?, end_date = ?
        WHERE id = ?
        "#,
    )
    .bind(name.trim())
    .bind(description)
    .bind(status)
    .bind(start_date)
    .bind(end_date)
    .bind(id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, project_id = id, "Failed to update project");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let updated = match fetch_project(pool.get_ref(), id).await? {
        Some(p) => p,
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
        "project",
        id,
        audit::snapshot(&current),
        audit::snapshot(&updated),
    )
    .await;

    Ok(HttpResponse::Ok().json(updated))
}

/// Add a task to a project (Manager and above)
#[utoipa::path(
    post,
    path = "/api/projects/{id}/tasks",
    params(("id" = u64, Path, description = "Project ID")),
    request_body = CreateTask,
    responses(
        (status = 201, description = "Task created", body = ProjectTask),
        (status = 404, description = "Project not found"),
        (status = 422, description = "Validation failed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Project"
)]
pub async fn create_task(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<CreateTask>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_above()?;

    let project_id = path.into_inner();

    let project = match fetch_project(pool.get_ref(), project_id).await? {
        Some(p) => p,
        None => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "message": "Project not found"
            })));
        }
    };
    auth.require_org(project.organization_id)?;

    if payload.title.trim().is_empty() {
        let mut errors = FieldErrors::new();
        errors.push("title", "must not be empty");
        return Ok(errors.into_response());
    }

    let result = sqlx::query(
        r#"
        INSERT INTO project_tasks (project_id, assignee_id, title, status, due_date)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(project_id)
    .bind(payload.assignee_id)
    .bind(payload.title.trim())
    .bind(TaskStatus::Todo.to_string())
    .bind(payload.due_date)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, project_id, "Failed to create task");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let task = sqlx::query_as::<_, ProjectTask>(&format!(
        "SELECT {TASK_COLUMNS} FROM project_tasks WHERE id = ?"
    ))
    .bind(result.last_insert_id())
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to reload task");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Created().json(task))
}

/// List a project's tasks
#[utoipa::path(
    get,
    path = "/api/projects/{id}/tasks",
    params(("id" = u64, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Tasks", body = [ProjectTask]),
        (status = 404, description = "Project not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Project"
)]
pub async fn list_tasks(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let project_id = path.into_inner();

    let project = match fetch_project(pool.get_ref(), project_id).await? {
        Some(p) => p,
        None => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "message": "Project not found"
            })));
        }
    };
    auth.require_org(project.organization_id)?;

    let tasks = sqlx::query_as::<_, ProjectTask>(&format!(
        "SELECT {TASK_COLUMNS} FROM project_tasks WHERE project_id = ? ORDER BY id"
    ))
    .bind(project_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, project_id, "Failed to fetch tasks");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(tasks))
}

/// Update a task: the assignee may move its status, managers may edit everything
#[utoipa::path(
    put,
    path = "/api/tasks/{id}",
    params(("id" = u64, Path, description = "Task ID")),
    request_body = UpdateTask,
    responses(
        (status = 200, description = "Task updated", body = ProjectTask),
        (status = 404, description = "Task not found"),
        (status = 422, description = "Validation failed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Project"
)]
pub async fn update_task(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdateTask>,
) -> actix_web::Result<impl Responder> {
    let task_id = path.into_inner();

    let current = sqlx::query_as::<_, ProjectTask>(&format!(
        "SELECT {TASK_COLUMNS} FROM project_tasks WHERE id = ?"
    ))
    .bind(task_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, task_id, "Failed to fetch task");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let current = match current {
        Some(t) => t,
        None => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "message": "Task not found"
            })));
        }
    };

    let project = match fetch_project(pool.get_ref(), current.project_id).await? {
        Some(p) => p,
        None => {
            return Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ));
        }
    };
    auth.require_org(project.organization_id)?;

    // Assignees only get to move status on their own task
    let is_assignee = current.assignee_id == Some(auth.user_id);
    if !is_assignee {
        auth.require_manager_or_above()?;
    } else if body.title.is_some() || body.assignee_id.is_some() || body.due_date.is_some() {
        auth.require_manager_or_above()?;
    }

    if let Some(status) = body.status.as_deref() {
        if status.parse::<TaskStatus>().is_err() {
            let mut errors = FieldErrors::new();
            errors.push("status", "must be one of: todo, in_progress, done");
            return Ok(errors.into_response());
        }
    }

    let title = body.title.as_deref().unwrap_or(&current.title);
    let status = body.status.as_deref().unwrap_or(&current.status);
    let assignee_id = body.assignee_id.or(current.assignee_id);
    let due_date = body.due_date.or(current.due_date);

    sqlx::query(
        r#"
        UPDATE project_tasks
        SET title = ?, status = ?, assignee_id = ?, due_date = ?
        WHERE id = ?
        "#,
    )
    .bind(title.trim())
    .bind(status)
    .bind(assignee_id)
    .bind(due_date)
    .bind(task_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, task_id, "Failed to update task");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let updated = sqlx::query_as::<_, ProjectTask>(&format!(
        "SELECT {TASK_COLUMNS} FROM project_tasks WHERE id = ?"
    ))
    .bind(task_id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, task_id, "Failed to reload task");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(updated))
}
