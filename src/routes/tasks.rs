use crate::{
    auth::CurrentUser,
    error::AppError,
    models::task::{StatusChange, Task, TaskCreate, TaskPriority, TaskStatus, TaskUpdate, TASK_COLUMNS},
    normalize::{normalize_priority, normalize_status},
    query::{self, TaskFilter},
};
use actix_web::{delete, get, post, put, route, web, HttpResponse, Responder};
use chrono::Utc;
use sqlx::SqlitePool;
use validator::Validate;

/// Creates a new task.
///
/// Status and priority may arrive as free-form labels; unrecognized values
/// count as "not provided" and the entity defaults (not_started / medium)
/// apply.
#[post("")]
pub async fn create_task(
    pool: web::Data<SqlitePool>,
    _principal: CurrentUser,
    payload: web::Json<TaskCreate>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;

    let status = payload
        .status
        .as_deref()
        .and_then(normalize_status)
        .unwrap_or(TaskStatus::NotStarted);
    let priority = payload
        .priority
        .as_deref()
        .and_then(normalize_priority)
        .unwrap_or(TaskPriority::Medium);
    let now = Utc::now();

    let task = sqlx::query_as::<_, Task>(&format!(
        "INSERT INTO tasks (title, description, priority, status, progress, due_date, \
         assignee_id, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(priority)
    .bind(status)
    .bind(payload.progress.unwrap_or(0))
    .bind(payload.due_date)
    .bind(payload.assignee_id)
    .bind(now)
    .bind(now)
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Created().json(task))
}

/// Plain task listing, most recently updated first.
///
/// The role visibility boundary applies here as well: employees only see
/// tasks assigned to themselves.
#[get("")]
pub async fn list_tasks(
    pool: web::Data<SqlitePool>,
    principal: CurrentUser,
) -> Result<impl Responder, AppError> {
    let tasks = if principal.0.role.sees_all_tasks() {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks ORDER BY updated_at DESC, id DESC",
            TASK_COLUMNS
        ))
        .fetch_all(&**pool)
        .await?
    } else {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE assignee_id = ? ORDER BY updated_at DESC, id DESC",
            TASK_COLUMNS
        ))
        .bind(principal.0.id)
        .fetch_all(&**pool)
        .await?
    };

    Ok(HttpResponse::Ok().json(tasks))
}

/// The caller's own tasks: the search endpoint with the assignee pinned
/// to "me". All other filter dimensions still apply.
#[get("/my")]
pub async fn my_tasks(
    pool: web::Data<SqlitePool>,
    principal: CurrentUser,
    params: web::Query<TaskFilter>,
) -> Result<impl Responder, AppError> {
    let filter = TaskFilter {
        assignee: Some("me".to_string()),
        ..params.into_inner()
    };
    let page = query::search_tasks(&pool, &principal.0, &filter).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Filtered, sorted, paginated task search.
///
/// ## Query Parameters:
/// - `q` (optional): case-insensitive substring over title, description and id.
/// - `status` (optional): a status label, normalized; an unrecognized value
///   yields an empty result set (fail-closed).
/// - `overdue` (optional): `true` restricts to overdue, non-terminal tasks.
/// - `assignee` (optional): "me", a numeric user id, or unrestricted.
/// - `page`, `size`: 1-indexed pagination, size 1..=100.
/// - `sort`: updated_at (default, descending), created_at, due_date or
///   priority, with a leading '-' for descending.
#[get("/search")]
pub async fn search_tasks(
    pool: web::Data<SqlitePool>,
    principal: CurrentUser,
    params: web::Query<TaskFilter>,
) -> Result<impl Responder, AppError> {
    let page = query::search_tasks(&pool, &principal.0, &params).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Fetches a single task by key (numeric id or id rendered as text).
#[get("/{key}")]
pub async fn get_task(
    pool: web::Data<SqlitePool>,
    _principal: CurrentUser,
    key: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let task = Task::fetch_by_key(&pool, &key)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;
    Ok(HttpResponse::Ok().json(task))
}

async fn persist_task(pool: &SqlitePool, task: &Task) -> Result<Task, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!(
        "UPDATE tasks SET title = ?, description = ?, priority = ?, status = ?, \
         progress = ?, due_date = ?, assignee_id = ?, updated_at = ? \
         WHERE id = ? RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.priority)
    .bind(task.status)
    .bind(task.progress)
    .bind(task.due_date)
    .bind(task.assignee_id)
    .bind(task.updated_at)
    .bind(task.id)
    .fetch_one(pool)
    .await
}

/// Partial task update. Only supplied fields change; explicit nulls clear
/// the nullable fields, absent keys leave them untouched.
#[route("/{key}", method = "PUT", method = "PATCH")]
pub async fn update_task(
    pool: web::Data<SqlitePool>,
    _principal: CurrentUser,
    key: web::Path<String>,
    payload: web::Json<TaskUpdate>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;

    let mut task = Task::fetch_by_key(&pool, &key)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    if let Some(title) = &payload.title {
        task.title = title.clone();
    }
    if let Some(description) = &payload.description {
        task.description = description.clone();
    }
    if let Some(raw) = &payload.priority {
        if let Some(priority) = normalize_priority(raw) {
            task.priority = priority;
        }
    }
    if let Some(raw) = &payload.status {
        if let Some(status) = normalize_status(raw) {
            task.status = status;
        }
    }
    if let Some(progress) = payload.progress {
        task.progress = progress;
    }
    if let Some(due_date) = payload.due_date {
        task.due_date = due_date;
    }
    if let Some(assignee_id) = payload.assignee_id {
        task.assignee_id = assignee_id;
    }
    task.updated_at = Utc::now();

    let task = persist_task(&pool, &task).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Direct status transition.
///
/// The body carries a raw status label. An unrecognized label counts as
/// "not provided": the task is returned unchanged rather than erroring.
#[put("/{key}/status")]
pub async fn change_status(
    pool: web::Data<SqlitePool>,
    _principal: CurrentUser,
    key: web::Path<String>,
    payload: web::Json<StatusChange>,
) -> Result<impl Responder, AppError> {
    let mut task = Task::fetch_by_key(&pool, &key)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    if let Some(status) = normalize_status(&payload.status) {
        task.status = status;
        task.updated_at = Utc::now();
        task = persist_task(&pool, &task).await?;
    }

    Ok(HttpResponse::Ok().json(task))
}

/// Deletes a task by key.
#[delete("/{key}")]
pub async fn delete_task(
    pool: web::Data<SqlitePool>,
    _principal: CurrentUser,
    key: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let task = Task::fetch_by_key(&pool, &key)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(task.id)
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Task not found".into()));
    }

    Ok(HttpResponse::NoContent().finish())
}
