use crate::{
    auth::{hash_password, verify_password, CurrentUser},
    error::AppError,
    models::user::{MeUpdate, PasswordChange, Role, User, UserCreate, UserUpdate, USER_COLUMNS},
};
use actix_web::{delete, get, patch, post, route, web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

async fn username_taken(
    pool: &SqlitePool,
    username: &str,
    exclude_id: Option<i64>,
) -> Result<bool, sqlx::Error> {
    let existing: Option<i64> =
        sqlx::query_scalar("SELECT id FROM users WHERE username = ? AND id <> ?")
            .bind(username)
            .bind(exclude_id.unwrap_or(-1))
            .fetch_optional(pool)
            .await?;
    Ok(existing.is_some())
}

async fn email_taken(
    pool: &SqlitePool,
    email: &str,
    exclude_id: Option<i64>,
) -> Result<bool, sqlx::Error> {
    let existing: Option<i64> =
        sqlx::query_scalar("SELECT id FROM users WHERE email = ? AND id <> ?")
            .bind(email)
            .bind(exclude_id.unwrap_or(-1))
            .fetch_optional(pool)
            .await?;
    Ok(existing.is_some())
}

async fn persist_user(pool: &SqlitePool, user: &User) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET username = ?, email = ?, full_name = ?, role = ?, \
         password_hash = ?, updated_at = ? WHERE id = ? RETURNING {}",
        USER_COLUMNS
    ))
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.full_name)
    .bind(user.role)
    .bind(&user.password_hash)
    .bind(user.updated_at)
    .bind(user.id)
    .fetch_one(pool)
    .await
}

/// Creates a new user account.
///
/// Normally admin-only. The single exception is the bootstrap rule: when the
/// directory is empty the request needs no token and the created account is
/// forced to the admin role regardless of what was asked for.
#[post("")]
pub async fn create_user(
    pool: web::Data<SqlitePool>,
    principal: Option<CurrentUser>,
    payload: web::Json<UserCreate>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;

    let user_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&**pool)
        .await?;
    let bootstrap = user_count == 0;

    if !bootstrap {
        let actor = principal
            .ok_or_else(|| AppError::InvalidToken("Authentication required".into()))?
            .0;
        if actor.role != Role::Admin {
            return Err(AppError::Forbidden("Admin role required".into()));
        }
    }

    if username_taken(&pool, &payload.username, None).await? {
        return Err(AppError::Conflict("Username already exists".into()));
    }
    if email_taken(&pool, &payload.email, None).await? {
        return Err(AppError::Conflict("Email already exists".into()));
    }

    let role = if bootstrap {
        Role::Admin
    } else {
        payload.role.unwrap_or(Role::Employee)
    };
    let password_hash = hash_password(&payload.password)?;
    let now = Utc::now();

    let user = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (username, email, full_name, role, password_hash, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {}",
        USER_COLUMNS
    ))
    .bind(&payload.username)
    .bind(&payload.email)
    .bind(&payload.full_name)
    .bind(role)
    .bind(&password_hash)
    .bind(now)
    .bind(now)
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Created().json(user))
}

/// Lists all users, ordered by id.
#[get("")]
pub async fn list_users(
    pool: web::Data<SqlitePool>,
    _principal: CurrentUser,
) -> Result<impl Responder, AppError> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users ORDER BY id",
        USER_COLUMNS
    ))
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(users))
}

/// Returns the authenticated user's own profile.
#[get("/me")]
pub async fn get_me(principal: CurrentUser) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(principal.0))
}

/// Self-service profile update (email and full name only).
#[patch("/me")]
pub async fn update_me(
    pool: web::Data<SqlitePool>,
    principal: CurrentUser,
    payload: web::Json<MeUpdate>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;
    let mut user = principal.0;

    if let Some(email) = &payload.email {
        if *email != user.email {
            if email_taken(&pool, email, Some(user.id)).await? {
                return Err(AppError::Conflict("Email already exists".into()));
            }
            user.email = email.clone();
        }
    }
    if let Some(full_name) = &payload.full_name {
        user.full_name = full_name.clone();
    }
    user.updated_at = Utc::now();

    let user = persist_user(&pool, &user).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// Self-service password change; requires the current password.
#[patch("/me/password")]
pub async fn change_my_password(
    pool: web::Data<SqlitePool>,
    principal: CurrentUser,
    payload: web::Json<PasswordChange>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;
    let user = principal.0;

    if !verify_password(&payload.current_password, &user.password_hash) {
        return Err(AppError::BadRequest("Current password is incorrect".into()));
    }

    let password_hash = hash_password(&payload.new_password)?;
    sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
        .bind(&password_hash)
        .bind(Utc::now())
        .bind(user.id)
        .execute(&**pool)
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}

/// Fetches a user by id, username or email.
#[get("/{reference}")]
pub async fn get_user(
    pool: web::Data<SqlitePool>,
    _principal: CurrentUser,
    reference: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let user = User::resolve_by_reference(&pool, &reference)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(HttpResponse::Ok().json(user))
}

/// Admin-driven user edit; only supplied fields change.
#[route("/{reference}", method = "PUT", method = "PATCH")]
pub async fn update_user(
    pool: web::Data<SqlitePool>,
    principal: CurrentUser,
    reference: web::Path<String>,
    payload: web::Json<UserUpdate>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;
    if principal.0.role != Role::Admin {
        return Err(AppError::Forbidden("Admin role required".into()));
    }

    let mut user = User::resolve_by_reference(&pool, &reference)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if let Some(username) = &payload.username {
        if username_taken(&pool, username, Some(user.id)).await? {
            return Err(AppError::Conflict("Username already exists".into()));
        }
        user.username = username.clone();
    }
    if let Some(email) = &payload.email {
        if email_taken(&pool, email, Some(user.id)).await? {
            return Err(AppError::Conflict("Email already exists".into()));
        }
        user.email = email.clone();
    }
    if let Some(full_name) = &payload.full_name {
        user.full_name = full_name.clone();
    }
    if let Some(role) = payload.role {
        user.role = role;
    }
    if let Some(password) = &payload.password {
        user.password_hash = hash_password(password)?;
    }
    user.updated_at = Utc::now();

    let user = persist_user(&pool, &user).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// Hard-deletes a user. Tasks assigned to them keep a dangling assignee
/// reference; nothing cascades.
#[delete("/{reference}")]
pub async fn delete_user(
    pool: web::Data<SqlitePool>,
    principal: CurrentUser,
    reference: web::Path<String>,
) -> Result<impl Responder, AppError> {
    if principal.0.role != Role::Admin {
        return Err(AppError::Forbidden("Admin role required".into()));
    }

    let user = User::resolve_by_reference(&pool, &reference)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user.id)
        .execute(&**pool)
        .await?;

    Ok(HttpResponse::NoContent().finish())
}
