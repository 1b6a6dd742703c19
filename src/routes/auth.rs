use crate::{
    auth::{issue_token, verify_password, LoginForm, TokenResponse},
    config::Config,
    error::AppError,
    models::User,
};
use actix_web::{post, web, HttpResponse, Responder};
use sqlx::SqlitePool;

/// Resolves an identifier/password pair to a user.
///
/// Returns `None` for an unknown identifier, a missing hash or a wrong
/// password alike; the caller surfaces one indistinguishable error for all
/// three cases.
pub async fn authenticate(
    pool: &SqlitePool,
    ident: &str,
    password: &str,
) -> Result<Option<User>, AppError> {
    let user = match User::find_by_identifier(pool, ident).await? {
        Some(user) => user,
        None => return Ok(None),
    };
    if verify_password(password, &user.password_hash) {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}

/// Login endpoint
///
/// Accepts a form-encoded username (or email) and password and returns a
/// bearer token on success.
#[post("/login")]
pub async fn login(
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    form: web::Form<LoginForm>,
) -> Result<impl Responder, AppError> {
    let user = authenticate(&pool, &form.username, &form.password)
        .await?
        .ok_or_else(|| {
            AppError::InvalidCredentials("Incorrect username/email or password".into())
        })?;

    let token = issue_token(
        &config.jwt_secret,
        &user.username,
        user.id,
        config.token_ttl_minutes,
    )?;

    Ok(HttpResponse::Ok().json(TokenResponse::bearer(token)))
}
