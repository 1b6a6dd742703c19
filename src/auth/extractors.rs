use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, Error as ActixError, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use sqlx::SqlitePool;

use crate::auth::token::verify_token;
use crate::config::Config;
use crate::error::AppError;
use crate::models::User;

/// Extracts the authenticated principal from the request.
///
/// The bearer token is verified statelessly, then the subject claim is
/// resolved against the user directory -- a token whose subject no longer
/// exists (deleted or renamed user) is rejected. Handlers that allow
/// unauthenticated access in specific situations (the bootstrap user creation)
/// take `Option<CurrentUser>` instead.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequest for CurrentUser {
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let pool = req.app_data::<web::Data<SqlitePool>>().cloned();
        let config = req.app_data::<web::Data<Config>>().cloned();
        let bearer = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::to_owned);

        Box::pin(async move {
            let pool = pool.ok_or_else(|| {
                AppError::InternalServerError("Database pool not configured".into())
            })?;
            let config = config.ok_or_else(|| {
                AppError::InternalServerError("Application config not configured".into())
            })?;
            let token = bearer
                .ok_or_else(|| AppError::InvalidToken("Missing bearer token".into()))?;

            let claims = verify_token(&config.jwt_secret, &token)?;

            let user = User::find_by_identifier(&pool, &claims.sub)
                .await
                .map_err(AppError::from)?
                .ok_or_else(|| AppError::InvalidToken("Unknown token subject".into()))?;

            Ok(CurrentUser(user))
        })
    }
}
