use crate::error::AppError;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Represents the claims encoded within a session token.
///
/// Tokens are stateless: once minted they stay valid until `exp` and cannot be
/// revoked server-side.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject of the token: the user's username.
    pub sub: String,
    /// The user's id at issue time, carried as a convenience claim.
    pub uid: i64,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: usize,
    /// Expiration timestamp (seconds since epoch).
    pub exp: usize,
}

/// Issues a signed HS256 token for the given subject.
///
/// The secret and time-to-live come from the application config and are passed
/// explicitly so the function stays free of environment reads.
pub fn issue_token(
    secret: &str,
    subject: &str,
    uid: i64,
    ttl_minutes: i64,
) -> Result<String, AppError> {
    let now = chrono::Utc::now();
    let expiration = now
        .checked_add_signed(chrono::Duration::minutes(ttl_minutes))
        .ok_or_else(|| AppError::InternalServerError("Token expiry overflow".into()))?;

    let claims = Claims {
        sub: subject.to_string(),
        uid,
        iat: now.timestamp() as usize,
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
}

/// Verifies a token string and decodes its claims.
///
/// Fails with `AppError::InvalidToken` if the signature is invalid, the
/// payload is malformed, or the token has expired. Leeway is set to zero so a
/// token fails verification at its exact expiry instant.
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::default();
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::InvalidToken(format!("Invalid token: {}", e)))
}
