use std::env;

/// Default signing secret used when `JWT_SECRET` is unset.
/// Only acceptable for local development; `from_env` logs a warning when it is used.
const DEV_SECRET: &str = "change-this-in-production-please";

pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
}

impl Config {
    pub fn from_env() -> Self {
        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(val) => val,
            Err(_) => {
                log::warn!("JWT_SECRET not set, falling back to the development secret");
                DEV_SECRET.to_string()
            }
        };

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://abacus.db?mode=rwc".to_string()),
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("SERVER_PORT must be a number"),
            jwt_secret,
            token_ttl_minutes: env::var("ACCESS_TOKEN_MINUTES")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .expect("ACCESS_TOKEN_MINUTES must be a number"),
        }
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}
