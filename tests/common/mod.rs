#![allow(dead_code)]

use abacus::{db, routes, Config};
use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{test, web, App, Error};
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

pub const TEST_SECRET: &str = "test-signing-secret";

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        jwt_secret: TEST_SECRET.to_string(),
        token_ttl_minutes: 60,
    }
}

/// A fresh in-memory database with the schema applied. A single connection
/// keeps the memory database alive for the whole test.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    db::init_schema(&pool).await.expect("Failed to create schema");
    pool
}

/// Builds the application exactly as `main.rs` does, minus the outer
/// CORS/logging middleware.
pub async fn init_app(
    pool: SqlitePool,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(pool))
            .app_data(web::Data::new(test_config()))
            .service(routes::health::index)
            .service(routes::health::health)
            .configure(routes::config),
    )
    .await
}

/// Sends a request and returns its status plus the parsed JSON body
/// (`Value::Null` for empty bodies).
pub async fn send(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error>,
    req: Request,
) -> (StatusCode, Value) {
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, json)
}

pub fn authed(req: test::TestRequest, token: &str) -> test::TestRequest {
    req.insert_header(("Authorization", format!("Bearer {}", token)))
}

/// Logs in with a username or email and returns the bearer token.
pub async fn login(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error>,
    ident: &str,
    password: &str,
) -> String {
    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_form([("username", ident), ("password", password)])
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    assert_eq!(body["token_type"], "bearer");
    body["access_token"]
        .as_str()
        .expect("login response must carry access_token")
        .to_string()
}

/// Creates the very first account (the bootstrap admin) and logs in.
/// Returns (user id, token).
pub async fn bootstrap_admin(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error>,
    username: &str,
    email: &str,
    password: &str,
) -> (i64, String) {
    let req = test::TestRequest::post()
        .uri("/users")
        .set_json(serde_json::json!({
            "username": username,
            "email": email,
            "password": password
        }))
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::CREATED, "bootstrap failed: {}", body);
    assert_eq!(body["role"], "admin", "first user must be forced to admin");
    let id = body["id"].as_i64().unwrap();
    let token = login(app, username, password).await;
    (id, token)
}

/// Creates an additional account through an admin token and logs in.
/// Returns (user id, token).
pub async fn create_user_as(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error>,
    admin_token: &str,
    username: &str,
    email: &str,
    password: &str,
    role: &str,
) -> (i64, String) {
    let req = authed(test::TestRequest::post(), admin_token)
        .uri("/users")
        .set_json(serde_json::json!({
            "username": username,
            "email": email,
            "password": password,
            "role": role
        }))
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::CREATED, "user creation failed: {}", body);
    assert_eq!(body["role"], role);
    let id = body["id"].as_i64().unwrap();
    let token = login(app, username, password).await;
    (id, token)
}

/// Creates a task and returns its JSON representation.
pub async fn create_task(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error>,
    token: &str,
    payload: Value,
) -> Value {
    let req = authed(test::TestRequest::post(), token)
        .uri("/tasks")
        .set_json(payload)
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::CREATED, "task creation failed: {}", body);
    body
}

/// Yesterday's date in ISO format, for overdue fixtures.
pub fn yesterday() -> String {
    (chrono::Utc::now().date_naive() - chrono::Duration::days(1)).to_string()
}

/// Tomorrow's date in ISO format.
pub fn tomorrow() -> String {
    (chrono::Utc::now().date_naive() + chrono::Duration::days(1)).to_string()
}
