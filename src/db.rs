//! Database pool construction and schema bootstrap.
//!
//! The schema is created on startup if it does not already exist, so a fresh
//! deployment (or an in-memory test database) needs no migration step.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

const CREATE_USERS: &str = "\
CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL UNIQUE,
    email         TEXT NOT NULL UNIQUE,
    full_name     TEXT,
    role          TEXT NOT NULL DEFAULT 'employee',
    password_hash TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
)";

// assignee_id is a weak reference: deleting a user leaves it dangling on purpose.
const CREATE_TASKS: &str = "\
CREATE TABLE IF NOT EXISTS tasks (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    title       TEXT NOT NULL,
    description TEXT,
    priority    TEXT NOT NULL DEFAULT 'medium',
    status      TEXT NOT NULL DEFAULT 'not_started',
    progress    INTEGER NOT NULL DEFAULT 0,
    due_date    TEXT,
    assignee_id INTEGER,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
)";

/// Opens a connection pool for the given database URL.
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
}

/// Creates the `users` and `tasks` tables if they are missing.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(CREATE_USERS).execute(pool).await?;
    sqlx::query(CREATE_TASKS).execute(pool).await?;
    Ok(())
}
