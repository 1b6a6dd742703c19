use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use validator::Validate;

/// Represents the priority of a task. Stored as lowercase text.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Critical => "critical",
        }
    }
}

/// Represents the workflow status of a task. Stored as snake_case text.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Completed,
    Approved,
    Rejected,
    Resubmit,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not_started",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Approved => "approved",
            TaskStatus::Rejected => "rejected",
            TaskStatus::Resubmit => "resubmit",
        }
    }

    /// Statuses after which a task is no longer open for the overdue
    /// computation.
    pub const TERMINAL: [TaskStatus; 3] = [
        TaskStatus::Completed,
        TaskStatus::Approved,
        TaskStatus::Rejected,
    ];

    pub fn is_terminal(&self) -> bool {
        Self::TERMINAL.contains(self)
    }
}

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    /// Percent completion, 0..=100.
    pub progress: i32,
    pub due_date: Option<NaiveDate>,
    /// Weak reference to the assigned user; null means unassigned and a
    /// deleted user leaves it dangling.
    pub assignee_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub(crate) const TASK_COLUMNS: &str = "id, title, description, priority, status, progress, \
     due_date, assignee_id, created_at, updated_at";

impl Task {
    /// Fetches a single task by a key that may arrive as a numeric id or as
    /// the id rendered as text. Strategies are tried in order, first hit wins.
    pub async fn fetch_by_key(pool: &SqlitePool, key: &str) -> Result<Option<Task>, sqlx::Error> {
        if let Ok(id) = key.parse::<i64>() {
            let by_id = sqlx::query_as::<_, Task>(&format!(
                "SELECT {} FROM tasks WHERE id = ?",
                TASK_COLUMNS
            ))
            .bind(id)
            .fetch_optional(pool)
            .await?;
            if by_id.is_some() {
                return Ok(by_id);
            }
        }
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE CAST(id AS TEXT) = ?",
            TASK_COLUMNS
        ))
        .bind(key)
        .fetch_optional(pool)
        .await
    }
}

/// Payload for creating a task. Status and priority arrive as free-form
/// strings and are run through the normalizer; unrecognized values are
/// treated as omitted so the entity defaults apply.
#[derive(Debug, Deserialize, Validate)]
pub struct TaskCreate {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    #[validate(range(min = 0, max = 100))]
    pub progress: Option<i32>,
    pub due_date: Option<NaiveDate>,
    pub assignee_id: Option<i64>,
}

/// Partial update payload for `PUT|PATCH /tasks/{key}`. Only supplied fields
/// change; nullable fields distinguish "absent" from "set to null".
#[derive(Debug, Default, Deserialize, Validate)]
pub struct TaskUpdate {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    pub description: Option<Option<String>>,
    pub priority: Option<String>,
    pub status: Option<String>,
    #[validate(range(min = 0, max = 100))]
    pub progress: Option<i32>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    pub assignee_id: Option<Option<i64>>,
}

/// Payload for `PUT /tasks/{key}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: String,
}
