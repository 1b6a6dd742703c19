//! The task query engine.
//!
//! Composes four independent filter dimensions (free text, status, overdue,
//! assignee), a sort order and pagination into a single SQL query, with a
//! role-based visibility overlay applied after the nominal filters are
//! resolved. Status filter terms go through the normalizer; a supplied value
//! that fails normalization resolves the whole query to an empty result set
//! (fail-closed) rather than dropping the filter.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::error::AppError;
use crate::models::task::{Task, TaskStatus, TASK_COLUMNS};
use crate::models::user::{Role, User};
use crate::normalize;

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

/// Query parameters accepted by `GET /tasks/search` and `GET /tasks/my`.
#[derive(Debug, Default, Deserialize)]
pub struct TaskFilter {
    /// Case-insensitive substring match over title, description and the id
    /// rendered as text.
    pub q: Option<String>,
    /// Raw status filter term, normalized before matching.
    pub status: Option<String>,
    /// When true, only tasks whose due date has passed and whose status is
    /// not terminal.
    pub overdue: Option<bool>,
    /// "me", a numeric id, or anything else (ignored).
    pub assignee: Option<String>,
    /// 1-indexed page number.
    pub page: Option<u32>,
    /// Page size, clamped to 1..=100.
    pub size: Option<u32>,
    /// Sort key with an optional leading '-' for descending order.
    pub sort: Option<String>,
}

/// Paginated response envelope. `total` counts all matching rows before the
/// page slice is applied.
#[derive(Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total: i64,
}

impl<T> Page<T> {
    fn empty(page: u32, size: u32) -> Self {
        Self {
            items: Vec::new(),
            page,
            size,
            total: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortKey {
    UpdatedAt,
    CreatedAt,
    DueDate,
    Priority,
}

/// Parses the sort parameter into a key and direction. Unknown keys silently
/// fall back to the default key; an absent parameter means updated_at
/// descending.
fn parse_sort(raw: Option<&str>) -> (SortKey, bool) {
    let raw = match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => raw,
        None => return (SortKey::UpdatedAt, true),
    };
    let (descending, key) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };
    let key = match key {
        "created_at" => SortKey::CreatedAt,
        "due_date" => SortKey::DueDate,
        "priority" => SortKey::Priority,
        _ => SortKey::UpdatedAt,
    };
    (key, descending)
}

fn order_clause(key: SortKey, descending: bool) -> String {
    let expr = match key {
        SortKey::UpdatedAt => "updated_at",
        SortKey::CreatedAt => "created_at",
        SortKey::DueDate => "due_date",
        // Rank priorities by severity rather than alphabetically.
        SortKey::Priority => {
            "CASE priority WHEN 'low' THEN 0 WHEN 'medium' THEN 1 \
             WHEN 'high' THEN 2 WHEN 'critical' THEN 3 END"
        }
    };
    let direction = if descending { "DESC" } else { "ASC" };
    // Stable id tiebreaker keeps pagination deterministic.
    format!("{} {}, id {}", expr, direction, direction)
}

/// Resolves the nominal assignee filter value: "me" means the caller, a
/// numeric string is a literal id, anything else leaves the query
/// unrestricted.
fn resolve_assignee(raw: Option<&str>, caller_id: i64) -> Option<i64> {
    match raw.map(str::trim) {
        Some("me") => Some(caller_id),
        Some(value) => value.parse::<i64>().ok(),
        None => None,
    }
}

/// The hard visibility boundary: principals who are neither admin nor manager
/// only ever see their own tasks, regardless of what the assignee parameter
/// asked for.
fn apply_visibility(nominal: Option<i64>, role: Role, caller_id: i64) -> Option<i64> {
    if role.sees_all_tasks() {
        nominal
    } else {
        Some(caller_id)
    }
}

/// Resolved filter dimensions shared by the count and the row query.
struct Predicates {
    q: Option<String>,
    status: Option<TaskStatus>,
    overdue: bool,
    assignee: Option<i64>,
}

fn push_predicates(builder: &mut QueryBuilder<Sqlite>, p: &Predicates) {
    builder.push(" WHERE 1 = 1");

    if let Some(q) = &p.q {
        let pattern = format!("%{}%", q);
        builder
            .push(" AND (title LIKE ")
            .push_bind(pattern.clone())
            .push(" OR description LIKE ")
            .push_bind(pattern.clone())
            .push(" OR CAST(id AS TEXT) LIKE ")
            .push_bind(pattern)
            .push(")");
    }

    if let Some(status) = p.status {
        builder.push(" AND status = ").push_bind(status);
    }

    if p.overdue {
        let today = Utc::now().date_naive();
        builder
            .push(" AND due_date IS NOT NULL AND due_date < ")
            .push_bind(today)
            .push(" AND status NOT IN (");
        {
            let mut terminal = builder.separated(", ");
            for status in TaskStatus::TERMINAL {
                terminal.push_bind(status);
            }
        }
        builder.push(")");
    }

    if let Some(assignee_id) = p.assignee {
        builder.push(" AND assignee_id = ").push_bind(assignee_id);
    }
}

/// Runs a filtered, sorted, paginated task query on behalf of `principal`.
pub async fn search_tasks(
    pool: &SqlitePool,
    principal: &User,
    filter: &TaskFilter,
) -> Result<Page<Task>, AppError> {
    let page = filter.page.unwrap_or(1).max(1);
    let size = filter.size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

    // Fail-closed: a supplied status term that fails normalization yields an
    // empty envelope. A blank term counts as the filter being omitted.
    let status = match filter.status.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => match normalize::normalize_status(raw) {
            Some(status) => Some(status),
            None => return Ok(Page::empty(page, size)),
        },
        _ => None,
    };

    let nominal = resolve_assignee(filter.assignee.as_deref(), principal.id);
    let assignee = apply_visibility(nominal, principal.role, principal.id);

    let predicates = Predicates {
        q: filter
            .q
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned),
        status,
        overdue: filter.overdue.unwrap_or(false),
        assignee,
    };

    let mut count_builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM tasks");
    push_predicates(&mut count_builder, &predicates);
    let total: i64 = count_builder
        .build_query_scalar()
        .fetch_one(pool)
        .await?;

    let (sort_key, descending) = parse_sort(filter.sort.as_deref());
    let offset = (page as i64 - 1) * size as i64;

    let mut builder =
        QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM tasks", TASK_COLUMNS));
    push_predicates(&mut builder, &predicates);
    builder
        .push(" ORDER BY ")
        .push(order_clause(sort_key, descending))
        .push(" LIMIT ")
        .push_bind(size as i64)
        .push(" OFFSET ")
        .push_bind(offset);

    let items = builder.build_query_as::<Task>().fetch_all(pool).await?;

    Ok(Page {
        items,
        page,
        size,
        total,
    })
}
