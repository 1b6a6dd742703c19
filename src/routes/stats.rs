//! Aggregation reporter: read-only dashboard counts over the task table.
//!
//! Statuses are read back as raw strings and folded into a fixed set of
//! dashboard buckets, so legacy display labels that may still sit in older
//! rows are counted robustly; anything unknown folds into "todo".

use crate::{auth::CurrentUser, error::AppError};
use actix_web::{get, web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use std::collections::BTreeMap;

/// Per-status dashboard counts plus a grand total.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct DashCounts {
    pub todo: i64,
    pub in_progress: i64,
    pub over_due: i64,
    pub completed: i64,
    pub approved: i64,
    pub rejected: i64,
    pub resubmission: i64,
    pub total: i64,
}

impl DashCounts {
    fn add(&mut self, raw_status: &str, count: i64) {
        match fold_bucket(raw_status) {
            "in_progress" => self.in_progress += count,
            "over_due" => self.over_due += count,
            "completed" => self.completed += count,
            "approved" => self.approved += count,
            "rejected" => self.rejected += count,
            "resubmission" => self.resubmission += count,
            _ => self.todo += count,
        }
        self.total += count;
    }
}

/// Counts for a single assignee; a null assignee groups the unassigned tasks.
#[derive(Debug, Serialize, Deserialize)]
pub struct AssigneeCounts {
    pub assignee_id: Option<i64>,
    pub counts: DashCounts,
}

/// Folds an arbitrary stored status string into a dashboard bucket.
/// Unknown values land in "todo" as a safety default.
fn fold_bucket(raw: &str) -> &'static str {
    let squashed: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .collect::<String>()
        .to_lowercase();
    match squashed.as_str() {
        "inprogress" | "progress" => "in_progress",
        "overdue" | "pastdue" => "over_due",
        "completed" | "done" | "complete" => "completed",
        "approved" | "approve" => "approved",
        "rejected" | "reject" => "rejected",
        "resubmission" | "resubmit" | "resubmitted" => "resubmission",
        _ => "todo",
    }
}

#[get("/ping")]
pub async fn ping() -> impl Responder {
    HttpResponse::Ok().json(json!({ "ok": true }))
}

/// Team-wide counts per dashboard bucket.
#[get("/team")]
pub async fn team_counts(
    pool: web::Data<SqlitePool>,
    _principal: CurrentUser,
) -> Result<impl Responder, AppError> {
    let rows: Vec<(String, i64)> =
        sqlx::query_as("SELECT status, COUNT(*) FROM tasks GROUP BY status")
            .fetch_all(&**pool)
            .await?;

    let mut counts = DashCounts::default();
    for (raw_status, count) in rows {
        counts.add(&raw_status, count);
    }

    Ok(HttpResponse::Ok().json(counts))
}

/// Per-assignee counts, sorted by total descending.
#[get("/users")]
pub async fn per_assignee_counts(
    pool: web::Data<SqlitePool>,
    _principal: CurrentUser,
) -> Result<impl Responder, AppError> {
    let rows: Vec<(Option<i64>, String, i64)> = sqlx::query_as(
        "SELECT assignee_id, status, COUNT(*) FROM tasks GROUP BY assignee_id, status",
    )
    .fetch_all(&**pool)
    .await?;

    let mut per: BTreeMap<Option<i64>, DashCounts> = BTreeMap::new();
    for (assignee_id, raw_status, count) in rows {
        per.entry(assignee_id)
            .or_default()
            .add(&raw_status, count);
    }

    let mut out: Vec<AssigneeCounts> = per
        .into_iter()
        .map(|(assignee_id, counts)| AssigneeCounts {
            assignee_id,
            counts,
        })
        .collect();
    out.sort_by(|a, b| b.counts.total.cmp(&a.counts.total));

    Ok(HttpResponse::Ok().json(out))
}
