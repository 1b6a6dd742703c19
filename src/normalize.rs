//! Status and priority normalization.
//!
//! Clients and older data sets present task status and priority as free-form
//! display labels ("To Do", "In Progress", "Re-Submission", "Normal"). These
//! functions map such labels onto the canonical enum members. They are total:
//! unrecognized or blank input yields `None`, meaning "not provided" -- callers
//! treat that as an omitted field or filter, never as an error and never as a
//! substitute default.

use crate::models::task::{TaskPriority, TaskStatus};

/// Lowercases and strips spaces, hyphens and underscores so that
/// "To Do", "to-do" and "TO_DO" all compare equal.
fn squash(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .collect::<String>()
        .to_lowercase()
}

/// Maps a raw status label onto its canonical value.
///
/// Canonical names pass through unchanged, so the function is idempotent.
pub fn normalize_status(raw: &str) -> Option<TaskStatus> {
    match squash(raw).as_str() {
        "todo" | "notstarted" => Some(TaskStatus::NotStarted),
        "inprogress" => Some(TaskStatus::InProgress),
        "completed" => Some(TaskStatus::Completed),
        "approved" => Some(TaskStatus::Approved),
        "rejected" => Some(TaskStatus::Rejected),
        "resubmit" | "resubmission" | "resubmitted" => Some(TaskStatus::Resubmit),
        _ => None,
    }
}

/// Maps a raw priority label onto its canonical value.
pub fn normalize_priority(raw: &str) -> Option<TaskPriority> {
    match squash(raw).as_str() {
        "low" => Some(TaskPriority::Low),
        "medium" | "normal" => Some(TaskPriority::Medium),
        "high" => Some(TaskPriority::High),
        "critical" => Some(TaskPriority::Critical),
        _ => None,
    }
}
