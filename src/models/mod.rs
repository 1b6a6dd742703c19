pub mod task;
pub mod user;

pub use task::{Task, TaskCreate, TaskPriority, TaskStatus, TaskUpdate};
pub use user::{Role, User, UserCreate, UserUpdate};

/// Deserializes a field that distinguishes "absent" from "explicitly null".
///
/// A missing key stays `None` (via `#[serde(default)]`), `null` becomes
/// `Some(None)` and a value becomes `Some(Some(v))`. Used by the partial
/// update structs so a PATCH cannot accidentally clear a nullable field that
/// was simply left out of the payload.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}
