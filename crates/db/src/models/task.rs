//! Task entity model and DTOs.

use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use taskdeck_core::query::{Priority, PriorityId};
use taskdeck_core::types::{DbId, Timestamp};

/// A task row from the `tasks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: DbId,
    pub user_id: DbId,
    pub project_id: Option<DbId>,
    pub title: String,
    pub notes: String,
    /// 1 = Low, 2 = Medium, 3 = High.
    pub priority: PriorityId,
    pub due_date: Option<Timestamp>,
    /// Null means incomplete; non-null records the completion time.
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new task.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTask {
    pub title: String,
    pub notes: Option<String>,
    pub project_id: Option<DbId>,
    pub priority: Option<Priority>,
    pub due_date: Option<Timestamp>,
}

/// DTO for partially updating a task.
///
/// `completed_at` uses the nested-Option pattern: an absent field keeps
/// the current value, an explicit `null` clears it, a timestamp sets it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTask {
    pub title: Option<String>,
    pub notes: Option<String>,
    pub project_id: Option<DbId>,
    pub priority: Option<Priority>,
    pub due_date: Option<Timestamp>,
    #[serde(default, deserialize_with = "double_option")]
    pub completed_at: Option<Option<Timestamp>>,
}

/// Distinguish "field absent" from "field: null" when deserializing a
/// nullable patch field.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// One page of tasks plus the full match count (`GET /tasks` response).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPage {
    pub items: Vec<Task>,
    /// Full predicate match count, independent of the page window.
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}
