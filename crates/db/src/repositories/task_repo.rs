//! Repository for the `tasks` table.
//!
//! `list` renders the typed predicate produced by
//! `taskdeck_core::query::translate` into a dynamic WHERE clause and runs
//! the page query and the count query concurrently over the same predicate.

use sqlx::PgPool;
use taskdeck_core::query::{CompletionClause, DueClause, PageBounds, Priority, TaskPredicate};
use taskdeck_core::types::{DbId, Timestamp};

use crate::models::task::{CreateTask, Task, UpdateTask};

/// Column list for `tasks` queries.
const COLUMNS: &str = "\
    id, user_id, project_id, title, notes, priority, \
    due_date, completed_at, created_at, updated_at";

/// Fixed listing order: incomplete before complete, then soonest due date
/// (absent due dates last), then highest priority, then newest first.
const ORDER_BY: &str = "ORDER BY \
    completed_at ASC NULLS FIRST, \
    due_date ASC NULLS LAST, \
    priority DESC, \
    created_at DESC";

/// CRUD and listing operations for tasks.
pub struct TaskRepo;

impl TaskRepo {
    /// Insert a new task owned by `owner_id`.
    ///
    /// The handler validates the title and the project reference first.
    pub async fn create(
        pool: &PgPool,
        owner_id: DbId,
        input: &CreateTask,
    ) -> Result<Task, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks (user_id, project_id, title, notes, priority, due_date) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(owner_id)
            .bind(input.project_id)
            .bind(&input.title)
            .bind(input.notes.as_deref().unwrap_or(""))
            .bind(input.priority.unwrap_or(Priority::Medium).id())
            .bind(input.due_date)
            .fetch_one(pool)
            .await
    }

    /// Find a task scoped by id and owner.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
        owner_id: DbId,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(pool)
            .await
    }

    /// Partially update a task scoped by id and owner.
    ///
    /// `completed_at` carries the provided/clear distinction: the outer
    /// Option decides whether the column changes at all, the inner value
    /// may be NULL to clear it.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        owner_id: DbId,
        input: &UpdateTask,
    ) -> Result<Option<Task>, sqlx::Error> {
        let completed_provided = input.completed_at.is_some();
        let completed_value: Option<Timestamp> = input.completed_at.flatten();

        let query = format!(
            "UPDATE tasks SET \
                 title        = COALESCE($3, title), \
                 notes        = COALESCE($4, notes), \
                 project_id   = COALESCE($5, project_id), \
                 priority     = COALESCE($6, priority), \
                 due_date     = COALESCE($7, due_date), \
                 completed_at = CASE WHEN $8 THEN $9 ELSE completed_at END, \
                 updated_at   = NOW() \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(owner_id)
            .bind(&input.title)
            .bind(&input.notes)
            .bind(input.project_id)
            .bind(input.priority.map(Priority::id))
            .bind(input.due_date)
            .bind(completed_provided)
            .bind(completed_value)
            .fetch_optional(pool)
            .await
    }

    /// Set or clear the completion timestamp and nothing else.
    pub async fn set_completion(
        pool: &PgPool,
        id: DbId,
        owner_id: DbId,
        completed_at: Option<Timestamp>,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks SET completed_at = $3, updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(owner_id)
            .bind(completed_at)
            .fetch_optional(pool)
            .await
    }

    /// Delete a task scoped by id and owner.
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId, owner_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Execute a translated predicate: one bounded page query plus one
    /// count query over the full predicate.
    ///
    /// Returns `(items, total)` where `total` is independent of the page
    /// window. Both reads run concurrently; a write landing between them
    /// can skew `total` against the page by a row, which is accepted.
    pub async fn list(
        pool: &PgPool,
        predicate: &TaskPredicate,
        bounds: PageBounds,
    ) -> Result<(Vec<Task>, i64), sqlx::Error> {
        // Build the WHERE clause and track the next bind parameter index.
        let mut conditions: Vec<String> = Vec::new();
        let mut bind_idx: u32 = 1;

        conditions.push(format!("user_id = ${bind_idx}"));
        bind_idx += 1;

        if predicate.project_id.is_some() {
            conditions.push(format!("project_id = ${bind_idx}"));
            bind_idx += 1;
        }

        match predicate.completion {
            Some(CompletionClause::Complete) => {
                conditions.push("completed_at IS NOT NULL".to_string());
            }
            Some(CompletionClause::Incomplete) => {
                conditions.push("completed_at IS NULL".to_string());
            }
            None => {}
        }

        match predicate.due {
            Some(DueClause::Within(_)) => {
                conditions.push(format!(
                    "due_date >= ${bind_idx} AND due_date <= ${}",
                    bind_idx + 1
                ));
                bind_idx += 2;
            }
            Some(DueClause::Before(_)) => {
                conditions.push(format!("due_date < ${bind_idx}"));
                bind_idx += 1;
            }
            Some(DueClause::AfterOrUnset(_)) => {
                conditions.push(format!("(due_date > ${bind_idx} OR due_date IS NULL)"));
                bind_idx += 1;
            }
            None => {}
        }

        if predicate.priority.is_some() {
            conditions.push(format!("priority = ${bind_idx}"));
            bind_idx += 1;
        }

        // One bind serves both branches of the search disjunction; the
        // group stays separate from any due-date disjunction above.
        let search_pattern = predicate.search.as_ref().map(|s| format!("%{s}%"));
        if search_pattern.is_some() {
            conditions.push(format!(
                "(title ILIKE ${bind_idx} ESCAPE '\\' OR notes ILIKE ${bind_idx} ESCAPE '\\')"
            ));
            bind_idx += 1;
        }

        let where_clause = format!("WHERE {}", conditions.join(" AND "));

        let page_sql = format!(
            "SELECT {COLUMNS} FROM tasks {where_clause} {ORDER_BY} \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1
        );
        let count_sql = format!("SELECT COUNT(*) FROM tasks {where_clause}");

        let mut page_query = sqlx::query_as::<_, Task>(&page_sql).bind(predicate.owner_id);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql).bind(predicate.owner_id);

        if let Some(project_id) = predicate.project_id {
            page_query = page_query.bind(project_id);
            count_query = count_query.bind(project_id);
        }
        match predicate.due {
            Some(DueClause::Within(window)) => {
                page_query = page_query.bind(window.start).bind(window.end);
                count_query = count_query.bind(window.start).bind(window.end);
            }
            Some(DueClause::Before(instant)) | Some(DueClause::AfterOrUnset(instant)) => {
                page_query = page_query.bind(instant);
                count_query = count_query.bind(instant);
            }
            None => {}
        }
        if let Some(priority) = predicate.priority {
            page_query = page_query.bind(priority);
            count_query = count_query.bind(priority);
        }
        if let Some(pattern) = &search_pattern {
            page_query = page_query.bind(pattern.as_str());
            count_query = count_query.bind(pattern.as_str());
        }
        page_query = page_query.bind(bounds.limit()).bind(bounds.offset());

        let (items, total) =
            tokio::try_join!(page_query.fetch_all(pool), count_query.fetch_one(pool))?;

        tracing::debug!(
            total,
            returned = items.len(),
            page = bounds.page,
            "task list query"
        );

        Ok((items, total))
    }
}
