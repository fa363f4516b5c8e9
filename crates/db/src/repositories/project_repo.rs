//! Repository for the `projects` table.
//!
//! Every operation is scoped by both id and owner id, so an ownership
//! mismatch is indistinguishable from a missing row.

use sqlx::PgPool;
use taskdeck_core::types::DbId;

use crate::models::project::{CreateProject, Project, UpdateProject};

/// Column list for `projects` queries.
const COLUMNS: &str = "id, user_id, name, color, archived, created_at, updated_at";

/// Default display color for projects created without one (neutral gray).
pub const DEFAULT_COLOR: &str = "#64748b";

/// CRUD operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Create a project for `owner_id`, defaulting the color when absent.
    pub async fn create(
        pool: &PgPool,
        owner_id: DbId,
        input: &CreateProject,
    ) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (user_id, name, color) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(owner_id)
            .bind(&input.name)
            .bind(input.color.as_deref().unwrap_or(DEFAULT_COLOR))
            .fetch_one(pool)
            .await
    }

    /// List the owner's projects, oldest first. Archived projects are
    /// excluded unless `include_archived` is set.
    pub async fn list(
        pool: &PgPool,
        owner_id: DbId,
        include_archived: bool,
    ) -> Result<Vec<Project>, sqlx::Error> {
        let query = if include_archived {
            format!("SELECT {COLUMNS} FROM projects WHERE user_id = $1 ORDER BY created_at ASC")
        } else {
            format!(
                "SELECT {COLUMNS} FROM projects \
                 WHERE user_id = $1 AND archived = FALSE \
                 ORDER BY created_at ASC"
            )
        };
        sqlx::query_as::<_, Project>(&query)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }

    /// Partially update a project scoped by id and owner.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        owner_id: DbId,
        input: &UpdateProject,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET \
                 name       = COALESCE($3, name), \
                 color      = COALESCE($4, color), \
                 archived   = COALESCE($5, archived), \
                 updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(owner_id)
            .bind(&input.name)
            .bind(&input.color)
            .bind(input.archived)
            .fetch_optional(pool)
            .await
    }

    /// Delete a project scoped by id and owner. Tasks keep their rows; the
    /// foreign key nulls their project reference.
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId, owner_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether an active (non-archived) project with this id exists for the
    /// owner. Consumed at task create/update time to validate references.
    pub async fn exists_active(
        pool: &PgPool,
        id: DbId,
        owner_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS( \
                 SELECT 1 FROM projects \
                 WHERE id = $1 AND user_id = $2 AND archived = FALSE \
             )",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_one(pool)
        .await?;
        Ok(exists.0)
    }
}
