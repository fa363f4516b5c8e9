//! Handlers for the `/tasks` resource.
//!
//! Listing goes through the query translator in `taskdeck_core::query`:
//! filter parameters become a typed predicate plus page bounds, and the
//! repository executes the page and count reads over that predicate.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use taskdeck_core::error::CoreError;
use taskdeck_core::query::{translate, TaskListParams};
use taskdeck_core::types::{DbId, Timestamp};
use taskdeck_db::models::task::{CreateTask, Task, TaskPage, UpdateTask};
use taskdeck_db::repositories::{ProjectRepo, TaskRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// GET /api/tasks
///
/// Filterable, paginated task listing.
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<TaskListParams>,
) -> AppResult<Json<TaskPage>> {
    let (predicate, bounds) = translate(
        auth.user_id,
        &params,
        Utc::now(),
        state.config.timezone,
        &state.config.enabled_filters,
    )?;

    let (items, total) = TaskRepo::list(&state.pool, &predicate, bounds).await?;

    Ok(Json(TaskPage {
        items,
        total,
        page: bounds.page,
        page_size: bounds.page_size,
    }))
}

/// POST /api/tasks
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(mut input): Json<CreateTask>,
) -> AppResult<(StatusCode, Json<Task>)> {
    input.title = input.title.trim().to_string();
    if input.title.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Task title must not be empty".into(),
        )));
    }

    if let Some(project_id) = input.project_id {
        ensure_active_project(&state, auth.user_id, project_id).await?;
    }

    let task = TaskRepo::create(&state.pool, auth.user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// GET /api/tasks/{id}
pub async fn get_by_id(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Task>> {
    let task = TaskRepo::find_by_id(&state.pool, id, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Task", id }))?;
    Ok(Json(task))
}

/// PATCH /api/tasks/{id}
pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateTask>,
) -> AppResult<Json<Task>> {
    if let Some(title) = &mut input.title {
        *title = title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::Core(CoreError::Validation(
                "Task title must not be empty".into(),
            )));
        }
    }

    if let Some(project_id) = input.project_id {
        ensure_active_project(&state, auth.user_id, project_id).await?;
    }

    let task = TaskRepo::update(&state.pool, id, auth.user_id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Task", id }))?;

    Ok(Json(task))
}

/// POST /api/tasks/{id}/complete
pub async fn complete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Task>> {
    set_completion(&state, id, auth.user_id, Some(Utc::now())).await
}

/// POST /api/tasks/{id}/incomplete
pub async fn incomplete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Task>> {
    set_completion(&state, id, auth.user_id, None).await
}

/// DELETE /api/tasks/{id}
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let deleted = TaskRepo::delete(&state.pool, id, auth.user_id).await?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound { entity: "Task", id }))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Set or clear the completion timestamp; nothing else changes.
async fn set_completion(
    state: &AppState,
    id: DbId,
    owner_id: DbId,
    completed_at: Option<Timestamp>,
) -> AppResult<Json<Task>> {
    let task = TaskRepo::set_completion(&state.pool, id, owner_id, completed_at)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Task", id }))?;
    Ok(Json(task))
}

/// Reject a task's project reference unless it names an active
/// (non-archived) project owned by the same user.
async fn ensure_active_project(
    state: &AppState,
    owner_id: DbId,
    project_id: DbId,
) -> AppResult<()> {
    let ok = ProjectRepo::exists_active(&state.pool, project_id, owner_id).await?;
    if ok {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Validation(
            "Invalid projectId".into(),
        )))
    }
}
