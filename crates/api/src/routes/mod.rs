pub mod auth;
pub mod health;
pub mod project;
pub mod task;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /auth/signup                public
/// /auth/login                 public
/// /auth/logout
/// /auth/me
///
/// /projects                   list, create
/// /projects/{id}              patch, delete
///
/// /tasks                      list (filterable, paginated), create
/// /tasks/{id}                 get, patch, delete
/// /tasks/{id}/complete        set completion timestamp
/// /tasks/{id}/incomplete      clear completion timestamp
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/projects", project::router())
        .nest("/tasks", task::router())
}
