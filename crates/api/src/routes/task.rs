//! Route definitions for the `/tasks` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::task;
use crate::state::AppState;

/// Routes mounted at `/tasks`.
///
/// ```text
/// GET    /                 -> list (filterable, paginated)
/// POST   /                 -> create
/// GET    /{id}             -> get_by_id
/// PATCH  /{id}             -> update
/// DELETE /{id}             -> delete
/// POST   /{id}/complete    -> complete
/// POST   /{id}/incomplete  -> incomplete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(task::list).post(task::create))
        .route(
            "/{id}",
            get(task::get_by_id)
                .patch(task::update)
                .delete(task::delete),
        )
        .route("/{id}/complete", post(task::complete))
        .route("/{id}/incomplete", post(task::incomplete))
}
