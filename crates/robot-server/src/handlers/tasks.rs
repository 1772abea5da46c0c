//! Task handlers.

use crate::auth::Claims;
use crate::models::{TasksResponse, User};
use axum::{Extension, Json};

/// Handler for GET /tasks
///
/// Returns the caller's tasks. Requires authentication; claims are injected
/// by the auth middleware. No task storage exists, so the list is empty.
#[tracing::instrument(skip_all, name = "robot.tasks.list")]
pub async fn list_tasks(Extension(claims): Extension<Claims>) -> Json<TasksResponse> {
    let user = User::from_claims(&claims);

    tracing::debug!(target: "robot.handlers.tasks", has_email = user.email.is_some(), "Listing tasks");

    Json(TasksResponse {
        sub: user.id,
        tasks: Vec::new(),
    })
}
