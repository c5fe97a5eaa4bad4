/// Task endpoints
///
/// Every handler runs behind the session middleware and acts only on the
/// caller's own tasks. A task that exists but belongs to someone else is
/// reported exactly like a missing one: `404 Task not found`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use taskdeck_shared::{
    auth::middleware::AuthUser,
    models::{
        task::{CreateTask, Task, TaskStatus, UpdateTask},
        task_query::{TaskPage, TaskQuery},
    },
};
use tracing::debug;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// Query string for `GET /api/tasks`
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// `todo`, `completed`, or `all`
    pub status: Option<String>,

    /// Case-insensitive substring of title or description
    pub search: Option<String>,

    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Omitted fields keep their stored value; an empty title counts as omitted
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
}

impl From<UpdateTaskRequest> for UpdateTask {
    fn from(req: UpdateTaskRequest) -> Self {
        UpdateTask {
            title: req
                .title
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            description: req.description,
            status: req.status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

fn not_found() -> ApiError {
    ApiError::NotFound("Task not found".to_string())
}

/// List the caller's tasks, newest first
///
/// ```text
/// GET /api/tasks?status=completed&search=report&page=2&limit=10
/// ```
///
/// # Errors
///
/// - `400`: unknown status, `page < 1`, or `limit` outside `1..=100`
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Query(params), _): WithRejection<Query<ListParams>, ApiError>,
) -> ApiResult<Json<TaskPage>> {
    let query = TaskQuery::from_params(
        user.id,
        params.status.as_deref(),
        params.search.as_deref(),
        params.page,
        params.limit,
    )?;

    Ok(Json(query.execute(&state.db).await?))
}

/// Create a task with status `todo`
///
/// # Errors
///
/// - `400 Title is required`: title missing or blank
pub async fn create_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(req), _): WithRejection<Json<CreateTaskRequest>, ApiError>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let title = req
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Title is required".to_string()))?;

    let task = Task::create(
        &state.db,
        CreateTask {
            user_id: user.id,
            title,
            description: req.description.unwrap_or_default(),
        },
    )
    .await?;

    debug!(task_id = task.id, user_id = user.id, "Task created");
    Ok((StatusCode::CREATED, Json(task)))
}

/// Partially update a task
pub async fn update_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateTaskRequest>, ApiError>,
) -> ApiResult<Json<Task>> {
    Task::update_owned(&state.db, id, user.id, req.into())
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

/// Flip a task between `todo` and `completed`
pub async fn toggle_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> ApiResult<Json<Task>> {
    Task::toggle_owned(&state.db, id, user.id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> ApiResult<Json<MessageResponse>> {
    if !Task::delete_owned(&state.db, id, user.id).await? {
        return Err(not_found());
    }

    debug!(task_id = id, user_id = user.id, "Task deleted");
    Ok(Json(MessageResponse {
        message: "Task deleted",
    }))
}
