/// Admin endpoints
///
/// Mounted behind both the session middleware and the admin gate.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use axum_extra::extract::WithRejection;
use serde::Serialize;
use taskdeck_shared::{
    auth::middleware::AuthUser,
    models::{
        stats::AdminStats,
        user::{User, UserProfile},
    },
};
use tracing::info;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// `{"users", "tasks", "completedTasks"}` across the whole system
pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<AdminStats>> {
    Ok(Json(AdminStats::collect(&state.db).await?))
}

/// Every user, without password hashes, ordered by id
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<UserProfile>>> {
    Ok(Json(User::list_profiles(&state.db).await?))
}

/// Delete a user and all of their tasks
///
/// # Errors
///
/// - `400 Cannot delete yourself`
/// - `404 User not found`
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> ApiResult<Json<MessageResponse>> {
    if id == admin.id {
        return Err(ApiError::BadRequest("Cannot delete yourself".to_string()));
    }

    if !User::delete_with_tasks(&state.db, id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    info!(admin_id = admin.id, user_id = id, "Admin deleted user");
    Ok(Json(MessageResponse {
        message: "User and their tasks deleted",
    }))
}
