use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::repo::{list_users, set_user_status, user_stats, UserStats, UserWithProfile};
use crate::auth::extractors::AdminUser;
use crate::auth::session::revoke_all_user_sessions;
use crate::errors::AppError;
use crate::extract::{AppJson, AppPath};
use crate::models::profile::{ParseProfileStatusError, ProfileRow, ProfileStatus};
use crate::state::AppState;

#[derive(Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserWithProfile>,
}

#[derive(Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

#[derive(Serialize)]
pub struct StatusUpdateResponse {
    pub data: ProfileRow,
}

/// GET /api/users
pub async fn handle_list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<UserListResponse>, AppError> {
    let users = list_users(&state.db).await?;
    Ok(Json(UserListResponse { users }))
}

/// PUT /api/users/:id
///
/// Revoking approval also ends every session the user holds.
pub async fn handle_update_user_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    AppPath(user_id): AppPath<Uuid>,
    AppJson(req): AppJson<StatusUpdateRequest>,
) -> Result<Json<StatusUpdateResponse>, AppError> {
    let status: ProfileStatus = req
        .status
        .parse()
        .map_err(|e: ParseProfileStatusError| AppError::Validation(e.to_string()))?;

    let profile = set_user_status(&state.db, user_id, status)
        .await?
        .ok_or_else(|| AppError::NotFound("User profile not found".into()))?;

    info!(admin = %admin.email, %user_id, %status, "user status changed");

    if status == ProfileStatus::NotAllowed {
        revoke_all_user_sessions(&state.db, user_id).await?;
    }

    Ok(Json(StatusUpdateResponse { data: profile }))
}

/// GET /api/users/stats
pub async fn handle_user_stats(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<UserStats>, AppError> {
    Ok(Json(user_stats(&state.db).await?))
}
