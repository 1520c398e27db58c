use axum::{extract::State, Json};
use serde::Serialize;
use tracing::info;

use super::repo::{get_profile, upsert_profile};
use super::validation::ProfileInput;
use crate::auth::extractors::CurrentSession;
use crate::errors::AppError;
use crate::extract::AppJson;
use crate::models::profile::ProfileRow;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ProfileResponse {
    pub data: ProfileRow,
}

/// GET /api/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = get_profile(&state.db, session.user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".into()))?;
    Ok(Json(ProfileResponse { data: profile }))
}

/// PUT /api/profile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    AppJson(input): AppJson<ProfileInput>,
) -> Result<Json<ProfileResponse>, AppError> {
    let input = input.normalize().map_err(AppError::Validation)?;
    let profile = upsert_profile(&state.db, session.user.id, &input).await?;
    info!(user_id = %session.user.id, "profile updated");
    Ok(Json(ProfileResponse { data: profile }))
}
