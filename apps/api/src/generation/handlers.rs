//! Axum route handlers for resume generation and interview practice.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::generator::{generate_resume, ResumeDocument};
use super::interview::{answer_question, InterviewRequest};
use crate::auth::extractors::ApprovedUser;
use crate::errors::AppError;
use crate::extract::AppJson;
use crate::profile::repo::get_profile;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRequest {
    #[serde(default)]
    pub job_description: String,
}

#[derive(Debug, Serialize)]
pub struct ResumeResponse {
    pub resume: ResumeDocument,
}

#[derive(Debug, Serialize)]
pub struct InterviewResponse {
    pub response: String,
}

/// POST /api/resume
pub async fn handle_generate_resume(
    State(state): State<AppState>,
    ApprovedUser(user): ApprovedUser,
    AppJson(req): AppJson<ResumeRequest>,
) -> Result<Json<ResumeResponse>, AppError> {
    let job_description = req.job_description.trim();
    if job_description.is_empty() {
        return Err(AppError::Validation("jobDescription is required".into()));
    }

    let profile = get_profile(&state.db, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".into()))?;

    let resume = generate_resume(
        state.llm.as_ref(),
        &state.config.resume_model,
        &profile,
        job_description,
    )
    .await?;

    Ok(Json(ResumeResponse { resume }))
}

/// POST /api/interview
pub async fn handle_interview(
    State(state): State<AppState>,
    ApprovedUser(_user): ApprovedUser,
    AppJson(req): AppJson<InterviewRequest>,
) -> Result<Json<InterviewResponse>, AppError> {
    if req.question.trim().is_empty() {
        return Err(AppError::Validation("question is required".into()));
    }

    let response =
        answer_question(state.llm.as_ref(), &state.config.interview_model, &req).await?;
    Ok(Json(InterviewResponse { response }))
}
