use std::collections::BTreeMap;

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::company::derive_company;
use super::repo::{
    count_by_status, create_application, delete_application, get_application,
    list_applications, status_history, update_status, ApplicationFilter, NewApplication,
};
use crate::auth::extractors::ApprovedUser;
use crate::errors::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::models::application::{
    ApplicationRow, ApplicationStatus, ParseApplicationStatusError, StatusEventRow,
};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub q: Option<String>,
}

impl ListQuery {
    /// `status=all` (or absent) means every status; blank search is no search.
    pub fn into_filter(self) -> Result<ApplicationFilter, AppError> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(raw) => Some(parse_status(raw)?),
        };
        let search = self
            .q
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty());
        Ok(ApplicationFilter { status, search })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateApplicationRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub role: String,
    pub company: Option<String>,
    pub notes: Option<String>,
}

impl CreateApplicationRequest {
    pub fn validate(self) -> Result<NewApplication, AppError> {
        let url = self.url.trim().to_string();
        let role = self.role.trim().to_string();
        if url.is_empty() {
            return Err(AppError::Validation("url is required".into()));
        }
        if role.is_empty() {
            return Err(AppError::Validation("role is required".into()));
        }
        let company = self
            .company
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .or_else(|| derive_company(&url))
            .ok_or_else(|| AppError::Validation("company could not be derived from url".into()))?;
        let notes = self
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        Ok(NewApplication {
            company,
            role,
            url,
            notes,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Serialize)]
pub struct ApplicationListResponse {
    pub applications: Vec<ApplicationRow>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDetail {
    #[serde(flatten)]
    pub application: ApplicationRow,
    pub status_history: Vec<StatusEventRow>,
}

#[derive(Serialize)]
pub struct StageCount {
    pub status: ApplicationStatus,
    pub label: &'static str,
    pub count: i64,
}

#[derive(Serialize)]
pub struct ApplicationStatsResponse {
    pub total: i64,
    /// Every pipeline stage in order, including empty ones.
    pub stages: Vec<StageCount>,
}

fn stage_counts(counts: &BTreeMap<String, i64>) -> Vec<StageCount> {
    ApplicationStatus::ALL
        .into_iter()
        .map(|status| StageCount {
            status,
            label: status.label(),
            count: counts.get(status.as_str()).copied().unwrap_or(0),
        })
        .collect()
}

fn parse_status(raw: &str) -> Result<ApplicationStatus, AppError> {
    raw.parse()
        .map_err(|e: ParseApplicationStatusError| AppError::Validation(e.to_string()))
}

fn not_found() -> AppError {
    AppError::NotFound("Application not found".into())
}

/// GET /api/applications
pub async fn handle_list_applications(
    State(state): State<AppState>,
    ApprovedUser(user): ApprovedUser,
    AppQuery(query): AppQuery<ListQuery>,
) -> Result<Json<ApplicationListResponse>, AppError> {
    let filter = query.into_filter()?;
    let applications = list_applications(&state.db, user.id, &filter).await?;
    Ok(Json(ApplicationListResponse { applications }))
}

/// POST /api/applications
pub async fn handle_create_application(
    State(state): State<AppState>,
    ApprovedUser(user): ApprovedUser,
    AppJson(req): AppJson<CreateApplicationRequest>,
) -> Result<(StatusCode, Json<ApplicationRow>), AppError> {
    let new = req.validate()?;
    let application = create_application(&state.db, user.id, &new).await?;
    info!(user_id = %user.id, application_id = %application.id, company = %application.company, "application logged");
    Ok((StatusCode::CREATED, Json(application)))
}

/// GET /api/applications/:id
pub async fn handle_get_application(
    State(state): State<AppState>,
    ApprovedUser(user): ApprovedUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApplicationDetail>, AppError> {
    let application = get_application(&state.db, user.id, id)
        .await?
        .ok_or_else(not_found)?;
    let status_history = status_history(&state.db, application.id).await?;
    Ok(Json(ApplicationDetail {
        application,
        status_history,
    }))
}

/// PUT /api/applications/:id/status
pub async fn handle_update_status(
    State(state): State<AppState>,
    ApprovedUser(user): ApprovedUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<StatusRequest>,
) -> Result<Json<ApplicationRow>, AppError> {
    let status = parse_status(&req.status)?;
    let application = update_status(&state.db, user.id, id, status)
        .await?
        .ok_or_else(not_found)?;
    info!(application_id = %id, %status, "application status updated");
    Ok(Json(application))
}

/// DELETE /api/applications/:id
pub async fn handle_delete_application(
    State(state): State<AppState>,
    ApprovedUser(user): ApprovedUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, AppError> {
    if delete_application(&state.db, user.id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found())
    }
}

/// GET /api/applications/stats
pub async fn handle_application_stats(
    State(state): State<AppState>,
    ApprovedUser(user): ApprovedUser,
) -> Result<Json<ApplicationStatsResponse>, AppError> {
    let counts = count_by_status(&state.db, user.id).await?;
    Ok(Json(ApplicationStatsResponse {
        total: counts.values().sum(),
        stages: stage_counts(&counts),
    }))
}
