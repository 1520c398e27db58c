use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use super::cookies::SESSION_COOKIE;
use super::session::get_session;
use crate::errors::AppError;
use crate::models::session::{AuthSession, SessionUser};
use crate::state::AppState;

/// A request carrying a live session cookie.
pub struct CurrentSession(pub AuthSession);

/// A signed-in user whose account is not `not_allowed`.
pub struct ApprovedUser(pub SessionUser);

/// A signed-in admin.
pub struct AdminUser(pub SessionUser);

/// Reads the raw session token from the request cookies, if any.
pub fn session_token(parts: &Parts) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(parts).ok_or(AppError::Unauthorized)?;

        match get_session(&state.db, &token, &state.config).await? {
            Some(session) => Ok(CurrentSession(session)),
            None => {
                debug!("session token unknown or expired");
                Err(AppError::Unauthorized)
            }
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for ApprovedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentSession(session) = CurrentSession::from_request_parts(parts, state).await?;
        require_approved(session.user).map(ApprovedUser)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentSession(session) = CurrentSession::from_request_parts(parts, state).await?;
        require_admin(session.user).map(AdminUser)
    }
}

// Admins pass even if their profile row still says not_allowed.
fn require_approved(user: SessionUser) -> Result<SessionUser, AppError> {
    if user.is_admin || user.status.is_allowed() {
        Ok(user)
    } else {
        Err(AppError::Forbidden("Account is not approved".into()))
    }
}

fn require_admin(user: SessionUser) -> Result<SessionUser, AppError> {
    if user.is_admin {
        Ok(user)
    } else {
        Err(AppError::Forbidden("Admin access required".into()))
    }
}
