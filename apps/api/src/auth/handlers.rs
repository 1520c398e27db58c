use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::Redirect,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use super::cookies::{
    oauth_state_cookie, removal_cookie, session_cookie, OAUTH_STATE_COOKIE, SESSION_COOKIE,
};
use super::extractors::CurrentSession;
use super::session::{
    active_sessions_count, create_session, delete_session, revoke_all_user_sessions,
};
use crate::errors::AppError;
use crate::models::profile::ProfileStatus;
use crate::models::session::AuthSession;
use crate::state::AppState;
use crate::users::repo::upsert_from_provider;

#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Why a callback was turned away; rendered as `/signin?error=<code>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackFailure {
    OAuthError,
    MissingCode,
    InvalidState,
    CallbackError,
}

impl CallbackFailure {
    pub fn code(&self) -> &'static str {
        match self {
            CallbackFailure::OAuthError => "oauth_error",
            CallbackFailure::MissingCode => "missing_code",
            CallbackFailure::InvalidState => "invalid_state",
            CallbackFailure::CallbackError => "callback_error",
        }
    }
}

/// Checks the callback query against the state cookie and yields the
/// authorization code when the request is acceptable.
pub fn verify_callback(
    params: &CallbackParams,
    stored_state: Option<&str>,
) -> Result<String, CallbackFailure> {
    if let Some(err) = params.error.as_deref() {
        warn!(error = err, "provider reported an OAuth error");
        return Err(CallbackFailure::OAuthError);
    }
    let (Some(code), Some(state)) = (params.code.as_deref(), params.state.as_deref()) else {
        return Err(CallbackFailure::MissingCode);
    };
    match stored_state {
        Some(stored) if stored == state => Ok(code.to_string()),
        _ => Err(CallbackFailure::InvalidState),
    }
}

#[derive(Serialize)]
pub struct SessionCountResponse {
    pub active: i64,
}

/// GET /api/auth/google
pub async fn handle_google_login(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    let request = state.identity.authorize_url();
    let jar = jar.add(oauth_state_cookie(request.state, &state.config));
    (jar, Redirect::temporary(&request.url))
}

/// GET /api/auth/callback/google
pub async fn handle_google_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    params: Result<Query<CallbackParams>, QueryRejection>,
) -> (CookieJar, Redirect) {
    let public_url = state.config.public_url.clone();
    let fail = |jar: CookieJar, failure: CallbackFailure| {
        (
            jar,
            Redirect::temporary(&format!("{public_url}/signin?error={}", failure.code())),
        )
    };

    // A query string that does not parse still ends on the sign-in page.
    let params = match params {
        Ok(Query(params)) => params,
        Err(e) => {
            warn!(error = %e, "unreadable OAuth callback query");
            return fail(jar, CallbackFailure::CallbackError);
        }
    };

    let stored_state = jar.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string());
    let code = match verify_callback(&params, stored_state.as_deref()) {
        Ok(code) => code,
        Err(failure) => return fail(jar, failure),
    };

    match complete_sign_in(&state, &code).await {
        Ok(SignInOutcome::NotAllowed) => (
            jar.remove(removal_cookie(OAUTH_STATE_COOKIE)),
            Redirect::temporary(&format!("{public_url}/not_allowed")),
        ),
        Ok(SignInOutcome::SignedIn(token)) => {
            let jar = jar
                .add(session_cookie(token, &state.config))
                .remove(removal_cookie(OAUTH_STATE_COOKIE));
            (jar, Redirect::temporary(&format!("{public_url}/dashboard")))
        }
        Err(e) => {
            error!(error = %e, "OAuth callback failed");
            fail(jar, CallbackFailure::CallbackError)
        }
    }
}

enum SignInOutcome {
    NotAllowed,
    SignedIn(String),
}

async fn complete_sign_in(state: &AppState, code: &str) -> anyhow::Result<SignInOutcome> {
    let identity = state.identity.exchange(code).await?;

    let is_admin_email = state.config.is_admin_email(&identity.email);
    let initial_status = if is_admin_email {
        ProfileStatus::Admin
    } else {
        ProfileStatus::NotAllowed
    };
    let (user, status) = upsert_from_provider(&state.db, &identity, initial_status).await?;

    if !status.is_allowed() && !is_admin_email {
        info!(user_id = %user.id, "sign-in refused: account not approved");
        return Ok(SignInOutcome::NotAllowed);
    }

    let token = create_session(&state.db, user.id, state.config.session_ttl_days).await?;
    Ok(SignInOutcome::SignedIn(token))
}

/// GET /api/auth/me
pub async fn handle_me(CurrentSession(session): CurrentSession) -> Json<AuthSession> {
    Json(session)
}

/// POST /api/auth/logout
///
/// Always succeeds; an unknown or missing token just clears the cookie.
pub async fn handle_logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Value>), AppError> {
    if let Some(token) = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) {
        delete_session(&state.db, &token).await?;
    }
    Ok((
        jar.remove(removal_cookie(SESSION_COOKIE)),
        Json(json!({ "success": true })),
    ))
}

/// POST /api/auth/logout-all
pub async fn handle_logout_all(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Value>), AppError> {
    let revoked = revoke_all_user_sessions(&state.db, session.user.id).await?;
    Ok((
        jar.remove(removal_cookie(SESSION_COOKIE)),
        Json(json!({ "success": true, "revoked": revoked })),
    ))
}

/// GET /api/auth/sessions
pub async fn handle_session_count(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<SessionCountResponse>, AppError> {
    let active = active_sessions_count(&state.db, session.user.id).await?;
    Ok(Json(SessionCountResponse { active }))
}
