pub mod health;

#[cfg(test)]
mod flows;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::applications::handlers as applications;
use crate::auth::handlers as auth;
use crate::generation::handlers as generation;
use crate::profile::handlers as profile;
use crate::state::AppState;
use crate::users::handlers as users;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/api/auth/google", get(auth::handle_google_login))
        .route(
            "/api/auth/callback/google",
            get(auth::handle_google_callback),
        )
        .route("/api/auth/me", get(auth::handle_me))
        .route("/api/auth/logout", post(auth::handle_logout))
        .route("/api/auth/logout-all", post(auth::handle_logout_all))
        .route("/api/auth/sessions", get(auth::handle_session_count))
        // Profile
        .route(
            "/api/profile",
            get(profile::handle_get_profile).put(profile::handle_update_profile),
        )
        // Admin
        .route("/api/users", get(users::handle_list_users))
        .route("/api/users/stats", get(users::handle_user_stats))
        .route("/api/users/:id", put(users::handle_update_user_status))
        // Application tracking
        .route(
            "/api/applications",
            get(applications::handle_list_applications)
                .post(applications::handle_create_application),
        )
        .route(
            "/api/applications/stats",
            get(applications::handle_application_stats),
        )
        .route(
            "/api/applications/:id",
            get(applications::handle_get_application)
                .delete(applications::handle_delete_application),
        )
        .route(
            "/api/applications/:id/status",
            put(applications::handle_update_status),
        )
        // Generation
        .route("/api/resume", post(generation::handle_generate_resume))
        .route("/api/interview", post(generation::handle_interview))
        .with_state(state)
}
