//! Router tests against a migrated Postgres database.
//!
//! Each `#[sqlx::test]` gets a fresh database with `./migrations` applied
//! (set `DATABASE_URL` to a server the tests may create databases on).
//! Requests carry real session cookies minted through the session store.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use super::build_router;
use crate::auth::oauth::testing::FakeIdentityProvider;
use crate::auth::oauth::ProviderUser;
use crate::auth::session::{cleanup_expired_sessions, create_session, get_session};
use crate::config::Config;
use crate::generation::generator::fixtures::valid_reply;
use crate::llm_client::testing::FakeLanguageModel;
use crate::models::profile::ProfileStatus;
use crate::state::AppState;
use crate::users::repo::upsert_from_provider;

fn state_for(pool: PgPool) -> AppState {
    AppState {
        db: pool,
        llm: Arc::new(FakeLanguageModel::replying(valid_reply().to_string())),
        identity: Arc::new(FakeIdentityProvider::new()),
        config: Config::for_tests(),
    }
}

fn identity(email: &str) -> ProviderUser {
    ProviderUser {
        email: email.into(),
        name: Some("Jordan".into()),
        picture: None,
    }
}

/// Registers `email` with `status` (on first sign-in) and opens a session.
async fn signed_in(pool: &PgPool, email: &str, status: ProfileStatus) -> (Uuid, String) {
    let (user, _) = upsert_from_provider(pool, &identity(email), status)
        .await
        .unwrap();
    let token = create_session(pool, user.id, 30).await.unwrap();
    (user.id, token)
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("session-token={token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(state: &AppState, request: Request<Body>) -> Response {
    build_router(state.clone()).oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok().map(String::from))
        .collect()
}

async fn count(pool: &PgPool, sql: &str, id: Uuid) -> i64 {
    sqlx::query_scalar(sql).bind(id).fetch_one(pool).await.unwrap()
}

fn callback_request() -> Request<Body> {
    Request::builder()
        .uri("/api/auth/callback/google?code=auth-code&state=fixed-state")
        .header(header::COOKIE, "oauth_state=fixed-state")
        .body(Body::empty())
        .unwrap()
}

// Sessions

#[sqlx::test(migrations = "./migrations")]
async fn test_me_with_valid_session(pool: PgPool) {
    let (user_id, token) = signed_in(&pool, "jordan@example.com", ProfileStatus::Active).await;
    let state = state_for(pool);

    let response = send(&state, request(Method::GET, "/api/auth/me", Some(&token), None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["user"]["id"], user_id.to_string());
    assert_eq!(body["user"]["email"], "jordan@example.com");
    assert_eq!(body["user"]["name"], "Jordan");
    assert_eq!(body["user"]["status"], "active");
    assert_eq!(body["user"]["isAdmin"], false);
    assert!(body["expires"].is_string());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_unknown_token_is_401(pool: PgPool) {
    let state = state_for(pool);
    let response = send(
        &state,
        request(Method::GET, "/api/auth/me", Some("not-a-session"), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "Not authenticated");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_expired_sessions_are_ignored_and_swept(pool: PgPool) {
    let (user_id, _) = signed_in(&pool, "jordan@example.com", ProfileStatus::Active).await;
    sqlx::query(
        "INSERT INTO sessions (user_id, session_token, expires) VALUES ($1, 'stale', NOW() - INTERVAL '1 day')",
    )
    .bind(user_id)
    .execute(&pool)
    .await
    .unwrap();

    let config = Config::for_tests();
    assert!(get_session(&pool, "stale", &config).await.unwrap().is_none());
    assert_eq!(cleanup_expired_sessions(&pool).await.unwrap(), 1);
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM sessions WHERE user_id = $1", user_id).await,
        1
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_logout_deletes_session(pool: PgPool) {
    let (user_id, token) = signed_in(&pool, "jordan@example.com", ProfileStatus::Active).await;
    let state = state_for(pool.clone());

    let response = send(&state, request(Method::POST, "/api/auth/logout", Some(&token), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response)
        .iter()
        .any(|c| c.starts_with("session-token=;") && c.contains("Max-Age=0")));
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM sessions WHERE user_id = $1", user_id).await,
        0
    );

    let response = send(&state, request(Method::GET, "/api/auth/me", Some(&token), None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_logout_all_revokes_every_session(pool: PgPool) {
    let (user_id, token) = signed_in(&pool, "jordan@example.com", ProfileStatus::Active).await;
    create_session(&pool, user_id, 30).await.unwrap();
    let (other_id, _) = signed_in(&pool, "sam@example.com", ProfileStatus::Active).await;
    let state = state_for(pool.clone());

    let response = send(&state, request(Method::GET, "/api/auth/sessions", Some(&token), None)).await;
    assert_eq!(json_body(response).await["active"], 2);

    let response = send(
        &state,
        request(Method::POST, "/api/auth/logout-all", Some(&token), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "success": true, "revoked": 2 }));
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM sessions WHERE user_id = $1", user_id).await,
        0
    );
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM sessions WHERE user_id = $1", other_id).await,
        1
    );
}

// Sign-in callback

#[sqlx::test(migrations = "./migrations")]
async fn test_callback_new_user_is_not_allowed(pool: PgPool) {
    let state = state_for(pool.clone());

    let response = send(&state, callback_request()).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "http://localhost:3000/not_allowed");
    assert!(!set_cookies(&response)
        .iter()
        .any(|c| c.starts_with("session-token=")));

    let (name, email, status): (String, String, String) = sqlx::query_as(
        "SELECT p.name, p.email, p.status FROM profiles p JOIN users u ON u.id = p.user_id WHERE u.email = 'jordan@example.com'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(
        (name.as_str(), email.as_str(), status.as_str()),
        ("Jordan", "jordan@example.com", "not_allowed")
    );
    let sessions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(sessions, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_callback_active_user_gets_session_cookie(pool: PgPool) {
    let (user_id, _) = signed_in(&pool, "jordan@example.com", ProfileStatus::Active).await;
    let state = state_for(pool.clone());

    let response = send(&state, callback_request()).await;
    assert_eq!(location(&response), "http://localhost:3000/dashboard");

    let cookies = set_cookies(&response);
    let session = cookies
        .iter()
        .find(|c| c.starts_with("session-token="))
        .expect("session cookie set");
    for attribute in ["HttpOnly", "SameSite=Lax", "Path=/", "Max-Age=2592000"] {
        assert!(session.contains(attribute), "{session} lacks {attribute}");
    }
    assert!(cookies.iter().any(|c| c.starts_with("oauth_state=;")));
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM sessions WHERE user_id = $1", user_id).await,
        2
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_callback_admin_email_signs_in_on_first_login(pool: PgPool) {
    let mut state = state_for(pool.clone());
    state.identity = Arc::new(FakeIdentityProvider {
        state: "fixed-state".into(),
        user: Some(identity("Admin@Example.com")),
    });

    let response = send(&state, callback_request()).await;
    assert_eq!(location(&response), "http://localhost:3000/dashboard");

    let status: String = sqlx::query_scalar(
        "SELECT p.status FROM profiles p JOIN users u ON u.id = p.user_id WHERE u.email = 'admin@example.com'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(status, "admin");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_callback_failed_exchange_redirects(pool: PgPool) {
    let mut state = state_for(pool);
    state.identity = Arc::new(FakeIdentityProvider {
        state: "fixed-state".into(),
        user: None,
    });

    let response = send(&state, callback_request()).await;
    assert_eq!(
        location(&response),
        "http://localhost:3000/signin?error=callback_error"
    );
}

// Profile

#[sqlx::test(migrations = "./migrations")]
async fn test_profile_upsert_is_idempotent(pool: PgPool) {
    let user_id: Uuid = sqlx::query_scalar(
        "INSERT INTO users (email, name) VALUES ('new@example.com', 'New') RETURNING id",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    let token = create_session(&pool, user_id, 30).await.unwrap();
    let state = state_for(pool.clone());

    let response = send(&state, request(Method::GET, "/api/profile", Some(&token), None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    for name in ["Jordan Lee", "J. Lee"] {
        let body = json!({ "name": format!("  {name} "), "email": "jordan@example.com", "skills": "Rust" });
        let response = send(&state, request(Method::PUT, "/api/profile", Some(&token), Some(body))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["data"]["name"], name);
    }

    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM profiles WHERE user_id = $1", user_id).await,
        1
    );
    let response = send(&state, request(Method::GET, "/api/profile", Some(&token), None)).await;
    let body = json_body(response).await;
    assert_eq!(body["data"]["skills"], "Rust");
    assert_eq!(body["data"]["status"], "not_allowed");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_profile_rejects_bad_input_with_json_errors(pool: PgPool) {
    let (_, token) = signed_in(&pool, "jordan@example.com", ProfileStatus::NotAllowed).await;
    let state = state_for(pool);

    let malformed = Request::builder()
        .method(Method::PUT)
        .uri("/api/profile")
        .header(header::COOKIE, format!("session-token={token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("not json"))
        .unwrap();
    let response = send(&state, malformed).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"].is_string());

    let response = send(
        &state,
        request(Method::PUT, "/api/profile", Some(&token), Some(json!({ "name": null }))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"].is_string());

    let response = send(
        &state,
        request(Method::PUT, "/api/profile", Some(&token), Some(json!({ "email": "nope" }))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// Approval gates and admin

#[sqlx::test(migrations = "./migrations")]
async fn test_unapproved_user_is_forbidden_from_generation(pool: PgPool) {
    let (_, token) = signed_in(&pool, "jordan@example.com", ProfileStatus::NotAllowed).await;
    let state = state_for(pool);

    let body = json!({ "jobDescription": "Rust engineer" });
    let response = send(&state, request(Method::POST, "/api/resume", Some(&token), Some(body))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["error"], "Account is not approved");

    let response = send(&state, request(Method::GET, "/api/applications", Some(&token), None)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // profile editing stays open while awaiting approval
    let response = send(&state, request(Method::GET, "/api/profile", Some(&token), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_resume_generation_for_approved_user(pool: PgPool) {
    let (_, token) = signed_in(&pool, "jordan@example.com", ProfileStatus::Active).await;
    let state = state_for(pool);

    let body = json!({ "jobDescription": "Senior Rust engineer" });
    let response = send(&state, request(Method::POST, "/api/resume", Some(&token), Some(body))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["resume"]["email"], "jordan@example.com");
    assert_eq!(body["resume"]["title"], "Senior Backend Engineer");

    let response = send(
        &state,
        request(Method::POST, "/api/resume", Some(&token), Some(json!({ "jobDescription": " " }))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_admin_revoke_ends_user_sessions(pool: PgPool) {
    let (_, admin_token) = signed_in(&pool, "admin@example.com", ProfileStatus::Admin).await;
    let (user_id, user_token) = signed_in(&pool, "jordan@example.com", ProfileStatus::Active).await;
    sqlx::query("UPDATE profiles SET github = 'github.com/jlee', linkedin = 'linkedin.com/in/jlee' WHERE user_id = $1")
        .bind(user_id)
        .execute(&pool)
        .await
        .unwrap();
    let state = state_for(pool.clone());

    let response = send(&state, request(Method::GET, "/api/users", Some(&user_token), None)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&state, request(Method::GET, "/api/users", Some(&admin_token), None)).await;
    let body = json_body(response).await;
    let listed = body["users"]
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["email"] == "jordan@example.com")
        .cloned()
        .unwrap();
    assert_eq!(listed["status"], "active");
    assert_eq!(listed["hasProfile"], true);
    assert_eq!(listed["github"], "github.com/jlee");
    assert_eq!(listed["linkedin"], "linkedin.com/in/jlee");

    let uri = format!("/api/users/{user_id}");
    let response = send(
        &state,
        request(Method::PUT, &uri, Some(&admin_token), Some(json!({ "status": "not_allowed" }))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["data"]["status"], "not_allowed");

    let response = send(&state, request(Method::GET, "/api/auth/me", Some(&user_token), None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(&state, request(Method::GET, "/api/users/stats", Some(&admin_token), None)).await;
    let stats = json_body(response).await;
    assert_eq!(stats["totalUsers"], 2);
    assert_eq!(stats["usersByStatus"]["not_allowed"], 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_admin_status_update_rejects_bad_input(pool: PgPool) {
    let (_, admin_token) = signed_in(&pool, "admin@example.com", ProfileStatus::Admin).await;
    let state = state_for(pool);

    let response = send(
        &state,
        request(
            Method::PUT,
            "/api/users/not-a-uuid",
            Some(&admin_token),
            Some(json!({ "status": "active" })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"].is_string());

    let uri = format!("/api/users/{}", Uuid::new_v4());
    let response = send(
        &state,
        request(Method::PUT, &uri, Some(&admin_token), Some(json!({ "status": "superuser" }))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &state,
        request(Method::PUT, &uri, Some(&admin_token), Some(json!({ "status": "active" }))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// Applications

async fn log_application(state: &AppState, token: &str, body: Value) -> Value {
    let response = send(state, request(Method::POST, "/api/applications", Some(token), Some(body))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await
}

async fn set_status(state: &AppState, token: &str, id: &str, status: &str) -> StatusCode {
    let uri = format!("/api/applications/{id}/status");
    send(state, request(Method::PUT, &uri, Some(token), Some(json!({ "status": status }))))
        .await
        .status()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_status_update_records_history_once(pool: PgPool) {
    let (_, token) = signed_in(&pool, "jordan@example.com", ProfileStatus::Active).await;
    let state = state_for(pool.clone());

    let created = log_application(
        &state,
        &token,
        json!({ "url": "https://stripe.com/jobs/42", "role": "Backend Engineer" }),
    )
    .await;
    assert_eq!(created["company"], "Stripe");
    assert_eq!(created["status"], "applied");
    let id = created["id"].as_str().unwrap().to_string();
    let app_id: Uuid = id.parse().unwrap();
    let events = "SELECT COUNT(*) FROM application_status_events WHERE application_id = $1";

    assert_eq!(set_status(&state, &token, &id, "applied").await, StatusCode::OK);
    assert_eq!(count(&pool, events, app_id).await, 1);

    assert_eq!(set_status(&state, &token, &id, "tech").await, StatusCode::OK);
    assert_eq!(set_status(&state, &token, &id, "tech").await, StatusCode::OK);
    assert_eq!(count(&pool, events, app_id).await, 2);

    assert_eq!(set_status(&state, &token, &id, "hired").await, StatusCode::BAD_REQUEST);

    let response = send(
        &state,
        request(Method::GET, &format!("/api/applications/{id}"), Some(&token), None),
    )
    .await;
    let detail = json_body(response).await;
    assert_eq!(detail["status"], "tech");
    let history: Vec<&str> = detail["statusHistory"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["status"].as_str().unwrap())
        .collect();
    assert_eq!(history, ["applied", "tech"]);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_applications_are_scoped_to_owner(pool: PgPool) {
    let (_, owner) = signed_in(&pool, "jordan@example.com", ProfileStatus::Active).await;
    let (_, other) = signed_in(&pool, "sam@example.com", ProfileStatus::Active).await;
    let state = state_for(pool);

    let created = log_application(
        &state,
        &owner,
        json!({ "url": "https://jobs.netflix.com/1", "role": "SRE" }),
    )
    .await;
    let uri = format!("/api/applications/{}", created["id"].as_str().unwrap());

    let response = send(&state, request(Method::GET, &uri, Some(&other), None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = send(&state, request(Method::DELETE, &uri, Some(&other), None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&state, request(Method::DELETE, &uri, Some(&owner), None)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = send(&state, request(Method::DELETE, &uri, Some(&owner), None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(
        &state,
        request(Method::GET, "/api/applications/not-a-uuid", Some(&owner), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"].is_string());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_filters_and_stats(pool: PgPool) {
    let (_, token) = signed_in(&pool, "jordan@example.com", ProfileStatus::Active).await;
    let state = state_for(pool);

    log_application(
        &state,
        &token,
        json!({ "url": "https://stripe.com/jobs/1", "role": "Backend Engineer" }),
    )
    .await;
    let google = log_application(
        &state,
        &token,
        json!({ "url": "https://www.google.com/careers/2", "role": "SRE", "notes": "referral" }),
    )
    .await;
    let google_id = google["id"].as_str().unwrap();
    assert_eq!(set_status(&state, &token, google_id, "tech").await, StatusCode::OK);

    let list = |query: &'static str| {
        let state = state.clone();
        let token = token.clone();
        async move {
            let uri = format!("/api/applications{query}");
            let response = send(&state, request(Method::GET, &uri, Some(&token), None)).await;
            assert_eq!(response.status(), StatusCode::OK, "{query}");
            let body = json_body(response).await;
            body["applications"]
                .as_array()
                .unwrap()
                .iter()
                .map(|a| a["company"].as_str().unwrap().to_string())
                .collect::<Vec<_>>()
        }
    };

    assert_eq!(list("").await.len(), 2);
    assert_eq!(list("?status=all").await.len(), 2);
    assert_eq!(list("?status=tech").await, ["Google"]);
    assert_eq!(list("?q=STRIPE").await, ["Stripe"]);
    assert_eq!(list("?q=sre&status=tech").await, ["Google"]);
    assert_eq!(list("?q=sre&status=applied").await, Vec::<String>::new());
    assert_eq!(list("?q=%25").await, Vec::<String>::new());

    let response = send(
        &state,
        request(Method::GET, "/api/applications?status=hired", Some(&token), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &state,
        request(Method::GET, "/api/applications/stats", Some(&token), None),
    )
    .await;
    let stats = json_body(response).await;
    assert_eq!(stats["total"], 2);
    let stages = stats["stages"].as_array().unwrap();
    assert_eq!(stages.len(), 6);
    assert_eq!(stages[0], json!({ "status": "applied", "label": "Applied", "count": 1 }));
    assert_eq!(stages[1]["count"], 0);
    assert_eq!(stages[4]["status"], "tech");
    assert_eq!(stages[4]["count"], 1);
}
