mod applications;
mod auth;
mod config;
mod db;
mod errors;
mod extract;
mod generation;
mod llm_client;
mod models;
mod profile;
mod routes;
mod state;
mod users;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::oauth::GoogleProvider;
use crate::auth::sweeper::spawn_session_sweeper;
use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::llm_client::OpenAiClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ApplyFlow API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    run_migrations(&db).await?;

    let llm = OpenAiClient::new(config.openai_api_key.clone(), config.openai_base_url.clone())?;
    info!(
        resume_model = %config.resume_model,
        interview_model = %config.interview_model,
        "LLM client initialized"
    );

    let identity = GoogleProvider::new(&config)?;
    info!(redirect = %config.oauth_redirect_url(), "Google sign-in configured");

    spawn_session_sweeper(
        db.clone(),
        Duration::from_secs(config.session_cleanup_interval_secs),
    );

    let cors = build_cors(&config)?;

    let state = AppState {
        db,
        llm: Arc::new(llm),
        identity: Arc::new(identity),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// The browser app lives at `PUBLIC_URL` and sends the session cookie, so
/// CORS allows exactly that origin with credentials.
fn build_cors(config: &Config) -> Result<CorsLayer> {
    let origin = HeaderValue::from_str(&config.public_url)
        .with_context(|| format!("PUBLIC_URL is not a valid origin: '{}'", config.public_url))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]))
}
