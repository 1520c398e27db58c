use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::oauth::IdentityProvider;
use crate::config::Config;
use crate::llm_client::LanguageModel;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Hosted model used for resume and interview generation.
    pub llm: Arc<dyn LanguageModel>,
    /// Google sign-in; swapped for a fake in tests.
    pub identity: Arc<dyn IdentityProvider>,
    pub config: Config,
}

#[cfg(test)]
impl AppState {
    /// State whose pool never connects. Only usable inside a tokio runtime.
    pub fn fake() -> Self {
        use crate::auth::oauth::testing::FakeIdentityProvider;
        use crate::llm_client::testing::FakeLanguageModel;

        let config = Config::for_tests();
        let db = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .expect("lazy pool ok");

        AppState {
            db,
            llm: Arc::new(FakeLanguageModel::replying("{}")),
            identity: Arc::new(FakeIdentityProvider::new()),
            config,
        }
    }
}
