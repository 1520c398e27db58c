use std::future::Future;
use std::time::Duration;

use sqlx::PgPool;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::session::cleanup_expired_sessions;

/// Starts the background task that purges expired sessions.
pub fn spawn_session_sweeper(pool: PgPool, every: Duration) -> JoinHandle<()> {
    info!(interval_secs = every.as_secs(), "session sweeper started");
    tokio::spawn(sweep_every(every, move || {
        let pool = pool.clone();
        async move { cleanup_expired_sessions(&pool).await }
    }))
}

/// Runs `sweep` on a fixed interval, forever. The first run is immediate.
/// A failed run is logged and the next tick proceeds as usual.
pub async fn sweep_every<F, Fut>(every: Duration, mut sweep: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<u64>>,
{
    let mut ticker = tokio::time::interval(every.max(Duration::from_secs(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match sweep().await {
            Ok(0) => debug!("no expired sessions"),
            Ok(deleted) => info!(deleted, "expired sessions removed"),
            Err(e) => warn!(error = %e, "session cleanup failed"),
        }
    }
}
