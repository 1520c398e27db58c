//! Server-side session store.
//!
//! A session is an opaque token in the `sessions` table with an expiry. It is
//! valid only while `expires > now()`; revocation deletes the row.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Config;
use crate::models::profile::ProfileStatus;
use crate::models::session::{AuthSession, SessionRow, SessionUser};

const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Random opaque token: a v4 UUID followed by the creation time in
/// milliseconds, base 36.
pub fn generate_session_token() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    format!("{}-{}", Uuid::new_v4(), to_base36(millis))
}

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36_DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

pub async fn create_session(pool: &PgPool, user_id: Uuid, ttl_days: i64) -> Result<String> {
    let token = generate_session_token();
    let expires = Utc::now() + Duration::days(ttl_days);

    sqlx::query("INSERT INTO sessions (user_id, session_token, expires) VALUES ($1, $2, $3)")
        .bind(user_id)
        .bind(&token)
        .bind(expires)
        .execute(pool)
        .await
        .context("insert session")?;

    info!(%user_id, %expires, "session created");
    Ok(token)
}

/// Looks up an unexpired session together with its user and profile status.
pub async fn get_session(pool: &PgPool, token: &str, config: &Config) -> Result<Option<AuthSession>> {
    let row = sqlx::query_as::<_, SessionRow>(
        r#"
        SELECT u.id AS user_id,
               u.email,
               u.name,
               u.image,
               COALESCE(p.status, 'not_allowed') AS status,
               s.expires
        FROM sessions s
        JOIN users u ON s.user_id = u.id
        LEFT JOIN profiles p ON p.user_id = u.id
        WHERE s.session_token = $1 AND s.expires > NOW()
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await
    .context("look up session")?;

    Ok(row.map(|row| to_auth_session(row, config)))
}

pub(crate) fn to_auth_session(row: SessionRow, config: &Config) -> AuthSession {
    let is_admin = config.is_admin_email(&row.email) || row.status == ProfileStatus::Admin;
    AuthSession {
        user: SessionUser {
            id: row.user_id,
            email: row.email,
            name: row.name,
            image: row.image,
            is_admin,
            status: row.status,
        },
        expires: row.expires,
    }
}

pub async fn delete_session(pool: &PgPool, token: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE session_token = $1")
        .bind(token)
        .execute(pool)
        .await
        .context("delete session")?;
    debug!(deleted = result.rows_affected(), "session deleted");
    Ok(result.rows_affected())
}

/// Deletes every session of a user, returning how many were removed.
pub async fn revoke_all_user_sessions(pool: &PgPool, user_id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await
        .context("revoke user sessions")?;
    info!(%user_id, revoked = result.rows_affected(), "revoked user sessions");
    Ok(result.rows_affected())
}

pub async fn cleanup_expired_sessions(pool: &PgPool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires < NOW()")
        .execute(pool)
        .await
        .context("delete expired sessions")?;
    Ok(result.rows_affected())
}

pub async fn active_sessions_count(pool: &PgPool, user_id: Uuid) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sessions WHERE user_id = $1 AND expires > NOW()",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
    .context("count active sessions")?;
    Ok(count)
}
