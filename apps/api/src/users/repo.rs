use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::auth::oauth::ProviderUser;
use crate::models::application::ApplicationStatus;
use crate::models::profile::{ProfileRow, ProfileStatus};
use crate::models::user::UserRow;
use crate::models::zero_filled_counts;
use crate::profile::repo::PROFILE_COLUMNS;

/// A user joined with the approval-relevant parts of their profile.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserWithProfile {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    #[sqlx(try_from = "String")]
    pub status: ProfileStatus,
    pub has_profile: bool,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub github: Option<String>,
    pub linkedin: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_users: i64,
    pub users_by_status: BTreeMap<String, i64>,
    pub total_applications: i64,
    pub applications_by_status: BTreeMap<String, i64>,
}

/// Signs in an identity returned by the provider: the user row is created
/// or refreshed by email, and on first login a profile is created holding
/// only the provider's name and email.
/// Returns the user and their current profile status.
pub async fn upsert_from_provider(
    pool: &PgPool,
    identity: &ProviderUser,
    initial_status: ProfileStatus,
) -> Result<(UserRow, ProfileStatus)> {
    let email = identity.email.trim().to_lowercase();
    let mut tx = pool.begin().await.context("begin sign-in transaction")?;

    let user = sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (email, name, image)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO UPDATE SET
            name = EXCLUDED.name,
            image = EXCLUDED.image,
            updated_at = NOW()
        RETURNING id, email, name, image, created_at, updated_at
        "#,
    )
    .bind(&email)
    .bind(&identity.name)
    .bind(&identity.picture)
    .fetch_one(&mut *tx)
    .await
    .context("upsert user")?;

    let created = sqlx::query(
        r#"
        INSERT INTO profiles (user_id, name, email, status)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind(user.id)
    .bind(identity.name.as_deref().unwrap_or_default())
    .bind(&email)
    .bind(initial_status.as_str())
    .execute(&mut *tx)
    .await
    .context("create profile")?
    .rows_affected()
        > 0;

    let status: String = sqlx::query_scalar("SELECT status FROM profiles WHERE user_id = $1")
        .bind(user.id)
        .fetch_one(&mut *tx)
        .await
        .context("read profile status")?;

    tx.commit().await.context("commit sign-in transaction")?;

    if created {
        info!(user_id = %user.id, status = %initial_status, "new user registered");
    }
    let status = status.parse::<ProfileStatus>()?;
    Ok((user, status))
}

pub async fn list_users(pool: &PgPool) -> Result<Vec<UserWithProfile>> {
    sqlx::query_as::<_, UserWithProfile>(
        r#"
        SELECT u.id,
               u.email,
               u.name,
               u.image,
               u.created_at,
               COALESCE(p.status, 'not_allowed') AS status,
               p.id IS NOT NULL AS has_profile,
               p.phone,
               p.location,
               p.github,
               p.linkedin
        FROM users u
        LEFT JOIN profiles p ON p.user_id = u.id
        ORDER BY u.created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await
    .context("list users")
}

/// Sets a user's approval status. `None` when the user has no profile.
pub async fn set_user_status(
    pool: &PgPool,
    user_id: Uuid,
    status: ProfileStatus,
) -> Result<Option<ProfileRow>> {
    let sql = format!(
        "UPDATE profiles SET status = $2, updated_at = NOW() WHERE user_id = $1 RETURNING {PROFILE_COLUMNS}"
    );
    sqlx::query_as::<_, ProfileRow>(&sql)
        .bind(user_id)
        .bind(status.as_str())
        .fetch_optional(pool)
        .await
        .context("update profile status")
}

pub async fn user_stats(pool: &PgPool) -> Result<UserStats> {
    let user_rows: Vec<(String, i64)> = sqlx::query_as(
        r#"
        SELECT COALESCE(p.status, 'not_allowed') AS status, COUNT(*)
        FROM users u
        LEFT JOIN profiles p ON p.user_id = u.id
        GROUP BY 1
        "#,
    )
    .fetch_all(pool)
    .await
    .context("count users by status")?;

    let application_rows: Vec<(String, i64)> =
        sqlx::query_as("SELECT status, COUNT(*) FROM applications GROUP BY status")
            .fetch_all(pool)
            .await
            .context("count applications by status")?;

    Ok(build_stats(user_rows, application_rows))
}

fn build_stats(user_rows: Vec<(String, i64)>, application_rows: Vec<(String, i64)>) -> UserStats {
    let users_by_status =
        zero_filled_counts(ProfileStatus::ALL.iter().map(|s| s.as_str()), user_rows);
    let applications_by_status = zero_filled_counts(
        ApplicationStatus::ALL.iter().map(|s| s.as_str()),
        application_rows,
    );
    UserStats {
        total_users: users_by_status.values().sum(),
        users_by_status,
        total_applications: applications_by_status.values().sum(),
        applications_by_status,
    }
}
