use std::collections::BTreeMap;

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::application::{ApplicationRow, ApplicationStatus, StatusEventRow};
use crate::models::zero_filled_counts;

const APPLICATION_COLUMNS: &str =
    "id, user_id, company, role, url, notes, status, applied_at, updated_at";

/// Validated input for a new application.
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub company: String,
    pub role: String,
    pub url: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ApplicationFilter {
    pub status: Option<ApplicationStatus>,
    pub search: Option<String>,
}

/// Escapes LIKE wildcards so the search term matches literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

pub async fn list_applications(
    pool: &PgPool,
    user_id: Uuid,
    filter: &ApplicationFilter,
) -> Result<Vec<ApplicationRow>> {
    let sql = format!(
        r#"
        SELECT {APPLICATION_COLUMNS}
        FROM applications
        WHERE user_id = $1
          AND ($2::TEXT IS NULL OR status = $2)
          AND ($3::TEXT IS NULL OR company ILIKE $3 OR role ILIKE $3 OR url ILIKE $3)
        ORDER BY applied_at DESC
        "#
    );
    sqlx::query_as::<_, ApplicationRow>(&sql)
        .bind(user_id)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.search.as_deref().map(like_pattern))
        .fetch_all(pool)
        .await
        .context("list applications")
}

/// Inserts the application and its initial `applied` event atomically.
pub async fn create_application(
    pool: &PgPool,
    user_id: Uuid,
    new: &NewApplication,
) -> Result<ApplicationRow> {
    let mut tx = pool.begin().await.context("begin create transaction")?;

    let sql = format!(
        r#"
        INSERT INTO applications (user_id, company, role, url, notes, status)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {APPLICATION_COLUMNS}
        "#
    );
    let application = sqlx::query_as::<_, ApplicationRow>(&sql)
        .bind(user_id)
        .bind(&new.company)
        .bind(&new.role)
        .bind(&new.url)
        .bind(&new.notes)
        .bind(ApplicationStatus::Applied.as_str())
        .fetch_one(&mut *tx)
        .await
        .context("insert application")?;

    record_event(&mut tx, application.id, ApplicationStatus::Applied).await?;
    tx.commit().await.context("commit create transaction")?;
    Ok(application)
}

async fn record_event(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    application_id: Uuid,
    status: ApplicationStatus,
) -> Result<()> {
    sqlx::query("INSERT INTO application_status_events (application_id, status) VALUES ($1, $2)")
        .bind(application_id)
        .bind(status.as_str())
        .execute(&mut **tx)
        .await
        .context("insert status event")?;
    Ok(())
}

pub async fn get_application(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
) -> Result<Option<ApplicationRow>> {
    let sql = format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1 AND user_id = $2");
    sqlx::query_as::<_, ApplicationRow>(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("fetch application")
}

pub async fn status_history(pool: &PgPool, application_id: Uuid) -> Result<Vec<StatusEventRow>> {
    sqlx::query_as::<_, StatusEventRow>(
        r#"
        SELECT status, changed_at
        FROM application_status_events
        WHERE application_id = $1
        ORDER BY changed_at ASC, id ASC
        "#,
    )
    .bind(application_id)
    .fetch_all(pool)
    .await
    .context("fetch status history")
}

/// Moves an application to `status` and records the change.
/// Returns `None` when the application is absent or not owned by the user.
/// Setting the current status again changes nothing.
pub async fn update_status(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
    status: ApplicationStatus,
) -> Result<Option<ApplicationRow>> {
    let mut tx = pool.begin().await.context("begin status transaction")?;

    let sql = format!(
        "SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1 AND user_id = $2 FOR UPDATE"
    );
    let Some(current) = sqlx::query_as::<_, ApplicationRow>(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .context("lock application")?
    else {
        return Ok(None);
    };

    if current.status == status {
        return Ok(Some(current));
    }

    let sql = format!(
        "UPDATE applications SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {APPLICATION_COLUMNS}"
    );
    let updated = sqlx::query_as::<_, ApplicationRow>(&sql)
        .bind(id)
        .bind(status.as_str())
        .fetch_one(&mut *tx)
        .await
        .context("update application status")?;

    record_event(&mut tx, id, status).await?;
    tx.commit().await.context("commit status transaction")?;
    Ok(Some(updated))
}

/// Returns whether a row was deleted. Events go with it via `ON DELETE CASCADE`.
pub async fn delete_application(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM applications WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await
        .context("delete application")?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_by_status(pool: &PgPool, user_id: Uuid) -> Result<BTreeMap<String, i64>> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT status, COUNT(*) FROM applications WHERE user_id = $1 GROUP BY status",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("count applications by status")?;

    Ok(zero_filled_counts(
        ApplicationStatus::ALL.iter().map(|s| s.as_str()),
        rows,
    ))
}
