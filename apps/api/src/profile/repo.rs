use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use super::validation::ProfileInput;
use crate::models::profile::ProfileRow;

pub const PROFILE_COLUMNS: &str = "id, user_id, name, email, phone, location, birthday, github, \
     linkedin, website, education, skills, projects, experience, status, created_at, updated_at";

pub async fn get_profile(pool: &PgPool, user_id: Uuid) -> Result<Option<ProfileRow>> {
    let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = $1");
    sqlx::query_as::<_, ProfileRow>(&sql)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("fetch profile")
}

/// Inserts or replaces the editable fields of a user's profile.
/// `status` keeps its current value (or the column default on insert).
pub async fn upsert_profile(pool: &PgPool, user_id: Uuid, input: &ProfileInput) -> Result<ProfileRow> {
    let sql = format!(
        r#"
        INSERT INTO profiles (user_id, name, email, phone, location, birthday, github,
                              linkedin, website, education, skills, projects, experience)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        ON CONFLICT (user_id) DO UPDATE SET
            name = EXCLUDED.name,
            email = EXCLUDED.email,
            phone = EXCLUDED.phone,
            location = EXCLUDED.location,
            birthday = EXCLUDED.birthday,
            github = EXCLUDED.github,
            linkedin = EXCLUDED.linkedin,
            website = EXCLUDED.website,
            education = EXCLUDED.education,
            skills = EXCLUDED.skills,
            projects = EXCLUDED.projects,
            experience = EXCLUDED.experience,
            updated_at = NOW()
        RETURNING {PROFILE_COLUMNS}
        "#
    );

    sqlx::query_as::<_, ProfileRow>(&sql)
        .bind(user_id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.location)
        .bind(&input.birthday)
        .bind(&input.github)
        .bind(&input.linkedin)
        .bind(&input.website)
        .bind(&input.education)
        .bind(&input.skills)
        .bind(&input.projects)
        .bind(&input.experience)
        .fetch_one(pool)
        .await
        .context("upsert profile")
}
