use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::profile::ProfileStatus;

/// Result of the session lookup join: sessions ⋈ users ⟕ profiles.
#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub user_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: ProfileStatus,
    pub expires: DateTime<Utc>,
}

/// The signed-in user as exposed to handlers and to `/api/auth/me`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub is_admin: bool,
    pub status: ProfileStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: SessionUser,
    pub expires: DateTime<Utc>,
}
