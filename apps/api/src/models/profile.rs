use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

/// Account approval state stored on the profile.
///
/// Only `NotAllowed` blocks dashboard features; the other values are labels
/// the admin surface uses to organise accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileStatus {
    NotAllowed,
    Pending,
    Active,
    Inactive,
    Admin,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown profile status '{0}'")]
pub struct ParseProfileStatusError(pub String);

impl ProfileStatus {
    pub const ALL: [ProfileStatus; 5] = [
        ProfileStatus::NotAllowed,
        ProfileStatus::Pending,
        ProfileStatus::Active,
        ProfileStatus::Inactive,
        ProfileStatus::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileStatus::NotAllowed => "not_allowed",
            ProfileStatus::Pending => "pending",
            ProfileStatus::Active => "active",
            ProfileStatus::Inactive => "inactive",
            ProfileStatus::Admin => "admin",
        }
    }

    pub fn is_allowed(&self) -> bool {
        !matches!(self, ProfileStatus::NotAllowed)
    }
}

impl fmt::Display for ProfileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileStatus {
    type Err = ParseProfileStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProfileStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| ParseProfileStatusError(s.to_string()))
    }
}

impl TryFrom<String> for ProfileStatus {
    type Error = ParseProfileStatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One row of `profiles`.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub birthday: String,
    pub github: String,
    pub linkedin: String,
    pub website: String,
    pub education: String,
    pub skills: String,
    pub projects: String,
    pub experience: String,
    #[sqlx(try_from = "String")]
    pub status: ProfileStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
