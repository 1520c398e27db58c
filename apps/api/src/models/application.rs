use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

/// Hiring pipeline stage of a tracked application, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Applied,
    Reply,
    Intro,
    Test,
    Tech,
    Back,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown application status '{0}'")]
pub struct ParseApplicationStatusError(pub String);

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 6] = [
        ApplicationStatus::Applied,
        ApplicationStatus::Reply,
        ApplicationStatus::Intro,
        ApplicationStatus::Test,
        ApplicationStatus::Tech,
        ApplicationStatus::Back,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::Reply => "reply",
            ApplicationStatus::Intro => "intro",
            ApplicationStatus::Test => "test",
            ApplicationStatus::Tech => "tech",
            ApplicationStatus::Back => "back",
        }
    }

    /// Human-readable label shown in tables and charts.
    pub fn label(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "Applied",
            ApplicationStatus::Reply => "Initial Reply",
            ApplicationStatus::Intro => "Intro Call",
            ApplicationStatus::Test => "Assessment",
            ApplicationStatus::Tech => "Technical Interview",
            ApplicationStatus::Back => "Final Round",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = ParseApplicationStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| ParseApplicationStatusError(s.to_string()))
    }
}

impl TryFrom<String> for ApplicationStatus {
    type Error = ParseApplicationStatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company: String,
    pub role: String,
    pub url: String,
    pub notes: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StatusEventRow {
    #[sqlx(try_from = "String")]
    pub status: ApplicationStatus,
    #[serde(rename = "date")]
    pub changed_at: DateTime<Utc>,
}
