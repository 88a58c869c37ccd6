//! Problem model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Problem database model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Problem {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub time_limit_ms: i32,
    pub memory_limit_mb: i32,
    pub difficulty: Difficulty,
    pub checker_type: CheckerType,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Problem {
    pub fn is_authored_by(&self, user_id: &Uuid) -> bool {
        self.author_id == *user_id
    }
}

/// Problem difficulty levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "difficulty_level", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Easy => write!(f, "EASY"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::Hard => write!(f, "HARD"),
        }
    }
}

/// Output comparison strategy applied by the judge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "checker_type", rename_all = "lowercase")]
pub enum CheckerType {
    /// Byte-for-byte match
    Exact,
    /// Whitespace-normalized token match
    Tokens,
}

/// Student-facing example, a non-authoritative copy of a sample test
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Example {
    pub id: Uuid,
    pub problem_id: Uuid,
    pub input_data: String,
    pub output_data: String,
    pub explanation: Option<String>,
}
