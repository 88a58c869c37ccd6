//! Submission model and its state machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use uuid::Uuid;

/// Submission database model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub problem_id: Uuid,
    pub language: Language,
    #[serde(skip_serializing)]
    pub code: String,
    pub status: SubmissionStatus,
    pub execution_time_ms: Option<i32>,
    pub memory_used_mb: Option<i32>,
    pub error_message: Option<String>,
    pub test_results: Option<Json<Vec<TestResultRecord>>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Submission {
    /// Per-test outcomes, empty until the submission is terminal
    pub fn test_results(&self) -> &[TestResultRecord] {
        self.test_results.as_ref().map(|r| r.0.as_slice()).unwrap_or(&[])
    }
}

/// Data needed to open a new submission
#[derive(Debug, Clone, PartialEq)]
pub struct NewSubmission {
    pub user_id: Uuid,
    pub problem_id: Uuid,
    pub language: Language,
    pub code: String,
}

/// Submission status.
///
/// `Pending` and `InProgress` are transient; the other six are terminal and
/// mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "submission_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    Pending,
    InProgress,
    Accepted,
    WrongAnswer,
    TimeLimit,
    RuntimeError,
    CompileError,
    InternalError,
}

impl SubmissionStatus {
    /// All terminal statuses
    pub const TERMINAL: [SubmissionStatus; 6] = [
        Self::Accepted,
        Self::WrongAnswer,
        Self::TimeLimit,
        Self::RuntimeError,
        Self::CompileError,
        Self::InternalError,
    ];

    /// Get status as its wire/database string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Accepted => "ACCEPTED",
            Self::WrongAnswer => "WRONG_ANSWER",
            Self::TimeLimit => "TIME_LIMIT",
            Self::RuntimeError => "RUNTIME_ERROR",
            Self::CompileError => "COMPILE_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Parse status from its wire/database string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "IN_PROGRESS" => Some(Self::InProgress),
            "ACCEPTED" => Some(Self::Accepted),
            "WRONG_ANSWER" => Some(Self::WrongAnswer),
            "TIME_LIMIT" => Some(Self::TimeLimit),
            "RUNTIME_ERROR" => Some(Self::RuntimeError),
            "COMPILE_ERROR" => Some(Self::CompileError),
            "INTERNAL_ERROR" => Some(Self::InternalError),
            _ => None,
        }
    }

    /// Check if this is a final verdict (judging complete)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::InProgress)
    }

    /// Statuses whose time and memory are meaningful judge measurements
    pub fn is_measured(&self) -> bool {
        matches!(self, Self::Accepted | Self::WrongAnswer)
    }

    /// Whether the state machine permits moving from `self` to `next`.
    ///
    /// PENDING may only advance to IN_PROGRESS, or straight to INTERNAL_ERROR when
    /// grading could not even start. IN_PROGRESS may reach any terminal status.
    /// Terminal statuses never move again.
    pub fn can_transition_to(&self, next: SubmissionStatus) -> bool {
        match self {
            Self::Pending => matches!(next, Self::InProgress | Self::InternalError),
            Self::InProgress => next.is_terminal(),
            Self::Accepted
            | Self::WrongAnswer
            | Self::TimeLimit
            | Self::RuntimeError
            | Self::CompileError
            | Self::InternalError => false,
        }
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported submission languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "programming_language", rename_all = "lowercase")]
pub enum Language {
    Python,
    Java,
    Cpp,
    Javascript,
}

impl Language {
    /// All supported languages
    pub const ALL: [Language; 4] = [Self::Python, Self::Java, Self::Cpp, Self::Javascript];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Java => "java",
            Self::Cpp => "cpp",
            Self::Javascript => "javascript",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "python" => Some(Self::Python),
            "java" => Some(Self::Java),
            "cpp" => Some(Self::Cpp),
            "javascript" => Some(Self::Javascript),
            _ => None,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status the judge reports for a single test.
///
/// Wider than the terminal submission statuses: the engine may report
/// `MEMORY_LIMIT` per test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestStatus {
    Accepted,
    WrongAnswer,
    TimeLimit,
    MemoryLimit,
    RuntimeError,
    CompileError,
    InternalError,
}

/// Outcome of one hidden test, stored in order on the submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResultRecord {
    pub id: String,
    pub status: TestStatus,
    pub is_passed: bool,
    #[serde(default)]
    pub actual_output: String,
    pub execution_time_ms: i32,
    pub memory_used_mb: i32,
    #[serde(default)]
    pub details: String,
}

/// Fields committed together with a terminal status
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerdictFields {
    pub execution_time_ms: Option<i32>,
    pub memory_used_mb: Option<i32>,
    pub error_message: Option<String>,
    pub test_results: Option<Vec<TestResultRecord>>,
}

impl VerdictFields {
    /// Fields for a verdict carrying only a diagnostic
    pub fn diagnostic(message: impl Into<String>) -> Self {
        Self {
            error_message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
