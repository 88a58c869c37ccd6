//! Submission response DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    models::{Language, Page, Submission, SubmissionStatus, TestResultRecord},
    services::SubmissionOutcome,
};

/// Returned once grading has finished
#[derive(Debug, Serialize)]
pub struct CreateSubmissionResponse {
    pub submission_id: Uuid,
    pub status: SubmissionStatus,
    pub message: String,
}

impl From<SubmissionOutcome> for CreateSubmissionResponse {
    fn from(outcome: SubmissionOutcome) -> Self {
        Self {
            message: outcome.message(),
            submission_id: outcome.submission_id,
            status: outcome.status,
        }
    }
}

/// Submission response, source code excluded
#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub problem_id: Uuid,
    pub language: Language,
    pub status: SubmissionStatus,
    pub execution_time_ms: Option<i32>,
    pub memory_used_mb: Option<i32>,
    pub error_message: Option<String>,
    pub test_results: Vec<TestResultRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Submission> for SubmissionResponse {
    fn from(s: Submission) -> Self {
        let test_results = s.test_results().to_vec();
        Self {
            id: s.id,
            user_id: s.user_id,
            problem_id: s.problem_id,
            language: s.language,
            status: s.status,
            execution_time_ms: s.execution_time_ms,
            memory_used_mb: s.memory_used_mb,
            error_message: s.error_message,
            test_results,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

/// Submission list response
#[derive(Debug, Serialize)]
pub struct SubmissionsListResponse {
    pub submissions: Vec<SubmissionResponse>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

impl From<Page<Submission>> for SubmissionsListResponse {
    fn from(page: Page<Submission>) -> Self {
        let page = page.map(SubmissionResponse::from);
        Self {
            submissions: page.items,
            total: page.total,
            page: page.page,
            per_page: page.per_page,
        }
    }
}

/// Source code of a submission
#[derive(Debug, Serialize)]
pub struct SubmissionSourceResponse {
    pub submission_id: Uuid,
    pub language: Language,
    pub code: String,
}
