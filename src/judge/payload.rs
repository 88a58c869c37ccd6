//! Wire format of the judge RPC

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    CheckerType, Language, Problem, Submission, SubmissionStatus, TestCase, TestResultRecord,
    VerdictFields,
};

use super::JudgeFailure;

/// Body of the grading POST
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeRequest {
    pub submission_id: Uuid,
    pub language: Language,
    pub code: String,
    /// Milliseconds
    pub time_limit: i32,
    /// Megabytes
    pub memory_limit: i32,
    pub checker_type: CheckerType,
    pub test_cases: Vec<JudgeTestCase>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeTestCase {
    pub id: String,
    pub input_data: String,
    pub expected_output: String,
}

impl JudgeRequest {
    /// Build the payload for a submission; `tests` must already be ordered
    pub fn build(submission: &Submission, problem: &Problem, tests: &[TestCase]) -> Self {
        Self {
            submission_id: submission.id,
            language: submission.language,
            code: submission.code.clone(),
            time_limit: problem.time_limit_ms,
            memory_limit: problem.memory_limit_mb,
            checker_type: problem.checker_type,
            test_cases: tests
                .iter()
                .map(|tc| JudgeTestCase {
                    id: tc.id.to_string(),
                    input_data: tc.input_data.clone(),
                    expected_output: tc.expected_output.clone(),
                })
                .collect(),
        }
    }
}

/// Body returned by the judge on success
#[derive(Debug, Clone, Deserialize)]
pub struct JudgeResponse {
    pub submission_id: String,
    pub final_status: String,
    #[serde(default)]
    pub max_time_ms: i32,
    #[serde(default)]
    pub max_memory_mb: i32,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub test_results: Vec<TestResultRecord>,
}

impl JudgeResponse {
    /// Validate the response against the request it answers
    pub fn into_verdict(self, expected_id: &Uuid) -> Result<JudgeVerdict, JudgeFailure> {
        let echoed = Uuid::parse_str(self.submission_id.trim()).map_err(|_| {
            JudgeFailure::Protocol(format!(
                "submission_id {:?} is not a valid identifier",
                self.submission_id
            ))
        })?;
        if echoed != *expected_id {
            return Err(JudgeFailure::Protocol(format!(
                "response answers submission {} instead of {}",
                echoed, expected_id
            )));
        }

        let status = SubmissionStatus::parse(&self.final_status)
            .filter(SubmissionStatus::is_terminal)
            .ok_or_else(|| {
                JudgeFailure::Protocol(format!("unknown final_status {:?}", self.final_status))
            })?;

        Ok(JudgeVerdict {
            status,
            max_time_ms: self.max_time_ms,
            max_memory_mb: self.max_memory_mb,
            error_message: self.error_message.filter(|m| !m.trim().is_empty()),
            test_results: self.test_results,
        })
    }
}

/// A well-formed grading outcome
#[derive(Debug, Clone, PartialEq)]
pub struct JudgeVerdict {
    /// Always one of the six terminal statuses
    pub status: SubmissionStatus,
    pub max_time_ms: i32,
    pub max_memory_mb: i32,
    pub error_message: Option<String>,
    pub test_results: Vec<TestResultRecord>,
}

impl JudgeVerdict {
    pub fn into_fields(self) -> VerdictFields {
        VerdictFields {
            execution_time_ms: Some(self.max_time_ms),
            memory_used_mb: Some(self.max_memory_mb),
            error_message: self.error_message,
            test_results: Some(self.test_results),
        }
    }
}
