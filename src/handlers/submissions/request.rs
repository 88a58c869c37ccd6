//! Submission request DTOs

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::utils::validation::{validate_language, validate_source_code};

/// Create submission request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSubmissionRequest {
    /// Problem ID to submit for
    pub problem_id: Uuid,

    /// Programming language (`python`, `java`, `cpp`, `javascript`)
    #[validate(custom(function = "validate_language"))]
    pub language: String,

    /// Source code
    #[validate(custom(function = "validate_source_code"))]
    pub code: String,
}

/// Pagination query parameters
#[derive(Debug, Default, Deserialize)]
pub struct ListSubmissionsQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}
