//! Problem response DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    models::{CheckerType, Difficulty, Example},
    services::ProblemView,
};

/// Problem as shown to a student: statement, limits and examples
#[derive(Debug, Serialize)]
pub struct ProblemResponse {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub time_limit_ms: i32,
    pub memory_limit_mb: i32,
    pub difficulty: Difficulty,
    pub checker_type: CheckerType,
    pub is_public: bool,
    pub author_id: Uuid,
    pub examples: Vec<ExampleResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ExampleResponse {
    pub input: String,
    pub output: String,
    pub explanation: Option<String>,
}

impl From<Example> for ExampleResponse {
    fn from(e: Example) -> Self {
        Self {
            input: e.input_data,
            output: e.output_data,
            explanation: e.explanation,
        }
    }
}

impl From<ProblemView> for ProblemResponse {
    fn from(view: ProblemView) -> Self {
        let p = view.problem;
        Self {
            id: p.id,
            title: p.title,
            slug: p.slug,
            description: p.description,
            time_limit_ms: p.time_limit_ms,
            memory_limit_mb: p.memory_limit_mb,
            difficulty: p.difficulty,
            checker_type: p.checker_type,
            is_public: p.is_public,
            author_id: p.author_id,
            examples: view.examples.into_iter().map(Into::into).collect(),
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}
