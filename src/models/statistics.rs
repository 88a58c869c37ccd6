//! Per-problem submission statistics

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Raw aggregate read from the submissions table
#[derive(Debug, Clone, Default, PartialEq, FromRow)]
pub struct SubmissionAggregate {
    /// Terminal submissions for the problem
    pub total: i64,
    pub accepted: i64,
    /// Mean over ACCEPTED and WRONG_ANSWER rows only
    pub avg_time_ms: Option<f64>,
    pub avg_memory_mb: Option<f64>,
}

/// Statistics returned to problem authors
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProblemStatistics {
    pub problem_id: Uuid,
    pub total: i64,
    pub accepted: i64,
    /// Percentage, two decimals
    pub success_rate: f64,
    pub avg_time_ms: Option<f64>,
    pub avg_memory_mb: Option<f64>,
}
