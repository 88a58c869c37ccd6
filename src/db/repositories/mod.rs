//! Database repositories
//!
//! Repositories handle all direct database interactions. Services depend on
//! the traits below, never on a concrete backend.

pub mod problem_repo;
pub mod submission_repo;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        Example, NewSubmission, Pagination, Problem, Submission, SubmissionAggregate,
        SubmissionStatus, TestCase, VerdictFields,
    },
};

pub use problem_repo::PgProblemRepository;
pub use submission_repo::PgSubmissionRepository;

/// Read access to problems and their grading fixtures
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProblemRepository: Send + Sync {
    async fn find_by_id(&self, id: &Uuid) -> AppResult<Option<Problem>>;

    /// Hidden tests ordered by `order_index`
    async fn get_test_cases(&self, problem_id: &Uuid) -> AppResult<Vec<TestCase>>;

    async fn get_examples(&self, problem_id: &Uuid) -> AppResult<Vec<Example>>;

    /// Whether the problem is assigned to one of the user's groups
    async fn is_assigned(&self, problem_id: &Uuid, user_id: &Uuid) -> AppResult<bool>;
}

/// Durable submission records and their state transitions
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Insert a PENDING submission with a fresh id
    async fn create(&self, new: &NewSubmission) -> AppResult<Submission>;

    /// Move a submission to `status`, committing `fields` alongside.
    ///
    /// Fails with `InvalidTransition` when the state machine forbids the move.
    async fn transition(
        &self,
        id: &Uuid,
        status: SubmissionStatus,
        fields: VerdictFields,
    ) -> AppResult<Submission>;

    /// Delete a PENDING submission owned by `requester_id`
    async fn delete(&self, id: &Uuid, requester_id: &Uuid) -> AppResult<()>;

    async fn find_by_id(&self, id: &Uuid) -> AppResult<Option<Submission>>;

    /// Newest first
    async fn list_by_user(
        &self,
        user_id: &Uuid,
        pagination: Pagination,
    ) -> AppResult<(Vec<Submission>, i64)>;

    /// Newest first
    async fn list_by_problem(
        &self,
        problem_id: &Uuid,
        pagination: Pagination,
    ) -> AppResult<(Vec<Submission>, i64)>;

    async fn aggregate_for_problem(&self, problem_id: &Uuid) -> AppResult<SubmissionAggregate>;

    /// Close every non-terminal submission last touched before `older_than`
    async fn fail_stale(&self, older_than: DateTime<Utc>, message: &str) -> AppResult<u64>;
}

/// Validate a transition request against the state machine
pub fn check_transition(
    current: SubmissionStatus,
    next: SubmissionStatus,
    fields: &VerdictFields,
) -> AppResult<()> {
    if !current.can_transition_to(next) {
        return Err(AppError::InvalidTransition {
            from: current,
            to: next,
        });
    }
    if !next.is_terminal() && !fields.is_empty() {
        return Err(AppError::Validation(
            "Verdict fields can only accompany a terminal status".to_string(),
        ));
    }
    Ok(())
}

/// Validate a delete request against ownership and status
pub fn check_deletable(
    owner_id: &Uuid,
    status: SubmissionStatus,
    requester_id: &Uuid,
) -> AppResult<()> {
    if owner_id != requester_id {
        return Err(AppError::Forbidden(
            "Cannot delete other users' submissions".to_string(),
        ));
    }
    if status != SubmissionStatus::Pending {
        return Err(AppError::InvalidState(format!(
            "Only PENDING submissions can be deleted; this one is {}",
            status
        )));
    }
    Ok(())
}
