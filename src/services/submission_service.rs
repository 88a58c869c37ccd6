//! Submission reads and deletion

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::{
    db::repositories::SubmissionRepository,
    error::{AppError, AppResult},
    models::{Page, Pagination, Requester, Submission},
};

use super::{
    access_policy::{SubmissionAccess, policy_for},
    problem_catalog::ProblemCatalog,
};

#[derive(Clone)]
pub struct SubmissionService {
    catalog: ProblemCatalog,
    submissions: Arc<dyn SubmissionRepository>,
}

impl SubmissionService {
    pub fn new(catalog: ProblemCatalog, submissions: Arc<dyn SubmissionRepository>) -> Self {
        Self {
            catalog,
            submissions,
        }
    }

    /// Get a submission the requester is allowed to read
    pub async fn get(&self, id: &Uuid, requester: &Requester) -> AppResult<Submission> {
        let submission = self
            .submissions
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;

        let allowed = match policy_for(requester.role).submission_access(requester, &submission) {
            SubmissionAccess::Granted => true,
            SubmissionAccess::Denied => false,
            SubmissionAccess::IfProblemAuthor => self
                .catalog
                .repository()
                .find_by_id(&submission.problem_id)
                .await?
                .is_some_and(|p| p.is_authored_by(&requester.id)),
        };

        if !allowed {
            return Err(AppError::Forbidden(
                "Cannot view other users' submissions".to_string(),
            ));
        }

        Ok(submission)
    }

    /// Delete a PENDING submission owned by the requester
    pub async fn delete(&self, id: &Uuid, requester: &Requester) -> AppResult<()> {
        self.submissions.delete(id, &requester.id).await?;

        info!(submission_id = %id, user_id = %requester.id, "Submission deleted");
        Ok(())
    }

    /// The requester's own submissions, newest first
    pub async fn list_mine(
        &self,
        requester: &Requester,
        pagination: Pagination,
    ) -> AppResult<Page<Submission>> {
        let (items, total) = self
            .submissions
            .list_by_user(&requester.id, pagination)
            .await?;

        Ok(Page::new(items, total, pagination))
    }

    /// Every submission for a problem, newest first; author or admin only
    pub async fn list_for_problem(
        &self,
        problem_id: &Uuid,
        requester: &Requester,
        pagination: Pagination,
    ) -> AppResult<Page<Submission>> {
        self.catalog.find_inspectable(problem_id, requester).await?;

        let (items, total) = self
            .submissions
            .list_by_problem(problem_id, pagination)
            .await?;

        Ok(Page::new(items, total, pagination))
    }
}
