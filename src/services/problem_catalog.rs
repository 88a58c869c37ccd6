//! Problem catalog
//!
//! Read path resolving problems for grading and for display. Every lookup
//! applies the visibility rule of the requester's role.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::repositories::ProblemRepository,
    error::{AppError, AppResult},
    models::{Example, Problem, Requester, TestCase},
};

use super::access_policy::{ProblemAccess, policy_for};

/// A problem together with the hidden tests sent to the judge
#[derive(Debug, Clone)]
pub struct GradingFixture {
    pub problem: Problem,
    /// Ordered by `order_index`, never empty
    pub test_cases: Vec<TestCase>,
}

/// A problem as shown to a student
#[derive(Debug, Clone)]
pub struct ProblemView {
    pub problem: Problem,
    pub examples: Vec<Example>,
}

#[derive(Clone)]
pub struct ProblemCatalog {
    problems: Arc<dyn ProblemRepository>,
}

impl ProblemCatalog {
    pub fn new(problems: Arc<dyn ProblemRepository>) -> Self {
        Self { problems }
    }

    pub fn repository(&self) -> &Arc<dyn ProblemRepository> {
        &self.problems
    }

    /// Resolve a problem and its ordered hidden tests for grading
    pub async fn resolve_for_grading(
        &self,
        problem_id: &Uuid,
        requester: &Requester,
    ) -> AppResult<GradingFixture> {
        let problem = self.find_visible(problem_id, requester).await?;

        let test_cases = self.problems.get_test_cases(problem_id).await?;
        if test_cases.is_empty() {
            return Err(AppError::Validation(format!(
                "Problem '{}' has no test cases and cannot be graded",
                problem.slug
            )));
        }

        Ok(GradingFixture {
            problem,
            test_cases,
        })
    }

    /// Resolve a problem with its examples; hidden tests are never included
    pub async fn resolve_for_view(
        &self,
        problem_id: &Uuid,
        requester: &Requester,
    ) -> AppResult<ProblemView> {
        let problem = self.find_visible(problem_id, requester).await?;
        let examples = self.problems.get_examples(problem_id).await?;

        Ok(ProblemView { problem, examples })
    }

    /// Load a problem the requester may inspect (author or admin)
    pub async fn find_inspectable(
        &self,
        problem_id: &Uuid,
        requester: &Requester,
    ) -> AppResult<Problem> {
        let problem = self.find(problem_id).await?;

        if !policy_for(requester.role).can_inspect_problem(requester, &problem) {
            return Err(AppError::Forbidden(
                "Only the problem author can inspect its submissions".to_string(),
            ));
        }

        Ok(problem)
    }

    async fn find_visible(&self, problem_id: &Uuid, requester: &Requester) -> AppResult<Problem> {
        let problem = self.find(problem_id).await?;

        let visible = match policy_for(requester.role).problem_access(requester, &problem) {
            ProblemAccess::Granted => true,
            ProblemAccess::IfAssigned => {
                self.problems.is_assigned(problem_id, &requester.id).await?
            }
        };

        if !visible {
            return Err(AppError::Forbidden(
                "Problem is not available to you".to_string(),
            ));
        }

        Ok(problem)
    }

    async fn find(&self, problem_id: &Uuid) -> AppResult<Problem> {
        self.problems
            .find_by_id(problem_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Problem not found".to_string()))
    }
}
