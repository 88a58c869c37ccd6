//! Role-scoped access policies
//!
//! Each role gets its own policy object instead of role checks scattered
//! through the services. Decisions that need a database lookup are returned
//! as a deferred answer; the caller performs the lookup.

use crate::models::{Problem, Requester, Role, Submission};

/// Whether a requester may see or grade against a problem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemAccess {
    Granted,
    /// Only if the problem is assigned to one of the requester's groups
    IfAssigned,
}

/// Whether a requester may read a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionAccess {
    Granted,
    Denied,
    /// Only if the requester authored the submission's problem
    IfProblemAuthor,
}

pub trait RolePolicy: Send + Sync {
    fn problem_access(&self, requester: &Requester, problem: &Problem) -> ProblemAccess;

    fn submission_access(&self, requester: &Requester, submission: &Submission)
    -> SubmissionAccess;

    /// Listing a problem's submissions and reading its statistics
    fn can_inspect_problem(&self, requester: &Requester, problem: &Problem) -> bool;
}

pub struct StudentPolicy;

impl RolePolicy for StudentPolicy {
    fn problem_access(&self, _requester: &Requester, problem: &Problem) -> ProblemAccess {
        if problem.is_public {
            ProblemAccess::Granted
        } else {
            ProblemAccess::IfAssigned
        }
    }

    fn submission_access(
        &self,
        requester: &Requester,
        submission: &Submission,
    ) -> SubmissionAccess {
        if submission.user_id == requester.id {
            SubmissionAccess::Granted
        } else {
            SubmissionAccess::Denied
        }
    }

    fn can_inspect_problem(&self, _requester: &Requester, _problem: &Problem) -> bool {
        false
    }
}

pub struct TeacherPolicy;

impl RolePolicy for TeacherPolicy {
    fn problem_access(&self, requester: &Requester, problem: &Problem) -> ProblemAccess {
        if problem.is_public || problem.is_authored_by(&requester.id) {
            ProblemAccess::Granted
        } else {
            ProblemAccess::IfAssigned
        }
    }

    fn submission_access(
        &self,
        requester: &Requester,
        submission: &Submission,
    ) -> SubmissionAccess {
        if submission.user_id == requester.id {
            SubmissionAccess::Granted
        } else {
            SubmissionAccess::IfProblemAuthor
        }
    }

    fn can_inspect_problem(&self, requester: &Requester, problem: &Problem) -> bool {
        problem.is_authored_by(&requester.id)
    }
}

pub struct AdminPolicy;

impl RolePolicy for AdminPolicy {
    fn problem_access(&self, _requester: &Requester, _problem: &Problem) -> ProblemAccess {
        ProblemAccess::Granted
    }

    fn submission_access(
        &self,
        _requester: &Requester,
        _submission: &Submission,
    ) -> SubmissionAccess {
        SubmissionAccess::Granted
    }

    fn can_inspect_problem(&self, _requester: &Requester, _problem: &Problem) -> bool {
        true
    }
}

/// Policy for the requester's role
pub fn policy_for(role: Role) -> &'static dyn RolePolicy {
    match role {
        Role::Student => &StudentPolicy,
        Role::Teacher => &TeacherPolicy,
        Role::Admin => &AdminPolicy,
    }
}
