//! Submission orchestrator
//!
//! Drives one submission through `PENDING -> IN_PROGRESS -> terminal`.
//!
//! Resolution failures (unknown problem, no access, no tests) are returned to
//! the caller before any row exists. Once the PENDING row is written every
//! outcome, including a judge that cannot be reached, ends in a terminal
//! status; the caller always gets the submission id back.
//!
//! Outbound judge calls are capped by a semaphore. A queued submission stays
//! PENDING and gives up after the configured queue timeout, so neither the
//! wait nor the call can outlive the stale window of the recovery sweeper.

use std::{panic::AssertUnwindSafe, sync::Arc, time::Duration};

use futures::FutureExt;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    db::repositories::SubmissionRepository,
    error::{AppError, AppResult},
    judge::{Judge, JudgeFailure, JudgeRequest, JudgeVerdict},
    models::{Language, NewSubmission, Requester, Submission, SubmissionStatus, VerdictFields},
};

use super::problem_catalog::{GradingFixture, ProblemCatalog};

/// A validated request to grade code against a problem
#[derive(Debug, Clone)]
pub struct SubmitCommand {
    pub problem_id: Uuid,
    pub language: Language,
    pub code: String,
}

/// What the caller learns once grading has finished
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionOutcome {
    pub submission_id: Uuid,
    pub status: SubmissionStatus,
    pub error_message: Option<String>,
}

impl SubmissionOutcome {
    fn from_row(submission: &Submission) -> Self {
        Self {
            submission_id: submission.id,
            status: submission.status,
            error_message: submission.error_message.clone(),
        }
    }

    /// Human-readable summary
    pub fn message(&self) -> String {
        match (&self.status, &self.error_message) {
            (SubmissionStatus::InternalError, Some(diagnostic)) => diagnostic.clone(),
            (status, _) => format!("Verdict: {}.", status),
        }
    }
}

#[derive(Clone)]
pub struct SubmissionOrchestrator {
    catalog: ProblemCatalog,
    submissions: Arc<dyn SubmissionRepository>,
    judge: Arc<dyn Judge>,
    judge_permits: Arc<Semaphore>,
    queue_timeout: Duration,
}

impl SubmissionOrchestrator {
    pub fn new(
        catalog: ProblemCatalog,
        submissions: Arc<dyn SubmissionRepository>,
        judge: Arc<dyn Judge>,
        max_concurrent_judge_calls: usize,
        queue_timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            submissions,
            judge,
            judge_permits: Arc::new(Semaphore::new(max_concurrent_judge_calls)),
            queue_timeout,
        }
    }

    /// Grade `command` on behalf of `requester` and return the final status
    pub async fn submit(
        &self,
        requester: &Requester,
        command: SubmitCommand,
    ) -> AppResult<SubmissionOutcome> {
        let fixture = self
            .catalog
            .resolve_for_grading(&command.problem_id, requester)
            .await?;

        let submission = self
            .submissions
            .create(&NewSubmission {
                user_id: requester.id,
                problem_id: command.problem_id,
                language: command.language,
                code: command.code,
            })
            .await?;
        let submission_id = submission.id;

        info!(
            submission_id = %submission_id,
            problem_id = %submission.problem_id,
            user_id = %submission.user_id,
            language = %submission.language,
            "Submission created"
        );

        // Grading runs detached from the request so that a dropped connection
        // cannot strand the row mid-flight
        let this = self.clone();
        let grading = tokio::spawn(async move { this.grade(&submission, &fixture).await });

        let outcome = match grading.await {
            Ok(outcome) => outcome,
            Err(join_err) => {
                error!(submission_id = %submission_id, error = %join_err, "Grading task failed");
                self.abandon(&submission_id, format!("Grading aborted: {}", join_err))
                    .await
            }
        };

        Ok(outcome)
    }

    async fn grade(&self, submission: &Submission, fixture: &GradingFixture) -> SubmissionOutcome {
        let id = submission.id;

        // The row stays PENDING while queued; IN_PROGRESS is only written once
        // a slot is held, so its `updated_at` marks the start of the call
        let permit = match self.acquire_judge_slot().await {
            Ok(permit) => permit,
            Err(failure) => {
                warn!(submission_id = %id, error = %failure, "No judge slot became free");
                return self
                    .record(
                        &id,
                        SubmissionStatus::InternalError,
                        VerdictFields::diagnostic(failure.to_string()),
                    )
                    .await;
            }
        };

        if let Err(err) = self
            .submissions
            .transition(&id, SubmissionStatus::InProgress, VerdictFields::default())
            .await
        {
            error!(submission_id = %id, error = %err, "Failed to mark submission in progress");
            let diagnostic = format!("Grading could not start: {}", err);
            return self.recover(&id, err, diagnostic).await;
        }

        let request = JudgeRequest::build(submission, &fixture.problem, &fixture.test_cases);
        let result = self.call_judge(&request).await;
        drop(permit);

        let (status, fields) = match result {
            Ok(verdict) => {
                info!(
                    submission_id = %id,
                    status = %verdict.status,
                    max_time_ms = verdict.max_time_ms,
                    max_memory_mb = verdict.max_memory_mb,
                    "Judge verdict received"
                );
                (verdict.status, verdict.into_fields())
            }
            Err(failure) => {
                warn!(
                    submission_id = %id,
                    kind = failure.kind(),
                    error = %failure,
                    "Judge call failed"
                );
                (
                    SubmissionStatus::InternalError,
                    VerdictFields::diagnostic(failure.to_string()),
                )
            }
        };

        self.record(&id, status, fields).await
    }

    /// Wait for a free judge slot, at most `queue_timeout`
    async fn acquire_judge_slot(&self) -> Result<OwnedSemaphorePermit, JudgeFailure> {
        let permits = self.judge_permits.clone();
        match tokio::time::timeout(self.queue_timeout, permits.acquire_owned()).await {
            Ok(Ok(permit)) => Ok(permit),
            Ok(Err(_)) => Err(JudgeFailure::Aborted("judge permits closed".to_string())),
            Err(_) => Err(JudgeFailure::Saturated(self.queue_timeout)),
        }
    }

    /// One judge call; a panic is an `Aborted` failure
    async fn call_judge(&self, request: &JudgeRequest) -> Result<JudgeVerdict, JudgeFailure> {
        match AssertUnwindSafe(async { self.judge.grade(request).await })
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(panic) => Err(JudgeFailure::Aborted(panic_message(panic.as_ref()))),
        }
    }

    /// Commit a terminal status, falling back to INTERNAL_ERROR
    async fn record(
        &self,
        id: &Uuid,
        status: SubmissionStatus,
        fields: VerdictFields,
    ) -> SubmissionOutcome {
        match self.submissions.transition(id, status, fields).await {
            Ok(row) => SubmissionOutcome::from_row(&row),
            Err(err) => {
                error!(
                    submission_id = %id,
                    status = %status,
                    error = %err,
                    "Failed to record verdict"
                );
                let diagnostic = format!("Verdict could not be recorded: {}", err);
                self.recover(id, err, diagnostic).await
            }
        }
    }

    /// React to a failed transition.
    ///
    /// A rejected transition or a missing row means someone else already
    /// settled the submission, so the stored row is the answer. Anything
    /// else is retried as INTERNAL_ERROR.
    async fn recover(&self, id: &Uuid, err: AppError, diagnostic: String) -> SubmissionOutcome {
        match err {
            AppError::InvalidTransition { .. } | AppError::NotFound(_) => {
                self.stored_outcome(id, diagnostic).await
            }
            _ => self.abandon(id, diagnostic).await,
        }
    }

    /// Close the submission as INTERNAL_ERROR from whatever state it is in
    async fn abandon(&self, id: &Uuid, diagnostic: String) -> SubmissionOutcome {
        match self
            .submissions
            .transition(
                id,
                SubmissionStatus::InternalError,
                VerdictFields::diagnostic(diagnostic.clone()),
            )
            .await
        {
            Ok(row) => SubmissionOutcome::from_row(&row),
            Err(err) => {
                error!(
                    submission_id = %id,
                    error = %err,
                    "Failed to close submission as INTERNAL_ERROR"
                );
                self.stored_outcome(id, diagnostic).await
            }
        }
    }

    /// Report what is persisted for `id`.
    ///
    /// `diagnostic` is only used when the row cannot be read at all; the
    /// stale sweeper closes it later if it is still in flight.
    async fn stored_outcome(&self, id: &Uuid, diagnostic: String) -> SubmissionOutcome {
        match self.submissions.find_by_id(id).await {
            Ok(Some(row)) => SubmissionOutcome::from_row(&row),
            Ok(None) => {
                info!(submission_id = %id, "Submission was deleted before grading finished");
                SubmissionOutcome {
                    submission_id: *id,
                    status: SubmissionStatus::InternalError,
                    error_message: Some("Submission was deleted before grading finished".to_string()),
                }
            }
            Err(err) => {
                error!(submission_id = %id, error = %err, "Failed to read back submission");
                SubmissionOutcome {
                    submission_id: *id,
                    status: SubmissionStatus::InternalError,
                    error_message: Some(diagnostic),
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "judge client panicked".to_string()
    }
}
