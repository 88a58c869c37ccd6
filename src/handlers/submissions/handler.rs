//! Submission handler implementations

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    middleware::auth::AuthenticatedUser,
    models::{Language, Pagination},
    services::SubmitCommand,
    state::AppState,
};

use super::{
    request::{CreateSubmissionRequest, ListSubmissionsQuery},
    response::{
        CreateSubmissionResponse, SubmissionResponse, SubmissionSourceResponse,
        SubmissionsListResponse,
    },
};

/// Submit code and grade it
pub async fn create_submission(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Json(payload): Json<CreateSubmissionRequest>,
) -> AppResult<(StatusCode, Json<CreateSubmissionResponse>)> {
    payload.validate()?;

    let language = Language::parse(&payload.language).ok_or_else(|| {
        AppError::Validation(format!("Unsupported language: {}", payload.language))
    })?;

    let outcome = state
        .orchestrator()
        .submit(
            &auth_user.requester(),
            SubmitCommand {
                problem_id: payload.problem_id,
                language,
                code: payload.code,
            },
        )
        .await?;

    Ok((StatusCode::ACCEPTED, Json(outcome.into())))
}

/// List the caller's submissions, newest first
pub async fn list_submissions(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Query(query): Query<ListSubmissionsQuery>,
) -> AppResult<Json<SubmissionsListResponse>> {
    let pagination = Pagination::new(query.page, query.per_page);

    let page = state
        .submissions()
        .list_mine(&auth_user.requester(), pagination)
        .await?;

    Ok(Json(page.into()))
}

/// Get submission by ID
pub async fn get_submission(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SubmissionResponse>> {
    let submission = state
        .submissions()
        .get(&id, &auth_user.requester())
        .await?;

    Ok(Json(submission.into()))
}

/// Get submission source code
pub async fn get_submission_source(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SubmissionSourceResponse>> {
    let submission = state
        .submissions()
        .get(&id, &auth_user.requester())
        .await?;

    Ok(Json(SubmissionSourceResponse {
        submission_id: submission.id,
        language: submission.language,
        code: submission.code,
    }))
}

/// Delete a PENDING submission
pub async fn delete_submission(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state
        .submissions()
        .delete(&id, &auth_user.requester())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
