//! Problem handler implementations

use axum::{
    Json,
    extract::{Path, Query, State},
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    handlers::submissions::SubmissionsListResponse,
    middleware::auth::AuthenticatedUser,
    models::{Pagination, ProblemStatistics},
    state::AppState,
};

use super::{request::ProblemSubmissionsQuery, response::ProblemResponse};

/// Get a visible problem with its examples
pub async fn get_problem(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ProblemResponse>> {
    let view = state
        .catalog()
        .resolve_for_view(&id, &auth_user.requester())
        .await?;

    Ok(Json(view.into()))
}

/// List all submissions for a problem (author or admin)
pub async fn list_problem_submissions(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Query(query): Query<ProblemSubmissionsQuery>,
) -> AppResult<Json<SubmissionsListResponse>> {
    let pagination = Pagination::new(query.page, query.per_page);

    let page = state
        .submissions()
        .list_for_problem(&id, &auth_user.requester(), pagination)
        .await?;

    Ok(Json(page.into()))
}

/// Aggregate statistics for a problem (author or admin)
pub async fn get_problem_statistics(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ProblemStatistics>> {
    let stats = state
        .statistics()
        .stats_visible_to(&id, &auth_user.requester())
        .await?;

    Ok(Json(stats))
}
