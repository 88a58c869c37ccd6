//! HTTP Request Handlers
//!
//! This module contains all HTTP request handlers organized by domain.

pub mod health;
pub mod problems;
pub mod submissions;

use axum::{Router, middleware};

use crate::{middleware::auth::auth_middleware, state::AppState};

/// Create all API routes; everything except health requires a bearer token
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/problems", problems::routes())
        .nest("/submissions", submissions::routes())
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
        .merge(health::routes())
}
