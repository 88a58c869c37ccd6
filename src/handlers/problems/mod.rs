//! Problem read handlers

mod handler;
pub mod request;
pub mod response;

pub use handler::*;
pub use request::*;
pub use response::*;

use axum::{Router, routing::get};

use crate::state::AppState;

/// Problem routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(handler::get_problem))
        .route("/{id}/submissions", get(handler::list_problem_submissions))
        .route("/{id}/statistics", get(handler::get_problem_statistics))
}
