//! Problem request DTOs

use serde::Deserialize;

/// Pagination for a problem's submissions
#[derive(Debug, Default, Deserialize)]
pub struct ProblemSubmissionsQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}
