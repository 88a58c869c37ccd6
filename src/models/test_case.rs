//! Test case model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Hidden test case database model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TestCase {
    pub id: Uuid,
    pub problem_id: Uuid,
    pub input_data: String,
    pub expected_output: String,
    /// Position in the list sent to the judge
    pub order_index: i32,
    pub is_sample: bool,
}
