//! Problem repository

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Example, Problem, TestCase},
};

use super::ProblemRepository;

/// PostgreSQL-backed problem reads
#[derive(Clone)]
pub struct PgProblemRepository {
    pool: PgPool,
}

impl PgProblemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProblemRepository for PgProblemRepository {
    async fn find_by_id(&self, id: &Uuid) -> AppResult<Option<Problem>> {
        let problem = sqlx::query_as::<_, Problem>(r#"SELECT * FROM problems WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(problem)
    }

    async fn get_test_cases(&self, problem_id: &Uuid) -> AppResult<Vec<TestCase>> {
        let test_cases = sqlx::query_as::<_, TestCase>(
            r#"
            SELECT id, problem_id, input_data, expected_output, order_index, is_sample
            FROM test_cases
            WHERE problem_id = $1
            ORDER BY order_index, id
            "#,
        )
        .bind(problem_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(test_cases)
    }

    async fn get_examples(&self, problem_id: &Uuid) -> AppResult<Vec<Example>> {
        let examples = sqlx::query_as::<_, Example>(
            r#"
            SELECT id, problem_id, input_data, output_data, explanation
            FROM examples
            WHERE problem_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(problem_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(examples)
    }

    async fn is_assigned(&self, problem_id: &Uuid, user_id: &Uuid) -> AppResult<bool> {
        let assigned: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1
                FROM group_assignments ga
                JOIN group_members gm ON gm.group_id = ga.group_id
                WHERE ga.problem_id = $1 AND gm.user_id = $2
            )
            "#,
        )
        .bind(problem_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(assigned)
    }
}
