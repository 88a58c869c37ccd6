//! Submission repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, types::Json};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        NewSubmission, Pagination, Submission, SubmissionAggregate, SubmissionStatus,
        VerdictFields,
    },
};

use super::{SubmissionRepository, check_deletable, check_transition};

/// PostgreSQL-backed submission store
#[derive(Clone)]
pub struct PgSubmissionRepository {
    pool: PgPool,
}

impl PgSubmissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct OwnershipRow {
    user_id: Uuid,
    status: SubmissionStatus,
}

#[async_trait]
impl SubmissionRepository for PgSubmissionRepository {
    async fn create(&self, new: &NewSubmission) -> AppResult<Submission> {
        let submission = sqlx::query_as::<_, Submission>(
            r#"
            INSERT INTO submissions (user_id, problem_id, language, code, status)
            VALUES ($1, $2, $3, $4, 'PENDING')
            RETURNING *
            "#,
        )
        .bind(new.user_id)
        .bind(new.problem_id)
        .bind(new.language)
        .bind(&new.code)
        .fetch_one(&self.pool)
        .await?;

        Ok(submission)
    }

    async fn transition(
        &self,
        id: &Uuid,
        status: SubmissionStatus,
        fields: VerdictFields,
    ) -> AppResult<Submission> {
        let mut tx = self.pool.begin().await?;

        // Row lock: concurrent writers on the same id serialize here
        let current: SubmissionStatus = sqlx::query_scalar(
            r#"SELECT status FROM submissions WHERE id = $1 FOR UPDATE"#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;

        check_transition(current, status, &fields)?;

        let submission = sqlx::query_as::<_, Submission>(
            r#"
            UPDATE submissions
            SET
                status = $2,
                execution_time_ms = COALESCE($3, execution_time_ms),
                memory_used_mb = COALESCE($4, memory_used_mb),
                error_message = COALESCE($5, error_message),
                test_results = COALESCE($6, test_results),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(fields.execution_time_ms)
        .bind(fields.memory_used_mb)
        .bind(fields.error_message)
        .bind(fields.test_results.map(Json))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(submission)
    }

    async fn delete(&self, id: &Uuid, requester_id: &Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OwnershipRow>(
            r#"SELECT user_id, status FROM submissions WHERE id = $1 FOR UPDATE"#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;

        check_deletable(&row.user_id, row.status, requester_id)?;

        sqlx::query(r#"DELETE FROM submissions WHERE id = $1"#)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn find_by_id(&self, id: &Uuid) -> AppResult<Option<Submission>> {
        let submission =
            sqlx::query_as::<_, Submission>(r#"SELECT * FROM submissions WHERE id = $1"#)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(submission)
    }

    async fn list_by_user(
        &self,
        user_id: &Uuid,
        pagination: Pagination,
    ) -> AppResult<(Vec<Submission>, i64)> {
        let submissions = sqlx::query_as::<_, Submission>(
            r#"
            SELECT * FROM submissions
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(pagination.offset())
        .bind(pagination.limit())
        .fetch_all(&self.pool)
        .await?;

        let count: i64 =
            sqlx::query_scalar(r#"SELECT COUNT(*) FROM submissions WHERE user_id = $1"#)
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok((submissions, count))
    }

    async fn list_by_problem(
        &self,
        problem_id: &Uuid,
        pagination: Pagination,
    ) -> AppResult<(Vec<Submission>, i64)> {
        let submissions = sqlx::query_as::<_, Submission>(
            r#"
            SELECT * FROM submissions
            WHERE problem_id = $1
            ORDER BY created_at DESC, id DESC
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(problem_id)
        .bind(pagination.offset())
        .bind(pagination.limit())
        .fetch_all(&self.pool)
        .await?;

        let count: i64 =
            sqlx::query_scalar(r#"SELECT COUNT(*) FROM submissions WHERE problem_id = $1"#)
                .bind(problem_id)
                .fetch_one(&self.pool)
                .await?;

        Ok((submissions, count))
    }

    async fn aggregate_for_problem(&self, problem_id: &Uuid) -> AppResult<SubmissionAggregate> {
        let aggregate = sqlx::query_as::<_, SubmissionAggregate>(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'ACCEPTED') AS accepted,
                (AVG(execution_time_ms) FILTER (
                    WHERE status IN ('ACCEPTED', 'WRONG_ANSWER')
                ))::float8 AS avg_time_ms,
                (AVG(memory_used_mb) FILTER (
                    WHERE status IN ('ACCEPTED', 'WRONG_ANSWER')
                ))::float8 AS avg_memory_mb
            FROM submissions
            WHERE problem_id = $1
              AND status NOT IN ('PENDING', 'IN_PROGRESS')
            "#,
        )
        .bind(problem_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(aggregate)
    }

    async fn fail_stale(&self, older_than: DateTime<Utc>, message: &str) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE submissions
            SET
                status = 'INTERNAL_ERROR',
                error_message = $2,
                updated_at = NOW()
            WHERE status IN ('PENDING', 'IN_PROGRESS')
              AND updated_at < $1
            "#,
        )
        .bind(older_than)
        .bind(message)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
