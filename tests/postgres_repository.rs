//! Postgres repositories against a throwaway container.
//!
//! Needs a Docker daemon: `cargo test -- --ignored`.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

use codegrade::{
    config::DatabaseConfig,
    db::{
        self,
        repositories::{
            PgProblemRepository, PgSubmissionRepository, ProblemRepository, SubmissionRepository,
        },
    },
    error::AppError,
    models::{
        Language, NewSubmission, Pagination, SubmissionStatus, TestResultRecord, TestStatus,
        VerdictFields,
    },
};

/// Shared container and its connection URL, started on first use
static POSTGRES: OnceCell<(ContainerAsync<Postgres>, String)> = OnceCell::const_new();

async fn pool() -> PgPool {
    let (_, url) = POSTGRES
        .get_or_init(|| async {
            let container = Postgres::default()
                .with_user("codegrade")
                .with_password("codegrade_test")
                .with_db_name("codegrade_test")
                .start()
                .await
                .expect("Failed to start PostgreSQL container");
            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();
            let url = format!(
                "postgres://codegrade:codegrade_test@{}:{}/codegrade_test",
                host, port
            );
            (container, url)
        })
        .await;

    let pool = db::create_pool(&DatabaseConfig {
        url: url.clone(),
        max_connections: 4,
    })
    .await
    .unwrap();
    // Idempotent, and serialized by the migrator's advisory lock
    db::run_migrations(&pool).await.unwrap();
    pool
}

async fn seed_user(pool: &PgPool, role: &str) -> Uuid {
    sqlx::query_scalar("INSERT INTO users (username, role) VALUES ($1, $2) RETURNING id")
        .bind(format!("{}-{}", role, Uuid::new_v4().simple()))
        .bind(role)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn seed_problem(pool: &PgPool, author_id: Uuid, tests: usize) -> Uuid {
    let problem_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO problems (author_id, title, slug, checker_type, is_public)
        VALUES ($1, 'A + B', $2, 'tokens', FALSE)
        RETURNING id
        "#,
    )
    .bind(author_id)
    .bind(format!("a-plus-b-{}", Uuid::new_v4().simple()))
    .fetch_one(pool)
    .await
    .unwrap();

    // Inserted out of order to exercise the ORDER BY
    for i in (0..tests).rev() {
        sqlx::query(
            "INSERT INTO test_cases (problem_id, input_data, expected_output, order_index) VALUES ($1, $2, $3, $4)",
        )
        .bind(problem_id)
        .bind(format!("{} {}", i, i))
        .bind(format!("{}", 2 * i))
        .bind(i as i32)
        .execute(pool)
        .await
        .unwrap();
    }
    problem_id
}

fn new_submission(user_id: Uuid, problem_id: Uuid) -> NewSubmission {
    NewSubmission {
        user_id,
        problem_id,
        language: Language::Cpp,
        code: "int main() { puts(\"0\"); }".to_string(),
    }
}

fn verdict(time: i32, memory: i32) -> VerdictFields {
    VerdictFields {
        execution_time_ms: Some(time),
        memory_used_mb: Some(memory),
        error_message: None,
        test_results: Some(vec![TestResultRecord {
            id: "1".to_string(),
            status: TestStatus::Accepted,
            is_passed: true,
            actual_output: "0".to_string(),
            execution_time_ms: time,
            memory_used_mb: memory,
            details: String::new(),
        }]),
    }
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_problem_fixture_and_assignment() {
    let pool = pool().await;
    let author = seed_user(&pool, "teacher").await;
    let student = seed_user(&pool, "student").await;
    let problem_id = seed_problem(&pool, author, 3).await;
    let repo = PgProblemRepository::new(pool.clone());

    let tests = repo.get_test_cases(&problem_id).await.unwrap();
    let order: Vec<i32> = tests.iter().map(|t| t.order_index).collect();
    assert_eq!(order, vec![0, 1, 2]);

    assert!(!repo.is_assigned(&problem_id, &student).await.unwrap());

    let group_id: Uuid =
        sqlx::query_scalar("INSERT INTO groups (name, owner_id) VALUES ('CS101', $1) RETURNING id")
            .bind(author)
            .fetch_one(&pool)
            .await
            .unwrap();
    sqlx::query("INSERT INTO group_members (group_id, user_id) VALUES ($1, $2)")
        .bind(group_id)
        .bind(student)
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO group_assignments (group_id, problem_id) VALUES ($1, $2)")
        .bind(group_id)
        .bind(problem_id)
        .execute(&pool)
        .await
        .unwrap();

    assert!(repo.is_assigned(&problem_id, &student).await.unwrap());
    assert!(repo.find_by_id(&Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_transition_commits_verdict_once() {
    let pool = pool().await;
    let user = seed_user(&pool, "student").await;
    let problem_id = seed_problem(&pool, user, 1).await;
    let repo = PgSubmissionRepository::new(pool);

    let created = repo.create(&new_submission(user, problem_id)).await.unwrap();
    assert_eq!(created.status, SubmissionStatus::Pending);
    assert!(created.test_results.is_none());

    let running = repo
        .transition(&created.id, SubmissionStatus::InProgress, VerdictFields::default())
        .await
        .unwrap();
    assert_eq!(running.status, SubmissionStatus::InProgress);

    let done = repo
        .transition(&created.id, SubmissionStatus::Accepted, verdict(40, 12))
        .await
        .unwrap();
    assert_eq!(done.status, SubmissionStatus::Accepted);
    assert_eq!(done.execution_time_ms, Some(40));
    assert_eq!(done.test_results().len(), 1);
    assert!(done.updated_at >= created.updated_at);

    let err = repo
        .transition(
            &created.id,
            SubmissionStatus::InternalError,
            VerdictFields::diagnostic("late"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition { .. }));

    let stored = repo.find_by_id(&created.id).await.unwrap().unwrap();
    assert_eq!(stored.status, SubmissionStatus::Accepted);
    assert_eq!(stored.error_message, None);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_delete_only_own_pending() {
    let pool = pool().await;
    let owner = seed_user(&pool, "student").await;
    let other = seed_user(&pool, "student").await;
    let problem_id = seed_problem(&pool, owner, 1).await;
    let repo = PgSubmissionRepository::new(pool);

    let pending = repo.create(&new_submission(owner, problem_id)).await.unwrap();
    let err = repo.delete(&pending.id, &other).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let graded = repo.create(&new_submission(owner, problem_id)).await.unwrap();
    repo.transition(&graded.id, SubmissionStatus::InProgress, VerdictFields::default())
        .await
        .unwrap();
    let err = repo.delete(&graded.id, &owner).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));

    repo.delete(&pending.id, &owner).await.unwrap();
    assert!(repo.find_by_id(&pending.id).await.unwrap().is_none());
    assert!(matches!(
        repo.delete(&pending.id, &owner).await.unwrap_err(),
        AppError::NotFound(_)
    ));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_aggregate_and_listing() {
    let pool = pool().await;
    let user = seed_user(&pool, "student").await;
    let problem_id = seed_problem(&pool, user, 1).await;
    let repo = PgSubmissionRepository::new(pool);

    let outcomes = [
        (SubmissionStatus::Accepted, verdict(100, 10)),
        (SubmissionStatus::Accepted, verdict(200, 20)),
        (SubmissionStatus::WrongAnswer, verdict(300, 30)),
        (
            SubmissionStatus::CompileError,
            VerdictFields::diagnostic("expected `;`"),
        ),
    ];
    for (status, fields) in outcomes {
        let s = repo.create(&new_submission(user, problem_id)).await.unwrap();
        repo.transition(&s.id, SubmissionStatus::InProgress, VerdictFields::default())
            .await
            .unwrap();
        repo.transition(&s.id, status, fields).await.unwrap();
    }
    // Still in flight, so it must not count
    repo.create(&new_submission(user, problem_id)).await.unwrap();

    let agg = repo.aggregate_for_problem(&problem_id).await.unwrap();
    assert_eq!(agg.total, 4);
    assert_eq!(agg.accepted, 2);
    assert_eq!(agg.avg_time_ms, Some(200.0));
    assert_eq!(agg.avg_memory_mb, Some(20.0));

    let (page, total) = repo
        .list_by_problem(&problem_id, Pagination::new(Some(1), Some(2)))
        .await
        .unwrap();
    assert_eq!(total, 5);
    assert_eq!(page.len(), 2);
    assert!(page[0].created_at >= page[1].created_at);
    assert_eq!(page[0].status, SubmissionStatus::Pending);

    let (mine, total) = repo
        .list_by_user(&user, Pagination::new(None, None))
        .await
        .unwrap();
    assert_eq!(total, 5);
    assert_eq!(mine.len(), 5);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_fail_stale_closes_only_old_in_flight_rows() {
    let pool = pool().await;
    let user = seed_user(&pool, "student").await;
    let problem_id = seed_problem(&pool, user, 1).await;
    let repo = PgSubmissionRepository::new(pool.clone());

    let stranded = repo.create(&new_submission(user, problem_id)).await.unwrap();
    let fresh = repo.create(&new_submission(user, problem_id)).await.unwrap();
    sqlx::query("UPDATE submissions SET updated_at = NOW() - INTERVAL '1 hour' WHERE id = $1")
        .bind(stranded.id)
        .execute(&pool)
        .await
        .unwrap();

    let closed = repo
        .fail_stale(Utc::now() - Duration::minutes(10), "Grading did not finish")
        .await
        .unwrap();
    assert!(closed >= 1);

    let stranded = repo.find_by_id(&stranded.id).await.unwrap().unwrap();
    assert_eq!(stranded.status, SubmissionStatus::InternalError);
    assert_eq!(stranded.error_message.as_deref(), Some("Grading did not finish"));

    let fresh = repo.find_by_id(&fresh.id).await.unwrap().unwrap();
    assert_eq!(fresh.status, SubmissionStatus::Pending);
}
