//! Shared fixtures for integration tests
#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use sqlx::types::Json;
use uuid::Uuid;

use codegrade::{
    config::{
        Config, DatabaseConfig, JudgeConfig, JwtConfig, LogFormat, RecoveryConfig, ServerConfig,
    },
    db::repositories::{ProblemRepository, SubmissionRepository, check_deletable, check_transition},
    error::{AppError, AppResult},
    judge::{Judge, JudgeFailure, JudgeRequest, JudgeVerdict},
    middleware::auth::Claims,
    models::{
        CheckerType, Difficulty, Example, NewSubmission, Pagination, Problem, Role, Submission,
        SubmissionAggregate, SubmissionStatus, TestCase, TestResultRecord, TestStatus,
        VerdictFields,
    },
};

pub const JWT_SECRET: &str = "integration-test-secret";

pub fn test_config(max_concurrency: usize) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            rust_log: "debug".to_string(),
            log_format: LogFormat::Pretty,
        },
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: JWT_SECRET.to_string(),
        },
        judge: JudgeConfig {
            max_concurrency,
            ..JudgeConfig::default()
        },
        recovery: RecoveryConfig::default(),
    }
}

pub fn bearer(user_id: Uuid, role: Role) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        username: format!("user-{}", &user_id.to_string()[..8]),
        role: role.as_str().to_string(),
        exp: Utc::now().timestamp() + 3600,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {}", token)
}

pub fn problem(author_id: Uuid, is_public: bool) -> Problem {
    let id = Uuid::new_v4();
    Problem {
        id,
        author_id,
        title: "A + B".to_string(),
        slug: format!("a-plus-b-{}", id.simple()),
        description: "Print the sum of two integers.".to_string(),
        time_limit_ms: 1000,
        memory_limit_mb: 256,
        difficulty: Difficulty::Easy,
        checker_type: CheckerType::Tokens,
        is_public,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn test_cases(problem_id: Uuid, count: usize) -> Vec<TestCase> {
    (0..count)
        .map(|i| TestCase {
            id: Uuid::new_v4(),
            problem_id,
            input_data: format!("{} {}", i, i + 1),
            expected_output: format!("{}", 2 * i + 1),
            order_index: i as i32,
            is_sample: i == 0,
        })
        .collect()
}

pub fn passing_results(request: &JudgeRequest) -> Vec<TestResultRecord> {
    request
        .test_cases
        .iter()
        .map(|tc| TestResultRecord {
            id: tc.id.clone(),
            status: TestStatus::Accepted,
            is_passed: true,
            actual_output: tc.expected_output.clone(),
            execution_time_ms: 12,
            memory_used_mb: 8,
            details: String::new(),
        })
        .collect()
}

// =============================================================================
// IN-MEMORY REPOSITORIES
// =============================================================================

#[derive(Default)]
pub struct InMemoryProblems {
    problems: Mutex<HashMap<Uuid, Problem>>,
    tests: Mutex<HashMap<Uuid, Vec<TestCase>>>,
    examples: Mutex<HashMap<Uuid, Vec<Example>>>,
    assignments: Mutex<HashSet<(Uuid, Uuid)>>,
}

impl InMemoryProblems {
    pub fn insert(&self, problem: Problem, tests: Vec<TestCase>) {
        self.tests.lock().unwrap().insert(problem.id, tests);
        self.problems.lock().unwrap().insert(problem.id, problem);
    }

    pub fn add_example(&self, example: Example) {
        self.examples
            .lock()
            .unwrap()
            .entry(example.problem_id)
            .or_default()
            .push(example);
    }

    pub fn assign(&self, problem_id: Uuid, user_id: Uuid) {
        self.assignments.lock().unwrap().insert((problem_id, user_id));
    }
}

#[async_trait]
impl ProblemRepository for InMemoryProblems {
    async fn find_by_id(&self, id: &Uuid) -> AppResult<Option<Problem>> {
        Ok(self.problems.lock().unwrap().get(id).cloned())
    }

    async fn get_test_cases(&self, problem_id: &Uuid) -> AppResult<Vec<TestCase>> {
        let mut tests = self
            .tests
            .lock()
            .unwrap()
            .get(problem_id)
            .cloned()
            .unwrap_or_default();
        tests.sort_by_key(|t| t.order_index);
        Ok(tests)
    }

    async fn get_examples(&self, problem_id: &Uuid) -> AppResult<Vec<Example>> {
        Ok(self
            .examples
            .lock()
            .unwrap()
            .get(problem_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn is_assigned(&self, problem_id: &Uuid, user_id: &Uuid) -> AppResult<bool> {
        Ok(self
            .assignments
            .lock()
            .unwrap()
            .contains(&(*problem_id, *user_id)))
    }
}

#[derive(Default)]
pub struct InMemorySubmissions {
    rows: Mutex<HashMap<Uuid, Submission>>,
    /// Every status written, in order, per submission
    history: Mutex<HashMap<Uuid, Vec<SubmissionStatus>>>,
}

impl InMemorySubmissions {
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn history(&self, id: &Uuid) -> Vec<SubmissionStatus> {
        self.history
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    /// Seed a row directly, bypassing the state machine
    pub fn seed(&self, submission: Submission) {
        self.rows.lock().unwrap().insert(submission.id, submission);
    }

    /// Most recently created submission of `user_id`
    pub fn latest_for(&self, user_id: &Uuid) -> Option<Submission> {
        self.rows
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.user_id == *user_id)
            .max_by_key(|s| s.created_at)
            .cloned()
    }

    pub fn backdate(&self, id: &Uuid, to: DateTime<Utc>) {
        if let Some(row) = self.rows.lock().unwrap().get_mut(id) {
            row.updated_at = to;
        }
    }
}

pub fn submission_row(
    user_id: Uuid,
    problem_id: Uuid,
    status: SubmissionStatus,
    execution_time_ms: Option<i32>,
) -> Submission {
    Submission {
        id: Uuid::new_v4(),
        user_id,
        problem_id,
        language: codegrade::models::Language::Python,
        code: "print(sum(map(int, input().split())))".to_string(),
        status,
        execution_time_ms,
        memory_used_mb: execution_time_ms.map(|_| 10),
        error_message: None,
        test_results: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[async_trait]
impl SubmissionRepository for InMemorySubmissions {
    async fn create(&self, new: &NewSubmission) -> AppResult<Submission> {
        let now = Utc::now();
        let row = Submission {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            problem_id: new.problem_id,
            language: new.language,
            code: new.code.clone(),
            status: SubmissionStatus::Pending,
            execution_time_ms: None,
            memory_used_mb: None,
            error_message: None,
            test_results: None,
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().unwrap().insert(row.id, row.clone());
        self.history
            .lock()
            .unwrap()
            .insert(row.id, vec![SubmissionStatus::Pending]);
        Ok(row)
    }

    async fn transition(
        &self,
        id: &Uuid,
        status: SubmissionStatus,
        fields: VerdictFields,
    ) -> AppResult<Submission> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;

        check_transition(row.status, status, &fields)?;

        row.status = status;
        if let Some(v) = fields.execution_time_ms {
            row.execution_time_ms = Some(v);
        }
        if let Some(v) = fields.memory_used_mb {
            row.memory_used_mb = Some(v);
        }
        if let Some(v) = fields.error_message {
            row.error_message = Some(v);
        }
        if let Some(v) = fields.test_results {
            row.test_results = Some(Json(v));
        }
        row.updated_at = Utc::now();

        self.history
            .lock()
            .unwrap()
            .entry(*id)
            .or_default()
            .push(status);
        Ok(row.clone())
    }

    async fn delete(&self, id: &Uuid, requester_id: &Uuid) -> AppResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get(id)
            .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;

        check_deletable(&row.user_id, row.status, requester_id)?;
        rows.remove(id);
        Ok(())
    }

    async fn find_by_id(&self, id: &Uuid) -> AppResult<Option<Submission>> {
        Ok(self.rows.lock().unwrap().get(id).cloned())
    }

    async fn list_by_user(
        &self,
        user_id: &Uuid,
        pagination: Pagination,
    ) -> AppResult<(Vec<Submission>, i64)> {
        Ok(self.page(|s| s.user_id == *user_id, pagination))
    }

    async fn list_by_problem(
        &self,
        problem_id: &Uuid,
        pagination: Pagination,
    ) -> AppResult<(Vec<Submission>, i64)> {
        Ok(self.page(|s| s.problem_id == *problem_id, pagination))
    }

    async fn aggregate_for_problem(&self, problem_id: &Uuid) -> AppResult<SubmissionAggregate> {
        let rows = self.rows.lock().unwrap();
        let terminal: Vec<&Submission> = rows
            .values()
            .filter(|s| s.problem_id == *problem_id && s.status.is_terminal())
            .collect();
        let measured: Vec<&&Submission> =
            terminal.iter().filter(|s| s.status.is_measured()).collect();

        let mean = |values: Vec<i32>| {
            (!values.is_empty())
                .then(|| values.iter().map(|v| *v as f64).sum::<f64>() / values.len() as f64)
        };

        Ok(SubmissionAggregate {
            total: terminal.len() as i64,
            accepted: terminal
                .iter()
                .filter(|s| s.status == SubmissionStatus::Accepted)
                .count() as i64,
            avg_time_ms: mean(measured.iter().filter_map(|s| s.execution_time_ms).collect()),
            avg_memory_mb: mean(measured.iter().filter_map(|s| s.memory_used_mb).collect()),
        })
    }

    async fn fail_stale(&self, older_than: DateTime<Utc>, message: &str) -> AppResult<u64> {
        let mut rows = self.rows.lock().unwrap();
        let mut closed = 0;
        for row in rows.values_mut() {
            if !row.status.is_terminal() && row.updated_at < older_than {
                row.status = SubmissionStatus::InternalError;
                row.error_message = Some(message.to_string());
                row.updated_at = Utc::now();
                closed += 1;
            }
        }
        Ok(closed)
    }
}

impl InMemorySubmissions {
    fn page(
        &self,
        keep: impl Fn(&Submission) -> bool,
        pagination: Pagination,
    ) -> (Vec<Submission>, i64) {
        let rows = self.rows.lock().unwrap();
        let mut matching: Vec<Submission> = rows.values().filter(|s| keep(s)).cloned().collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit() as usize)
            .collect();
        (items, total)
    }
}

// =============================================================================
// FAKE JUDGES
// =============================================================================

type Script = dyn Fn(&JudgeRequest) -> Result<JudgeVerdict, JudgeFailure> + Send + Sync;

/// Judge answering from a closure, optionally after a delay, tracking concurrency
pub struct ScriptedJudge {
    script: Box<Script>,
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl ScriptedJudge {
    pub fn new(
        script: impl Fn(&JudgeRequest) -> Result<JudgeVerdict, JudgeFailure> + Send + Sync + 'static,
    ) -> Self {
        Self {
            script: Box::new(script),
            delay: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always returns `status` with one passing result per test
    pub fn verdict(status: SubmissionStatus) -> Self {
        Self::new(move |req| {
            Ok(JudgeVerdict {
                status,
                max_time_ms: 12,
                max_memory_mb: 8,
                error_message: None,
                test_results: passing_results(req),
            })
        })
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Judge for ScriptedJudge {
    async fn grade(&self, request: &JudgeRequest) -> Result<JudgeVerdict, JudgeFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let result = (self.script)(request);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Everything a pipeline test needs, sharing the same in-memory stores
pub struct Harness {
    pub problems: Arc<InMemoryProblems>,
    pub submissions: Arc<InMemorySubmissions>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            problems: Arc::new(InMemoryProblems::default()),
            submissions: Arc::new(InMemorySubmissions::default()),
        }
    }

    pub fn state(&self, judge: Arc<dyn Judge>, max_concurrency: usize) -> codegrade::AppState {
        self.state_with(
            judge,
            JudgeConfig {
                max_concurrency,
                ..JudgeConfig::default()
            },
        )
    }

    pub fn state_with(&self, judge: Arc<dyn Judge>, judge_config: JudgeConfig) -> codegrade::AppState {
        let mut config = test_config(judge_config.max_concurrency);
        config.judge = judge_config;
        codegrade::AppState::from_parts(
            config,
            self.problems.clone(),
            self.submissions.clone(),
            judge,
        )
    }
}

/// Poll `check` until it holds, failing the test after five seconds
pub async fn eventually(mut check: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !check() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached within 5s"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
