//! Application state management
//!
//! This module contains the shared application state that is passed
//! to all request handlers via Axum's State extractor.

use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    config::Config,
    db::repositories::{
        PgProblemRepository, PgSubmissionRepository, ProblemRepository, SubmissionRepository,
    },
    judge::{HttpJudgeClient, Judge},
    services::{
        ProblemCatalog, StaleSubmissionSweeper, StatisticsService, SubmissionOrchestrator,
        SubmissionService,
    },
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

/// Inner state (wrapped in Arc for cheap cloning)
struct AppStateInner {
    /// Present when backed by Postgres; used by the health check
    db: Option<PgPool>,
    config: Config,
    submissions: Arc<dyn SubmissionRepository>,
    catalog: ProblemCatalog,
    orchestrator: SubmissionOrchestrator,
    submission_service: SubmissionService,
    statistics: StatisticsService,
}

impl AppState {
    /// Wire the Postgres repositories and the HTTP judge client
    pub fn new(db: PgPool, config: Config) -> anyhow::Result<Self> {
        let problems: Arc<dyn ProblemRepository> = Arc::new(PgProblemRepository::new(db.clone()));
        let submissions: Arc<dyn SubmissionRepository> =
            Arc::new(PgSubmissionRepository::new(db.clone()));
        let judge: Arc<dyn Judge> = Arc::new(HttpJudgeClient::new(&config.judge)?);

        Ok(Self::build(Some(db), config, problems, submissions, judge))
    }

    /// Wire arbitrary backends; tests use in-memory repositories and a fake judge
    pub fn from_parts(
        config: Config,
        problems: Arc<dyn ProblemRepository>,
        submissions: Arc<dyn SubmissionRepository>,
        judge: Arc<dyn Judge>,
    ) -> Self {
        Self::build(None, config, problems, submissions, judge)
    }

    fn build(
        db: Option<PgPool>,
        config: Config,
        problems: Arc<dyn ProblemRepository>,
        submissions: Arc<dyn SubmissionRepository>,
        judge: Arc<dyn Judge>,
    ) -> Self {
        let catalog = ProblemCatalog::new(problems);
        let orchestrator = SubmissionOrchestrator::new(
            catalog.clone(),
            submissions.clone(),
            judge,
            config.judge.max_concurrency,
            config.judge.queue_timeout,
        );
        let submission_service = SubmissionService::new(catalog.clone(), submissions.clone());
        let statistics = StatisticsService::new(catalog.clone(), submissions.clone());

        Self {
            inner: Arc::new(AppStateInner {
                db,
                config,
                submissions,
                catalog,
                orchestrator,
                submission_service,
                statistics,
            }),
        }
    }

    pub fn db(&self) -> Option<&PgPool> {
        self.inner.db.as_ref()
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn catalog(&self) -> &ProblemCatalog {
        &self.inner.catalog
    }

    pub fn orchestrator(&self) -> &SubmissionOrchestrator {
        &self.inner.orchestrator
    }

    pub fn submissions(&self) -> &SubmissionService {
        &self.inner.submission_service
    }

    pub fn statistics(&self) -> &StatisticsService {
        &self.inner.statistics
    }

    /// Background sweeper sharing this state's submission store
    pub fn stale_sweeper(&self) -> StaleSubmissionSweeper {
        StaleSubmissionSweeper::new(
            self.inner.submissions.clone(),
            self.inner.config.recovery.clone(),
        )
    }
}
