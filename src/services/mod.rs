//! Business logic services

pub mod access_policy;
pub mod orchestrator;
pub mod problem_catalog;
pub mod recovery;
pub mod statistics_service;
pub mod submission_service;

pub use access_policy::{RolePolicy, policy_for};
pub use orchestrator::{SubmissionOrchestrator, SubmissionOutcome, SubmitCommand};
pub use problem_catalog::{GradingFixture, ProblemCatalog, ProblemView};
pub use recovery::StaleSubmissionSweeper;
pub use statistics_service::StatisticsService;
pub use submission_service::SubmissionService;
