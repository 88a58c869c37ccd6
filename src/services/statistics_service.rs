//! Per-problem statistics over terminal submissions

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::repositories::SubmissionRepository,
    error::AppResult,
    models::{ProblemStatistics, Requester, SubmissionAggregate},
};

use super::problem_catalog::ProblemCatalog;

#[derive(Clone)]
pub struct StatisticsService {
    catalog: ProblemCatalog,
    submissions: Arc<dyn SubmissionRepository>,
}

impl StatisticsService {
    pub fn new(catalog: ProblemCatalog, submissions: Arc<dyn SubmissionRepository>) -> Self {
        Self {
            catalog,
            submissions,
        }
    }

    /// Aggregate for a problem, no access check
    pub async fn stats_for(&self, problem_id: &Uuid) -> AppResult<ProblemStatistics> {
        let aggregate = self.submissions.aggregate_for_problem(problem_id).await?;
        Ok(summarize(*problem_id, &aggregate))
    }

    /// Aggregate for a problem the requester authored (or any, for admins)
    pub async fn stats_visible_to(
        &self,
        problem_id: &Uuid,
        requester: &Requester,
    ) -> AppResult<ProblemStatistics> {
        self.catalog.find_inspectable(problem_id, requester).await?;
        self.stats_for(problem_id).await
    }
}

/// Derive rates and rounded averages from the raw aggregate
pub fn summarize(problem_id: Uuid, aggregate: &SubmissionAggregate) -> ProblemStatistics {
    let success_rate = if aggregate.total == 0 {
        0.0
    } else {
        round2(aggregate.accepted as f64 / aggregate.total as f64 * 100.0)
    };

    ProblemStatistics {
        problem_id,
        total: aggregate.total,
        accepted: aggregate.accepted,
        success_rate,
        avg_time_ms: aggregate.avg_time_ms.map(round2),
        avg_memory_mb: aggregate.avg_memory_mb.map(round2),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::repositories::{MockProblemRepository, MockSubmissionRepository},
        error::AppError,
        models::Role,
    };

    #[test]
    fn test_empty_problem_has_zero_rate_and_no_averages() {
        let stats = summarize(Uuid::nil(), &SubmissionAggregate::default());

        assert_eq!(stats.total, 0);
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.avg_time_ms, None);
        assert_eq!(stats.avg_memory_mb, None);
    }

    #[test]
    fn test_rate_is_rounded_to_two_decimals() {
        let stats = summarize(
            Uuid::nil(),
            &SubmissionAggregate {
                total: 10,
                accepted: 7,
                avg_time_ms: None,
                avg_memory_mb: None,
            },
        );
        assert_eq!(stats.success_rate, 70.0);

        // 20 ACCEPTED at 150 ms and 10 WRONG_ANSWER at 300 ms
        let stats = summarize(
            Uuid::nil(),
            &SubmissionAggregate {
                total: 30,
                accepted: 20,
                avg_time_ms: Some((20.0 * 150.0 + 10.0 * 300.0) / 30.0),
                avg_memory_mb: Some(33.333_333),
            },
        );
        assert_eq!(stats.success_rate, 66.67);
        assert_eq!(stats.avg_time_ms, Some(200.0));
        assert_eq!(stats.avg_memory_mb, Some(33.33));
    }

    #[tokio::test]
    async fn test_students_cannot_read_statistics() {
        use chrono::Utc;

        use crate::models::{CheckerType, Difficulty, Problem};

        let problem = Problem {
            id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            title: "Stats".to_string(),
            slug: "stats".to_string(),
            description: String::new(),
            time_limit_ms: 1000,
            memory_limit_mb: 64,
            difficulty: Difficulty::Easy,
            checker_type: CheckerType::Exact,
            is_public: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let problem_id = problem.id;
        let author_id = problem.author_id;

        let mut problems = MockProblemRepository::new();
        problems
            .expect_find_by_id()
            .returning(move |_| Ok(Some(problem.clone())));
        let mut subs = MockSubmissionRepository::new();
        subs.expect_aggregate_for_problem().times(1).returning(|_| {
            Ok(SubmissionAggregate {
                total: 4,
                accepted: 1,
                avg_time_ms: Some(10.0),
                avg_memory_mb: Some(2.0),
            })
        });

        let service = StatisticsService::new(
            ProblemCatalog::new(Arc::new(problems)),
            Arc::new(subs),
        );

        let err = service
            .stats_visible_to(&problem_id, &Requester::student(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let stats = service
            .stats_visible_to(&problem_id, &Requester::new(author_id, Role::Teacher))
            .await
            .unwrap();
        assert_eq!(stats.success_rate, 25.0);
    }
}
