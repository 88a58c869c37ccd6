//! Stale submission recovery
//!
//! A process that dies between writing PENDING/IN_PROGRESS and committing a
//! verdict leaves the row behind. The sweeper periodically closes such rows
//! as INTERNAL_ERROR once they are older than the configured threshold.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::time::MissedTickBehavior;
use tracing::{error, warn};

use crate::{
    config::RecoveryConfig,
    constants::STALE_SUBMISSION_MESSAGE,
    db::repositories::SubmissionRepository,
    error::{AppError, AppResult},
};

pub struct StaleSubmissionSweeper {
    submissions: Arc<dyn SubmissionRepository>,
    config: RecoveryConfig,
}

impl StaleSubmissionSweeper {
    pub fn new(submissions: Arc<dyn SubmissionRepository>, config: RecoveryConfig) -> Self {
        Self {
            submissions,
            config,
        }
    }

    /// Close every non-terminal submission untouched since `now - stale_after`
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let stale_after = chrono::Duration::from_std(self.config.stale_after)
            .map_err(|e| AppError::Configuration(e.to_string()))?;

        self.submissions
            .fail_stale(now - stale_after, STALE_SUBMISSION_MESSAGE)
            .await
    }

    /// Sweep forever on the configured interval
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.config.sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            match self.sweep_once(Utc::now()).await {
                Ok(0) => {}
                Ok(closed) => warn!(closed, "Closed stranded submissions as INTERNAL_ERROR"),
                Err(e) => error!(error = %e, "Stale submission sweep failed"),
            }
        }
    }
}
