//! External judge engine
//!
//! The judge runs submitted code in its own sandbox. This module owns the
//! contract with it: the payload we send, the response we accept, and the
//! ways a call can fail. A failure here is an expected outcome, never an
//! [`AppError`](crate::error::AppError); the orchestrator folds it into the
//! submission state machine.

pub mod client;
pub mod payload;

use std::time::Duration;

use async_trait::async_trait;

pub use client::HttpJudgeClient;
pub use payload::{JudgeRequest, JudgeResponse, JudgeTestCase, JudgeVerdict};

/// Anything able to grade a prepared request
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Judge: Send + Sync {
    /// Issue a single call. Implementations never retry.
    async fn grade(&self, request: &JudgeRequest) -> Result<JudgeVerdict, JudgeFailure>;
}

/// Why a judge call produced no verdict
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum JudgeFailure {
    #[error("Judge service is unavailable at {endpoint}: {reason}")]
    Unavailable { endpoint: String, reason: String },

    #[error("Judge did not answer within {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Judge is saturated: no slot became free within {}s", .0.as_secs())]
    Saturated(Duration),

    #[error("Judge answered with HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Judge response is malformed: {0}")]
    Protocol(String),

    #[error("Judge call aborted: {0}")]
    Aborted(String),
}

impl JudgeFailure {
    /// Connect failures, timeouts, saturation and judge-side 5xx; the rest are protocol errors
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Unavailable { .. } | Self::Timeout(_) | Self::Saturated(_) => true,
            Self::HttpStatus { status, .. } => *status >= 500,
            Self::Protocol(_) | Self::Aborted(_) => false,
        }
    }

    /// Short label for structured logs
    pub fn kind(&self) -> &'static str {
        if self.is_transient() {
            "transient"
        } else {
            "protocol"
        }
    }
}
