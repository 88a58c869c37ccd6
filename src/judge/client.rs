//! HTTP client for the judge engine

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::{
    config::JudgeConfig,
    constants::{JUDGE_DIAGNOSTIC_BODY_LIMIT, MAX_JUDGE_RESPONSE_BYTES},
};

use super::{Judge, JudgeFailure, JudgeRequest, JudgeResponse, JudgeVerdict};

/// Posts grading requests as JSON to the configured endpoint
#[derive(Clone)]
pub struct HttpJudgeClient {
    http_client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpJudgeClient {
    pub fn new(config: &JudgeConfig) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http_client,
            endpoint: config.url.clone(),
            timeout: config.timeout,
        })
    }

    fn transport_failure(&self, err: reqwest::Error) -> JudgeFailure {
        // A connect timeout is also `is_timeout()`, but the judge never saw the call
        if err.is_timeout() && !err.is_connect() {
            return JudgeFailure::Timeout(self.timeout);
        }
        JudgeFailure::Unavailable {
            endpoint: self.endpoint.clone(),
            reason: err.to_string(),
        }
    }

    async fn exchange(
        &self,
        request: &JudgeRequest,
    ) -> Result<(reqwest::StatusCode, Vec<u8>), JudgeFailure> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_failure(e))?;

        let status = response.status();
        let body = self.read_capped(response).await?;

        Ok((status, body))
    }

    /// Read the body, refusing anything past `MAX_JUDGE_RESPONSE_BYTES`
    async fn read_capped(&self, mut response: reqwest::Response) -> Result<Vec<u8>, JudgeFailure> {
        let oversized = || {
            JudgeFailure::Protocol(format!(
                "response body exceeds {} bytes",
                MAX_JUDGE_RESPONSE_BYTES
            ))
        };

        if response
            .content_length()
            .is_some_and(|len| len > MAX_JUDGE_RESPONSE_BYTES as u64)
        {
            return Err(oversized());
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| self.transport_failure(e))?
        {
            if body.len() + chunk.len() > MAX_JUDGE_RESPONSE_BYTES {
                return Err(oversized());
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

#[async_trait]
impl Judge for HttpJudgeClient {
    #[instrument(skip_all, fields(submission_id = %request.submission_id, tests = request.test_cases.len()))]
    async fn grade(&self, request: &JudgeRequest) -> Result<JudgeVerdict, JudgeFailure> {
        let started = Instant::now();

        // The deadline covers connect, send and the full body read
        let (status, body) = tokio::time::timeout(self.timeout, self.exchange(request))
            .await
            .map_err(|_| JudgeFailure::Timeout(self.timeout))??;

        if !status.is_success() {
            return Err(JudgeFailure::HttpStatus {
                status: status.as_u16(),
                body: excerpt(&body),
            });
        }

        let response: JudgeResponse = serde_json::from_slice(&body)
            .map_err(|e| JudgeFailure::Protocol(format!("{}; body: {}", e, excerpt(&body))))?;
        let verdict = response.into_verdict(&request.submission_id)?;

        debug!(
            status = %verdict.status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Judge returned verdict"
        );

        Ok(verdict)
    }
}

fn excerpt(body: &[u8]) -> String {
    let end = body.len().min(JUDGE_DIAGNOSTIC_BODY_LIMIT);
    String::from_utf8_lossy(&body[..end]).into_owned()
}
