use std::time::{Duration, Instant};

use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde::Serialize;
use shuxin_core::decision::DECISION_PATH;
use shuxin_core::{
    DecisionCard, DecisionRequest, EmotionalState, ResponseError, fallback_cards,
    parse_decision_response,
};
use tracing::{debug, error, info, warn};

/// Used when neither the environment nor the config file name a base URL.
pub const DEFAULT_API_BASE: &str = "https://shu-xin-api-clean-laln.vercel.app";

/// Hard limit for one decision call, connect to last body byte.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(12);

#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("decision service returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("could not read response body: {0}")]
    Body(#[source] reqwest::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(#[from] ResponseError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeSource {
    Remote,
    Fallback,
}

/// Always renderable: either the service's cards or the local fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionOutcome {
    pub cards: Vec<DecisionCard>,
    pub source: OutcomeSource,
}

/// `{base}/api/decision`, with trailing slashes on `base` dropped.
pub fn decision_url(api_base: &str) -> String {
    format!("{}{}", api_base.trim().trim_end_matches('/'), DECISION_PATH)
}

#[derive(Debug, Clone)]
pub struct DecisionClient {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl DecisionClient {
    pub fn new(api_base: &str, timeout: Duration) -> Result<Self, DecisionError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(DecisionError::Client)?;
        Ok(Self {
            http,
            url: decision_url(api_base),
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// One call, no fallback. Dropping the future cancels the request.
    pub async fn fetch_cards(
        &self,
        request: &DecisionRequest,
    ) -> Result<Vec<DecisionCard>, DecisionError> {
        match tokio::time::timeout(self.timeout, self.exchange(request)).await {
            Ok(res) => res,
            Err(_) => Err(DecisionError::Timeout(self.timeout)),
        }
    }

    async fn exchange(&self, request: &DecisionRequest) -> Result<Vec<DecisionCard>, DecisionError> {
        let resp = self
            .http
            .post(&self.url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .json(request)
            .send()
            .await
            .map_err(|e| self.classify(e, DecisionError::Transport))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DecisionError::Status { status, body });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| self.classify(e, DecisionError::Body))?;
        Ok(parse_decision_response(&body)?)
    }

    fn classify(
        &self,
        err: reqwest::Error,
        otherwise: fn(reqwest::Error) -> DecisionError,
    ) -> DecisionError {
        if err.is_timeout() {
            DecisionError::Timeout(self.timeout)
        } else {
            otherwise(err)
        }
    }

    /// Perform the call and fall back to the local cards on any failure.
    ///
    /// The failure is logged and dropped; callers only ever see cards.
    pub async fn decide(&self, request: &DecisionRequest) -> DecisionOutcome {
        let started = Instant::now();
        debug!(
            url = %self.url,
            state = %request.context.state,
            category = %request.context.category,
            text_chars = request.text.chars().count(),
            "sending decision request"
        );

        match self.fetch_cards(request).await {
            Ok(cards) => {
                info!(
                    cards = cards.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "decision service answered"
                );
                DecisionOutcome {
                    cards,
                    source: OutcomeSource::Remote,
                }
            }
            Err(err) => {
                match &err {
                    DecisionError::Status { status, body } => {
                        error!(status = status.as_u16(), body = %body, "decision service error")
                    }
                    other => warn!(error = %other, "decision request failed"),
                }
                info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "serving local fallback cards"
                );
                let state = EmotionalState::from_label(&request.context.state);
                DecisionOutcome {
                    cards: fallback_cards(&request.text, state),
                    source: OutcomeSource::Fallback,
                }
            }
        }
    }
}
