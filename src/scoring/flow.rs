use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::scoring::{DailyScore, DiaryDoc, ScoringError, SentimentScorer};

/// HTTP client for the external scoring flow. Sends the whole week's
/// documents in one request; the flow returns one score per date.
pub struct FlowScorer {
    client: reqwest::Client,
    endpoint: String,
    flow_id: String,
    flow_alias: String,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct FlowRequest<'a> {
    flow_id: &'a str,
    flow_alias: &'a str,
    documents: &'a [DiaryDoc],
}

#[derive(Debug, Deserialize)]
struct FlowResponse {
    daily_scores: Vec<DailyScore>,
}

impl FlowScorer {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.scoring_endpoint.clone(),
            flow_id: config.scoring_flow_id.clone(),
            flow_alias: config.scoring_flow_alias.clone(),
            timeout: Duration::from_secs(config.scoring_timeout_secs),
        }
    }
}

#[async_trait]
impl SentimentScorer for FlowScorer {
    async fn score(&self, documents: &[DiaryDoc]) -> Result<Vec<DailyScore>, ScoringError> {
        if self.endpoint.is_empty() {
            return Err(ScoringError::Unavailable(
                "scoring endpoint not configured".into(),
            ));
        }

        let request = FlowRequest {
            flow_id: &self.flow_id,
            flow_alias: &self.flow_alias,
            documents,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ScoringError::Timeout
                } else {
                    ScoringError::Unavailable(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(ScoringError::Unavailable(format!(
                "scoring flow returned {}",
                response.status()
            )));
        }

        let parsed: FlowResponse = response
            .json()
            .await
            .map_err(|e| ScoringError::Unavailable(format!("invalid flow response: {}", e)))?;

        Ok(parsed.daily_scores)
    }
}
