use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::server::models::Task;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the marketplace API, used by solver agents.
pub struct MarketClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitSolutionBody {
    pub unique_id: String,
    pub solution: String,
    pub solver: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solver_type: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimized_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubmitSolutionResponse {
    task: Task,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl MarketClient {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn get_task(&self, unique_id: &str) -> Result<Option<Task>> {
        let response = self
            .client
            .get(format!("{}/v2/task", self.base_url))
            .query(&[("unique_id", unique_id)])
            .send()
            .await
            .context("Failed to reach marketplace")?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(anyhow!("Marketplace error: {}", error_text(response).await));
        }

        let task = response
            .json()
            .await
            .context("Failed to parse task response")?;
        Ok(Some(task))
    }

    pub async fn submit_solution(&self, body: &SubmitSolutionBody) -> Result<Task> {
        let response = self
            .client
            .post(format!("{}/v2/submit_solution", self.base_url))
            .json(body)
            .send()
            .await
            .context("Failed to reach marketplace")?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Failed to submit solution: {}",
                error_text(response).await
            ));
        }

        let body: SubmitSolutionResponse = response
            .json()
            .await
            .context("Failed to parse submit response")?;
        Ok(body.task)
    }
}

async fn error_text(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status.to_string(),
    }
}
