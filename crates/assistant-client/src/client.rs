use std::time::Duration;

use anyhow::{Result, bail};
use serde::Deserialize;

use crate::retry::{RetryConfig, retry_post};

/// Reply used when no endpoint is configured.
pub const FALLBACK_REPLY: &str =
    "I'm here to help with your studies. Could you provide more details?";

#[derive(Debug, Deserialize)]
struct AskResponse {
    reply: String,
}

/// Single request/response assistant client.
pub struct AssistantClient {
    client: reqwest::Client,
    endpoint: Option<String>,
    retry: RetryConfig,
}

impl AssistantClient {
    /// Create a client. `endpoint` is the full URL of the assistant service;
    /// `None` keeps the assistant fully local.
    pub fn new(endpoint: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint
                .map(|e| e.trim().trim_end_matches('/').to_string())
                .filter(|e| !e.is_empty()),
            retry: RetryConfig::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// Ask the assistant a question.
    pub async fn ask(&self, prompt: &str) -> Result<String> {
        let Some(endpoint) = &self.endpoint else {
            return Ok(FALLBACK_REPLY.to_string());
        };

        let body = serde_json::json!({ "prompt": prompt });
        let resp = retry_post(&self.client, endpoint, &body, &self.retry).await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("assistant endpoint returned HTTP {status}: {body}");
        }

        let parsed: AskResponse = resp.json().await?;
        Ok(parsed.reply)
    }
}
