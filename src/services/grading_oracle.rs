use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    config::Config,
    constants::prompts::{grading_user_prompt, GRADING_SYSTEM_PROMPT},
    errors::{AppError, AppResult},
};

const BASE_BACKOFF_MS: u64 = 250;
const MAX_BACKOFF_MS: u64 = 30_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleVerdict {
    True,
    Maybe,
    False,
}

impl OracleVerdict {
    /// Substring match on the lowercased reply: `true` wins over `maybe`,
    /// anything else is `False`.
    pub fn from_response(text: &str) -> Self {
        let text = text.trim().to_lowercase();
        if text.contains("true") {
            OracleVerdict::True
        } else if text.contains("maybe") {
            OracleVerdict::Maybe
        } else {
            OracleVerdict::False
        }
    }

    /// Share of the question's points this verdict earns.
    pub fn credit(self) -> f64 {
        match self {
            OracleVerdict::True => 1.0,
            OracleVerdict::Maybe => 0.5,
            OracleVerdict::False => 0.0,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GradingOracle: Send + Sync {
    async fn grade(&self, question: &str, answer: &str) -> AppResult<OracleVerdict>;
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

enum CallError {
    Retryable(String),
    Fatal(String),
}

/// Grades open-ended answers through an OpenAI-compatible chat completions endpoint.
pub struct OpenAiGradingOracle {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: SecretString,
    max_retries: u32,
}

impl OpenAiGradingOracle {
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: SecretString,
        timeout: Duration,
        max_retries: u32,
    ) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::InternalError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
            max_retries,
        })
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        Self::new(
            &config.oracle_base_url,
            &config.oracle_model,
            config.openai_api_key.clone(),
            Duration::from_secs(config.oracle_timeout_secs),
            config.oracle_max_retries,
        )
    }

    async fn call(&self, question: &str, answer: &str) -> Result<String, CallError> {
        let body = json!({
            "model": self.model,
            "temperature": 0.0,
            "max_tokens": 50,
            "messages": [
                { "role": "system", "content": GRADING_SYSTEM_PROMPT },
                { "role": "user", "content": grading_user_prompt(question, answer) },
            ],
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| CallError::Retryable(format!("request failed: {}", e)))?;

        let status = response.status();
        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(CallError::Retryable(format!("oracle returned {}", status)));
        }
        if !status.is_success() {
            return Err(CallError::Fatal(format!("oracle returned {}", status)));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| CallError::Fatal(format!("unreadable oracle response: {}", e)))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| CallError::Fatal("oracle response had no content".to_string()))
    }
}

#[async_trait]
impl GradingOracle for OpenAiGradingOracle {
    async fn grade(&self, question: &str, answer: &str) -> AppResult<OracleVerdict> {
        let mut attempt = 0;
        loop {
            match self.call(question, answer).await {
                Ok(text) => {
                    let verdict = OracleVerdict::from_response(&text);
                    log::debug!("Oracle replied {:?} -> {:?}", text.trim(), verdict);
                    return Ok(verdict);
                }
                Err(CallError::Retryable(reason)) if attempt < self.max_retries => {
                    let backoff = backoff_for(attempt);
                    log::warn!(
                        "Grading oracle attempt {} failed ({}), retrying in {:?}",
                        attempt + 1,
                        reason,
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(CallError::Retryable(reason)) | Err(CallError::Fatal(reason)) => {
                    log::error!("Grading oracle unavailable: {}", reason);
                    return Err(AppError::OracleUnavailable(reason));
                }
            }
        }
    }
}

fn backoff_for(attempt: u32) -> Duration {
    let millis = BASE_BACKOFF_MS.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(millis.min(MAX_BACKOFF_MS))
}
