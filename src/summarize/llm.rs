// LLM completion capability with timeout and bounded retries
use crate::config::LlmConfig;
use crate::types::{PaperError, Result};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use std::time::Duration;

const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LlmError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    /// Transient failures only; auth and malformed responses never retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Auth(_) | LlmError::InvalidResponse(_) => false,
            LlmError::RateLimited { .. } | LlmError::Timeout | LlmError::Network(_) => true,
            LlmError::Api { status, .. } => *status >= 500 || *status == 408 || *status == 429,
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> std::result::Result<String, LlmError>;
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
            attempt_timeout: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            attempt_timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Exponential backoff: base, 2*base, 4*base... capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .checked_mul(1u32 << attempt.min(16))
            .unwrap_or(MAX_BACKOFF)
            .min(MAX_BACKOFF)
    }
}

/// Run one completion under the policy's per-attempt timeout and retry budget.
pub async fn complete_with_retry(
    client: &dyn LlmClient,
    request: &CompletionRequest,
    policy: &RetryPolicy,
) -> std::result::Result<String, LlmError> {
    let mut attempt = 0;
    loop {
        let result = match tokio::time::timeout(policy.attempt_timeout, client.complete(request.clone())).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout),
        };

        match result {
            Ok(text) => return Ok(text),
            Err(err) if err.is_retryable() && attempt < policy.max_retries => {
                let mut delay = policy.delay_for(attempt);
                if let LlmError::RateLimited { retry_after_secs } = &err {
                    delay = delay.max(Duration::from_secs(*retry_after_secs)).min(MAX_BACKOFF);
                }
                warn!("LLM call failed ({}), retry {} in {:?}", err, attempt + 1, delay);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// OpenAI-compatible `/v1/completions` endpoint.
pub struct OpenAiCompletionClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiCompletionClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PaperError::Config(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/completions", self.base_url)
    }
}

#[async_trait]
impl LlmClient for OpenAiCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> std::result::Result<String, LlmError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| LlmError::Auth("no API key configured".to_string()))?;

        let body = serde_json::json!({
            "model": self.model,
            "prompt": request.prompt,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });

        debug!("POST {} ({} prompt chars)", self.endpoint(), request.prompt.len());
        let resp = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&body)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        if !status.is_success() {
            let retry_after_secs = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(1);
            let message = resp.text().await.unwrap_or_default();
            return Err(classify_status(status, message, retry_after_secs));
        }

        let json: serde_json::Value = resp.json().await.map_err(from_reqwest)?;
        completion_text(&json)
    }
}

fn from_reqwest(err: reqwest::Error) -> LlmError {
    if err.is_timeout() {
        LlmError::Timeout
    } else if err.is_decode() {
        LlmError::InvalidResponse(err.to_string())
    } else {
        LlmError::Network(err.to_string())
    }
}

fn classify_status(status: StatusCode, message: String, retry_after_secs: u64) -> LlmError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::Auth(message),
        StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited { retry_after_secs },
        _ => LlmError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

fn completion_text(json: &serde_json::Value) -> std::result::Result<String, LlmError> {
    json["choices"][0]["text"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| LlmError::InvalidResponse("missing choices[0].text".to_string()))
}
