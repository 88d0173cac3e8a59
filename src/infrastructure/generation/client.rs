use async_trait::async_trait;
use reqwest::{header, Client as ReqwestClient, Response};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::rate_limiter::GenerationRateLimiter;
use super::retry::RetryPolicy;
use super::types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use crate::domain::errors::GenerationError;
use crate::domain::models::Config;
use crate::domain::ports::{GenerationClient, GenerationRequest};
use crate::infrastructure::logging::{redact_secret, scrub_secrets};

/// Environment variable consulted when no API key is configured.
pub const API_KEY_ENV: &str = "MISTRAL_API_KEY";

/// Configuration for the chat-completions HTTP client
#[derive(Debug, Clone)]
pub struct ChatCompletionsConfig {
    /// Bearer token; requests are sent unauthenticated when absent
    pub api_key: Option<String>,

    /// Base URL, without the `/v1/chat/completions` suffix
    pub base_url: String,

    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    pub rate_limit_rps: f64,
    pub burst_size: u32,

    pub retry: RetryPolicy,
}

impl ChatCompletionsConfig {
    /// Build from the application config, falling back to `MISTRAL_API_KEY` for the key.
    pub fn from_config(config: &Config) -> Self {
        let api_key = config
            .generation
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty());

        Self {
            api_key,
            base_url: config.generation.base_url.trim_end_matches('/').to_string(),
            model: config.generation.model.clone(),
            temperature: config.generation.temperature,
            max_tokens: config.generation.max_tokens,
            timeout_secs: config.generation.timeout_secs,
            rate_limit_rps: config.rate_limit.requests_per_second,
            burst_size: config.rate_limit.burst_size,
            retry: RetryPolicy::from(&config.retry),
        }
    }
}

/// HTTP client for an OpenAI-compatible chat-completions endpoint
///
/// Provides:
/// - Connection pooling and reuse
/// - Rate limiting via `governor`
/// - Exponential backoff retry on 429 and 5xx
/// - Typed error classification
pub struct ChatCompletionsClient {
    http_client: ReqwestClient,
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    rate_limiter: GenerationRateLimiter,
    retry_policy: RetryPolicy,
}

impl ChatCompletionsClient {
    pub fn new(config: ChatCompletionsConfig) -> Result<Self, GenerationError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        match config.api_key.as_deref() {
            Some(key) => {
                let mut value = header::HeaderValue::from_str(&format!("Bearer {key}"))
                    .map_err(|e| {
                        GenerationError::Configuration(format!("Invalid API key: {e}"))
                    })?;
                value.set_sensitive(true);
                headers.insert(header::AUTHORIZATION, value);
            }
            None => warn!(
                env = API_KEY_ENV,
                "no generation API key configured, requests will be rejected"
            ),
        }

        info!(
            base_url = %config.base_url,
            model = %config.model,
            rate_limit_rps = config.rate_limit_rps,
            timeout_secs = config.timeout_secs,
            api_key = %config.api_key.as_deref().map_or_else(|| "<unset>".to_string(), redact_secret),
            "initializing generation client"
        );

        let http_client = ReqwestClient::builder()
            .pool_max_idle_per_host(10)
            .timeout(Duration::from_secs(config.timeout_secs))
            .tcp_nodelay(true)
            .default_headers(headers)
            .build()
            .map_err(|e| GenerationError::Configuration(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: format!("{}/v1/chat/completions", config.base_url),
            model: config.model,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            rate_limiter: GenerationRateLimiter::new(config.rate_limit_rps, config.burst_size),
            retry_policy: config.retry,
        })
    }

    fn build_request(&self, request: GenerationRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: request.model.unwrap_or_else(|| self.model.clone()),
            messages: vec![ChatMessage::user(request.prompt)],
            temperature: request.temperature.unwrap_or(self.temperature),
            max_tokens: request.max_tokens.unwrap_or(self.max_tokens),
        }
    }

    /// Execute a single request (called by retry logic)
    async fn send_once(&self, body: &ChatCompletionRequest) -> Result<String, GenerationError> {
        self.rate_limiter.acquire().await;

        debug!(endpoint = %self.endpoint, "POST chat completion");
        let response = self.http_client.post(&self.endpoint).json(body).send().await?;

        Self::handle_response(response).await
    }

    async fn handle_response(response: Response) -> Result<String, GenerationError> {
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error body".to_string());
            let body = scrub_secrets(&body);
            warn!(status = status.as_u16(), body = %body, "generation API error");
            return Err(GenerationError::from_status(status.as_u16(), body));
        }

        let parsed: ChatCompletionResponse = response.json().await?;
        parsed.into_content().ok_or_else(|| {
            GenerationError::MalformedResponse(
                "response has no choices[0].message.content".to_string(),
            )
        })
    }
}

#[async_trait]
impl GenerationClient for ChatCompletionsClient {
    #[instrument(skip(self, request), fields(prompt_len = request.prompt.len()))]
    async fn generate_code(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        let body = self.build_request(request);

        let result = self
            .retry_policy
            .execute(|| self.send_once(&body))
            .await;

        match &result {
            Ok(content) => debug!(content_len = content.len(), "generation succeeded"),
            Err(err) => warn!(error = %err, "generation failed"),
        }

        result
    }
}
