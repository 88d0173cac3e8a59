//! Generation service client
//!
//! HTTP client for the chat-completions API with retry and rate limiting,
//! plus a scripted mock for tests.
pub mod client;
pub mod mock;
pub mod rate_limiter;
pub mod retry;
pub mod types;

pub use client::{ChatCompletionsClient, ChatCompletionsConfig, API_KEY_ENV};
pub use mock::MockGenerationClient;
pub use rate_limiter::GenerationRateLimiter;
pub use retry::RetryPolicy;
