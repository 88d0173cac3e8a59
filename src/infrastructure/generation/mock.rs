use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::domain::errors::GenerationError;
use crate::domain::ports::{GenerationClient, GenerationRequest};

/// Scripted generation client for tests and offline runs
///
/// Replies are consumed in order; once the script is exhausted every call
/// fails with `MalformedResponse`. Every prompt is recorded.
#[derive(Debug, Default)]
pub struct MockGenerationClient {
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerationClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Client whose replies are the given texts, in order.
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let client = Self::new();
        for reply in replies {
            client.push_reply(reply);
        }
        client
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.push(Ok(reply.into()));
    }

    pub fn push_error(&self, error: GenerationError) {
        self.push(Err(error));
    }

    fn push(&self, entry: Result<String, GenerationError>) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(entry);
        }
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|prompts| prompts.len()).unwrap_or(0)
    }
}

#[async_trait]
impl GenerationClient for MockGenerationClient {
    async fn generate_code(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(request.prompt);
        }

        self.replies
            .lock()
            .ok()
            .and_then(|mut replies| replies.pop_front())
            .unwrap_or_else(|| {
                Err(GenerationError::MalformedResponse(
                    "mock generation client has no scripted reply".to_string(),
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replies_in_order_then_exhausted() {
        let client = MockGenerationClient::with_replies(["one", "two"]);

        assert_eq!(
            client.generate_code(GenerationRequest::new("a")).await.unwrap(),
            "one"
        );
        assert_eq!(
            client.generate_code(GenerationRequest::new("b")).await.unwrap(),
            "two"
        );
        assert!(client.generate_code(GenerationRequest::new("c")).await.is_err());
        assert_eq!(client.prompts(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_scripted_error() {
        let client = MockGenerationClient::new();
        client.push_error(GenerationError::RateLimitExceeded);

        let result = client.generate_code(GenerationRequest::new("x")).await;
        assert!(matches!(result, Err(GenerationError::RateLimitExceeded)));
    }

    #[tokio::test]
    async fn test_improve_code_builds_prompt() {
        let client = MockGenerationClient::with_replies(["better"]);

        let improved = client.improve_code("print(1)", "print two").await.unwrap();

        assert_eq!(improved, "better");
        let prompt = &client.prompts()[0];
        assert!(prompt.contains("print two"));
        assert!(prompt.contains("print(1)"));
    }
}
