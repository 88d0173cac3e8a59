use async_trait::async_trait;

use crate::domain::errors::GenerationError;

/// A single text-generation request.
///
/// Unset sampling options fall back to the client's configured defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }
}

/// Port for the external code/text generation service.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Send `request.prompt` and return the raw completion text.
    async fn generate_code(&self, request: GenerationRequest) -> Result<String, GenerationError>;

    /// Ask the service to improve `code` for the given task description.
    async fn improve_code(&self, code: &str, task: &str) -> Result<String, GenerationError> {
        let prompt = format!(
            "Improve the following code for the task: {task}\n\n\
             Return only the improved code, without explanation.\n\n{code}"
        );
        self.generate_code(GenerationRequest::new(prompt)).await
    }
}
