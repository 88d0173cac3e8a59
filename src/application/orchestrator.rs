//! Orchestration context.
//!
//! One [`Orchestrator`] per process owns the registry, the generator, the
//! self-healer and the dispatcher, all built from a single [`Config`].

use anyhow::{Context, Result};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::adapters::handlers::{CodeHandler, VisionHandler, VoiceHandler, WebHandler};
use crate::domain::models::{Config, GenerationStatus, TaskContext, TaskRequest};
use crate::domain::ports::{GenerationClient, Handler, TaskMemory};
use crate::infrastructure::generation::{ChatCompletionsClient, ChatCompletionsConfig};
use crate::infrastructure::memory::task_memory_from_config;
use crate::services::{Dispatcher, HandlerGenerator, HandlerRegistry, SelfHealer, WriteGuard};

/// Wired routing and recovery core.
pub struct Orchestrator {
    registry: Arc<HandlerRegistry>,
    generator: Arc<HandlerGenerator>,
    dispatcher: Dispatcher,
}

impl Orchestrator {
    /// Build with the HTTP generation client and the configured memory sink.
    pub async fn from_config(config: Config) -> Result<Self> {
        let client = ChatCompletionsClient::new(ChatCompletionsConfig::from_config(&config))
            .context("Failed to build generation client")?;
        let memory = task_memory_from_config(&config.memory)?;
        Self::new(config, Arc::new(client), memory).await
    }

    /// Build with explicit collaborators and register the built-in handlers.
    pub async fn new(
        config: Config,
        client: Arc<dyn GenerationClient>,
        memory: Arc<dyn TaskMemory>,
    ) -> Result<Self> {
        let registry = Arc::new(HandlerRegistry::new());
        let generator = Arc::new(HandlerGenerator::new(
            Arc::clone(&client),
            config.handlers_path(),
        ));

        let guard = WriteGuard::new(&config.project_root, &config.writable_dirs).with_context(|| {
            format!(
                "Failed to set up writable directories under {}",
                config.project_root.display()
            )
        })?;
        let healer = Arc::new(SelfHealer::new(
            Arc::clone(&client),
            Arc::clone(&generator),
            Arc::clone(&registry),
            guard,
        ));
        let dispatcher = Dispatcher::new(Arc::clone(&registry), healer, memory);

        let builtins: [(&str, Arc<dyn Handler>); 4] = [
            ("web", Arc::new(WebHandler::new())),
            (
                "code",
                Arc::new(CodeHandler::new(
                    Arc::clone(&client),
                    Arc::clone(&generator),
                    config.code_exec.clone(),
                )),
            ),
            ("voice", Arc::new(VoiceHandler::new())),
            ("vision", Arc::new(VisionHandler::new()?)),
        ];
        for (key, handler) in builtins {
            dispatcher.add_agent(key, handler).await;
        }

        info!(
            project_root = %config.project_root.display(),
            handlers = registry.len().await,
            "orchestrator ready"
        );

        Ok(Self {
            registry,
            generator,
            dispatcher,
        })
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    pub fn generator(&self) -> &Arc<HandlerGenerator> {
        &self.generator
    }

    pub async fn delegate(&self, task: &str, context: TaskContext) -> Value {
        self.dispatcher
            .delegate(TaskRequest::with_context(task, context))
            .await
    }

    pub async fn add_agent(&self, key: &str, handler: Arc<dyn Handler>) -> String {
        self.dispatcher.add_agent(key, handler).await
    }

    pub async fn generate(&self, capability: &str, requirements: &str) -> GenerationStatus {
        self.generator.generate(capability, requirements).await
    }

    pub async fn activate(&self, capability: &str) -> GenerationStatus {
        self.generator.activate(capability).await.status()
    }

    pub async fn register(
        &self,
        capability: &str,
        requirements: &str,
        key: Option<&str>,
    ) -> GenerationStatus {
        self.generator
            .register(&self.registry, capability, requirements, key)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::NullTaskMemory;
    use crate::infrastructure::generation::MockGenerationClient;
    use serde_json::json;
    use tempfile::TempDir;

    async fn orchestrator(client: Arc<MockGenerationClient>) -> (TempDir, Orchestrator) {
        let dir = TempDir::new().unwrap();
        let config = Config::for_project(dir.path());
        let orchestrator = Orchestrator::new(config, client, Arc::new(NullTaskMemory::new()))
            .await
            .unwrap();
        (dir, orchestrator)
    }

    #[tokio::test]
    async fn test_builtins_registered() {
        let (_dir, orchestrator) = orchestrator(Arc::new(MockGenerationClient::new())).await;

        assert_eq!(
            orchestrator.registry().keys().await,
            vec!["code", "vision", "voice", "web"]
        );
    }

    #[tokio::test]
    async fn test_delegate_book_flight() {
        let (_dir, orchestrator) = orchestrator(Arc::new(MockGenerationClient::new())).await;

        let result = orchestrator
            .delegate("book flight from SFO to NYC", TaskContext::new())
            .await;

        assert_eq!(result["status"], "simulated");
        assert_eq!(result["flight"]["to"], "NYC");
    }

    #[tokio::test]
    async fn test_vision_only_through_hint() {
        let (_dir, orchestrator) = orchestrator(Arc::new(MockGenerationClient::new())).await;
        let mut context = TaskContext::new();
        context.insert("agent".into(), json!("vision"));

        let result = orchestrator.delegate("take a screenshot", context).await;

        assert!(result["hint"].as_str().unwrap().contains("inspect"));
    }

    #[tokio::test]
    async fn test_missing_project_root_fails() {
        let config = Config::for_project("/definitely/not/here/omniroute");
        let result = Orchestrator::new(
            config,
            Arc::new(MockGenerationClient::new()),
            Arc::new(NullTaskMemory::new()),
        )
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_project_root_as_writable_dir_fails() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::for_project(dir.path());
        config.writable_dirs = vec!["handlers".into(), ".".into()];

        let result = Orchestrator::new(
            config,
            Arc::new(MockGenerationClient::new()),
            Arc::new(NullTaskMemory::new()),
        )
        .await;

        let err = result.err().unwrap();
        assert!(format!("{err:#}").contains("subdirectory of the project root"));
    }

    #[tokio::test]
    async fn test_generator_writes_under_configured_handlers_dir() {
        let (dir, orchestrator) = orchestrator(Arc::new(MockGenerationClient::new())).await;

        assert_eq!(orchestrator.generator().handlers_dir(), dir.path().join("handlers"));
    }
}
