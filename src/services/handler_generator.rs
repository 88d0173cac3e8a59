//! Dynamic handler generation, activation and registration.
//!
//! Generation asks the [`GenerationClient`] for a handler script, validates
//! its shape and persists it under the handlers directory. Activation is gated
//! by [`FeatureFlag::GeneratedHandlers`] and re-validates the file before
//! loading it. Every step reports through [`GenerationStatus`] instead of
//! returning errors.

use regex::Regex;
use rhai::Engine;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};
use thiserror::Error;
use tracing::{info, instrument, warn};

use super::diagnosis_parser::strip_code_fence;
use super::flags::FeatureFlag;
use super::handler_registry::HandlerRegistry;
use super::handler_script::{
    sandboxed_engine, validate_handler_source, HandlerValidationError, ScriptHandler,
    HANDLER_ARITY, SCRIPT_EXTENSION,
};
use crate::domain::errors::GenerationError;
use crate::domain::models::GenerationStatus;
use crate::domain::ports::{GenerationClient, GenerationRequest, Handler};

/// Suffix appended to a capability name to form its function name.
pub const HANDLER_SUFFIX: &str = "Agent";

static CAPABILITY_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Za-z0-9]*$").expect("valid regex"));

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Invalid capability name '{0}'. Expected a CamelCase identifier like 'Voice' or 'VoiceAgent'.")]
    InvalidName(String),

    #[error("Code generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Validation(#[from] HandlerValidationError),

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Generated handler file does not exist: {0}")]
    MissingArtifact(PathBuf),
}

/// Validated capability name and the identifiers derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityName {
    /// Normalized name without the handler suffix, e.g. `Voice`
    pub name: String,
    /// Script function name, e.g. `VoiceAgent`
    pub class_name: String,
}

impl CapabilityName {
    /// Trim, drop a trailing `Agent`, and require a CamelCase identifier.
    pub fn parse(raw: &str) -> Result<Self, GeneratorError> {
        let trimmed = raw.trim();
        let name = trimmed.strip_suffix(HANDLER_SUFFIX).unwrap_or(trimmed);

        if !CAPABILITY_NAME.is_match(name) {
            return Err(GeneratorError::InvalidName(raw.to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            class_name: format!("{name}{HANDLER_SUFFIX}"),
        })
    }

    /// Default registry key.
    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }

    fn file_name(&self) -> String {
        format!(
            "{}_{}.{SCRIPT_EXTENSION}",
            self.name.to_lowercase(),
            HANDLER_SUFFIX.to_lowercase()
        )
    }
}

/// Result of [`HandlerGenerator::activate`].
pub enum Activation {
    Loaded {
        capability: String,
        file: PathBuf,
        class: String,
        handler: Arc<dyn Handler>,
    },
    /// Gate closed or activation failed
    Declined(GenerationStatus),
}

impl Activation {
    /// Status payload, without the loaded handler.
    pub fn status(&self) -> GenerationStatus {
        match self {
            Self::Loaded {
                capability,
                file,
                class,
                ..
            } => GenerationStatus::Success {
                capability: capability.clone(),
                file: file.clone(),
                class: class.clone(),
            },
            Self::Declined(status) => status.clone(),
        }
    }
}

impl std::fmt::Debug for Activation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Activation").field(&self.status()).finish()
    }
}

/// Generates handler scripts and loads them into a registry.
pub struct HandlerGenerator {
    client: Arc<dyn GenerationClient>,
    handlers_dir: PathBuf,
    engine: Arc<Engine>,
}

impl HandlerGenerator {
    pub fn new(client: Arc<dyn GenerationClient>, handlers_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            handlers_dir: handlers_dir.into(),
            engine: Arc::new(sandboxed_engine()),
        }
    }

    pub fn handlers_dir(&self) -> &std::path::Path {
        &self.handlers_dir
    }

    /// Path a capability's script is persisted to.
    pub fn artifact_path(&self, capability: &CapabilityName) -> PathBuf {
        self.handlers_dir.join(capability.file_name())
    }

    /// Generate, validate and persist a handler script for `capability_name`.
    #[instrument(skip(self, requirements))]
    pub async fn generate(&self, capability_name: &str, requirements: &str) -> GenerationStatus {
        match self.try_generate(capability_name, requirements).await {
            Ok((capability, file)) => {
                info!(capability = %capability.name, file = %file.display(), "handler generated");
                GenerationStatus::Success {
                    capability: capability.name,
                    file,
                    class: capability.class_name,
                }
            }
            Err(err) => {
                warn!(error = %err, "handler generation failed");
                GenerationStatus::error(err.to_string())
            }
        }
    }

    async fn try_generate(
        &self,
        capability_name: &str,
        requirements: &str,
    ) -> Result<(CapabilityName, PathBuf), GeneratorError> {
        let capability = CapabilityName::parse(capability_name)?;
        let prompt = build_prompt(&capability.class_name, requirements);

        let raw = self
            .client
            .generate_code(GenerationRequest::new(prompt))
            .await?;
        let source = strip_code_fence(&raw);
        validate_handler_source(&self.engine, &source, &capability.class_name)?;

        let file = self.artifact_path(&capability);
        tokio::fs::create_dir_all(&self.handlers_dir)
            .await
            .map_err(|source| GeneratorError::Io {
                path: self.handlers_dir.clone(),
                source,
            })?;
        tokio::fs::write(&file, &source)
            .await
            .map_err(|source| GeneratorError::Io {
                path: file.clone(),
                source,
            })?;

        Ok((capability, file))
    }

    /// Load a previously generated handler.
    ///
    /// With the activation gate closed this returns `pending_approval` without
    /// touching the filesystem.
    #[instrument(skip(self))]
    pub async fn activate(&self, capability_name: &str) -> Activation {
        if !FeatureFlag::GeneratedHandlers.is_enabled() {
            return Activation::Declined(GenerationStatus::PendingApproval {
                message: format!(
                    "Set {}=1 to activate generated handlers.",
                    FeatureFlag::GeneratedHandlers.env_var()
                ),
                capability: None,
                file: None,
                class: None,
            });
        }

        match self.try_activate(capability_name).await {
            Ok(activation) => activation,
            Err(err) => {
                warn!(error = %err, "handler activation failed");
                Activation::Declined(GenerationStatus::error(err.to_string()))
            }
        }
    }

    async fn try_activate(&self, capability_name: &str) -> Result<Activation, GeneratorError> {
        let capability = CapabilityName::parse(capability_name)?;
        let file = self.artifact_path(&capability);

        let source = match tokio::fs::read_to_string(&file).await {
            Ok(source) => source,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(GeneratorError::MissingArtifact(file));
            }
            Err(source) => return Err(GeneratorError::Io { path: file, source }),
        };

        let handler = ScriptHandler::from_source(
            Arc::clone(&self.engine),
            &source,
            &capability.class_name,
        )?;

        info!(capability = %capability.name, "handler activated");
        Ok(Activation::Loaded {
            capability: capability.name,
            file,
            class: capability.class_name,
            handler: Arc::new(handler),
        })
    }

    /// Generate, activate and insert a handler into `registry`.
    ///
    /// A non-success status from either step is returned unchanged, except
    /// that a closed activation gate keeps the generated artifact details.
    pub async fn register(
        &self,
        registry: &HandlerRegistry,
        capability_name: &str,
        requirements: &str,
        key: Option<&str>,
    ) -> GenerationStatus {
        let generated = self.generate(capability_name, requirements).await;
        let GenerationStatus::Success {
            capability,
            file,
            class,
        } = generated
        else {
            return generated;
        };

        match self.activate(&capability).await {
            Activation::Loaded { handler, .. } => {
                let key = key
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map_or_else(|| capability.to_lowercase(), str::to_lowercase);
                registry.register(key.clone(), handler).await;
                GenerationStatus::Registered { capability, key }
            }
            Activation::Declined(GenerationStatus::PendingApproval { message, .. }) => {
                GenerationStatus::PendingApproval {
                    message,
                    capability: Some(capability),
                    file: Some(file),
                    class: Some(class),
                }
            }
            Activation::Declined(status) => status,
        }
    }
}

/// Deterministic generation prompt for a handler script.
pub fn build_prompt(class_name: &str, requirements: &str) -> String {
    format!(
        "Create a new Omniroute handler named: {class_name}.\n\
         Requirements: {requirements}.\n\n\
         Write it as a Rhai script.\n\
         Constraints:\n\
         - The output MUST define exactly one function: `fn {class_name}(task, context)`\n\
         - The function takes exactly {HANDLER_ARITY} parameters: the task text and a context object map\n\
         - The function MUST return an object map, e.g. `#{{ status: \"ok\" }}`\n\
         - Report expected failures as `#{{ error: \"...\" }}` instead of throwing\n\
         - Only `//!` documentation comments may appear outside the function\n\
         - Do not include any other top-level code (no statements, no helper functions, no imports)\n\n\
         Return ONLY the Rhai source code."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::generation::MockGenerationClient;
    use tempfile::TempDir;

    const VOICE_SCRIPT: &str = "fn VoiceAgent(task, context) { #{ status: \"ok\", task: task } }";

    fn generator(replies: &[&str]) -> (TempDir, Arc<MockGenerationClient>, HandlerGenerator) {
        let dir = TempDir::new().unwrap();
        let client = Arc::new(MockGenerationClient::with_replies(replies.iter().copied()));
        let generator = HandlerGenerator::new(client.clone(), dir.path().join("handlers"));
        (dir, client, generator)
    }

    #[test]
    fn test_capability_name_normalization() {
        let parsed = CapabilityName::parse("  VoiceAgent ").unwrap();
        assert_eq!(parsed.name, "Voice");
        assert_eq!(parsed.class_name, "VoiceAgent");
        assert_eq!(parsed.key(), "voice");
        assert_eq!(parsed.file_name(), "voice_agent.rhai");

        assert_eq!(CapabilityName::parse("Web2").unwrap().class_name, "Web2Agent");
    }

    #[test]
    fn test_invalid_capability_names() {
        for raw in ["voice", "", "Agent", "Voice Agent", "../Evil", "Voice-1"] {
            assert!(
                matches!(CapabilityName::parse(raw), Err(GeneratorError::InvalidName(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_prompt_is_deterministic_and_names_class() {
        let a = build_prompt("VoiceAgent", "speak text");
        let b = build_prompt("VoiceAgent", "speak text");
        assert_eq!(a, b);
        assert!(a.contains("fn VoiceAgent(task, context)"));
        assert!(a.contains("Requirements: speak text."));
    }

    #[tokio::test]
    async fn test_generate_persists_validated_source() {
        let fenced = format!("```rhai\n{VOICE_SCRIPT}\n```");
        let (dir, client, generator) = generator(&[fenced.as_str()]);

        let status = generator.generate("Voice", "speak").await;

        let expected_file = dir.path().join("handlers/voice_agent.rhai");
        assert_eq!(
            status,
            GenerationStatus::Success {
                capability: "Voice".to_string(),
                file: expected_file.clone(),
                class: "VoiceAgent".to_string(),
            }
        );
        assert_eq!(std::fs::read_to_string(expected_file).unwrap(), VOICE_SCRIPT);
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_generate_invalid_name_skips_client() {
        let (_dir, client, generator) = generator(&[VOICE_SCRIPT]);

        let status = generator.generate("voice", "").await;

        assert_eq!(status.label(), "error");
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_generate_rejects_wrong_name_and_persists_nothing() {
        let (dir, _client, generator) =
            generator(&["fn WebAgent(task, context) { #{} }"]);

        let status = generator.generate("Voice", "").await;

        let GenerationStatus::Error { message } = status else {
            panic!("expected error status");
        };
        assert!(message.contains("VoiceAgent"));
        assert!(!dir.path().join("handlers/voice_agent.rhai").exists());
    }

    #[tokio::test]
    async fn test_generate_rejects_two_definitions() {
        let two = format!("{VOICE_SCRIPT}\nfn VoiceAgentHelper(a, b) {{ 1 }}");
        let (_dir, _client, generator) = generator(&[two.as_str()]);

        assert_eq!(generator.generate("Voice", "").await.label(), "error");
    }

    #[tokio::test]
    async fn test_generate_reports_client_failure() {
        let (_dir, client, generator) = generator(&[]);
        client.push_error(GenerationError::AuthenticationFailed("bad key".to_string()));

        let GenerationStatus::Error { message } = generator.generate("Voice", "").await else {
            panic!("expected error status");
        };
        assert!(message.contains("bad key"));
    }

    #[tokio::test]
    async fn test_activate_gate_closed_touches_nothing() {
        let (dir, _client, generator) = generator(&[]);

        let activation = temp_env::async_with_vars(
            [(FeatureFlag::GeneratedHandlers.env_var(), None::<&str>)],
            generator.activate("Voice"),
        )
        .await;

        assert_eq!(activation.status().label(), "pending_approval");
        assert!(!dir.path().join("handlers").exists());
    }

    #[tokio::test]
    async fn test_activate_missing_file_is_error() {
        let (_dir, _client, generator) = generator(&[]);

        let activation = temp_env::async_with_vars(
            [(FeatureFlag::GeneratedHandlers.env_var(), Some("1"))],
            generator.activate("Voice"),
        )
        .await;

        let GenerationStatus::Error { message } = activation.status() else {
            panic!("expected error status");
        };
        assert!(message.contains("does not exist"));
    }

    #[tokio::test]
    async fn test_activate_revalidates_tampered_file() {
        let (dir, _client, generator) = generator(&[VOICE_SCRIPT]);
        assert!(generator.generate("Voice", "").await.is_success());

        let file = dir.path().join("handlers/voice_agent.rhai");
        std::fs::write(&file, format!("{VOICE_SCRIPT}\nlet side_effect = 1;")).unwrap();

        let activation = temp_env::async_with_vars(
            [(FeatureFlag::GeneratedHandlers.env_var(), Some("1"))],
            generator.activate("VoiceAgent"),
        )
        .await;

        assert_eq!(activation.status().label(), "error");
    }

    #[tokio::test]
    async fn test_register_inserts_handler_when_enabled() {
        let (_dir, _client, generator) = generator(&[VOICE_SCRIPT]);
        let registry = HandlerRegistry::new();

        let status = temp_env::async_with_vars(
            [(FeatureFlag::GeneratedHandlers.env_var(), Some("1"))],
            generator.register(&registry, "Voice", "speak", None),
        )
        .await;

        assert_eq!(
            status,
            GenerationStatus::Registered {
                capability: "Voice".to_string(),
                key: "voice".to_string(),
            }
        );
        let handler = registry.get("voice").await.unwrap();
        let result = handler
            .execute("say hi", &crate::domain::models::TaskContext::new())
            .await
            .unwrap();
        assert_eq!(result["task"], "say hi");
    }

    #[tokio::test]
    async fn test_register_with_custom_key() {
        let (_dir, _client, generator) = generator(&[VOICE_SCRIPT]);
        let registry = HandlerRegistry::new();

        let status = temp_env::async_with_vars(
            [(FeatureFlag::GeneratedHandlers.env_var(), Some("1"))],
            generator.register(&registry, "Voice", "", Some("Speech")),
        )
        .await;

        assert!(status.is_success());
        assert!(registry.contains("speech").await);
        assert!(!registry.contains("voice").await);
    }

    #[tokio::test]
    async fn test_register_gate_closed_keeps_artifact_details() {
        let (dir, _client, generator) = generator(&[VOICE_SCRIPT]);
        let registry = HandlerRegistry::new();

        let status = temp_env::async_with_vars(
            [(FeatureFlag::GeneratedHandlers.env_var(), None::<&str>)],
            generator.register(&registry, "Voice", "", None),
        )
        .await;

        let GenerationStatus::PendingApproval {
            capability, file, ..
        } = status
        else {
            panic!("expected pending approval");
        };
        assert_eq!(capability.as_deref(), Some("Voice"));
        assert_eq!(file, Some(dir.path().join("handlers/voice_agent.rhai")));
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_register_propagates_generation_error() {
        let (_dir, _client, generator) = generator(&["not a script {"]);
        let registry = HandlerRegistry::new();

        let status = generator.register(&registry, "Voice", "", None).await;

        assert_eq!(status.label(), "error");
        assert!(registry.is_empty().await);
    }
}
