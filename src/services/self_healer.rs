//! Post-failure recovery.
//!
//! [`SelfHealer::monitor`] runs exactly one diagnose-and-remediate cycle for a
//! failed handler call and always ends in a terminal [`RemediationOutcome`].
//! Nothing here retries or loops.

use rhai::Engine;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::diagnosis_parser::parse_model_json;
use super::flags::FeatureFlag;
use super::handler_generator::HandlerGenerator;
use super::handler_registry::HandlerRegistry;
use super::handler_script::{check_syntax, sandboxed_engine};
use super::write_guard::WriteGuard;
use crate::domain::models::{
    Diagnosis, FixType, RemediationAction, RemediationOutcome, SuggestedFix, TaskContext,
};
use crate::domain::ports::{GenerationClient, GenerationRequest};

pub const MISSING_AGENT_TYPE: &str = "No agent type specified in suggested_fix.";
pub const MISSING_FILE_PATH: &str = "No file path specified in suggested_fix.";
pub const MISSING_CODE: &str = "No code snippet specified in suggested_fix.";

/// Diagnose-and-remediate engine invoked once per failed delegation.
pub struct SelfHealer {
    client: Arc<dyn GenerationClient>,
    generator: Arc<HandlerGenerator>,
    registry: Arc<HandlerRegistry>,
    guard: WriteGuard,
    engine: Engine,
}

impl SelfHealer {
    pub fn new(
        client: Arc<dyn GenerationClient>,
        generator: Arc<HandlerGenerator>,
        registry: Arc<HandlerRegistry>,
        guard: WriteGuard,
    ) -> Self {
        Self {
            client,
            generator,
            registry,
            guard,
            engine: sandboxed_engine(),
        }
    }

    /// Handle one handler fault.
    #[instrument(skip(self, context, error))]
    pub async fn monitor(
        &self,
        task: &str,
        context: &TaskContext,
        error: &anyhow::Error,
    ) -> RemediationOutcome {
        let trace = format!("{error:?}");
        let diagnosis = self.diagnose(task, context, &trace).await;
        info!(
            error_type = %diagnosis.error_type,
            fixable = diagnosis.fixable,
            "failure diagnosed"
        );

        let fix = diagnosis
            .suggested_fix
            .as_ref()
            .filter(|_| diagnosis.fixable);
        let outcome = match fix {
            Some(fix) => self.remediate(fix).await,
            None => RemediationOutcome::Unfixable {
                error: format!("{error:#}"),
                diagnosis,
            },
        };

        info!(status = outcome.label(), "recovery finished");
        outcome
    }

    /// Ask the generation service what went wrong.
    ///
    /// Any call or parse failure becomes a non-fixable `DiagnosisFailed` record.
    pub async fn diagnose(&self, task: &str, context: &TaskContext, trace: &str) -> Diagnosis {
        let prompt = build_diagnosis_prompt(task, context, trace);

        let reply = match self.client.generate_code(GenerationRequest::new(prompt)).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(error = %err, "diagnosis request failed");
                return Diagnosis::failed(format!("Diagnosis request failed: {err}"));
            }
        };

        parse_diagnosis(&reply).unwrap_or_else(|reason| {
            warn!(reason = %reason, "diagnosis reply could not be parsed");
            Diagnosis::failed(reason)
        })
    }

    async fn remediate(&self, fix: &SuggestedFix) -> RemediationOutcome {
        match fix.kind() {
            FixType::NewAgent => self.remediate_new_agent(fix).await,
            FixType::CodeChange => self.remediate_code_change(fix).await,
            FixType::ConfigUpdate => RemediationOutcome::NotImplemented {
                fix_type: fix.fix_type.clone(),
            },
            FixType::Unknown(fix_type) => RemediationOutcome::UnknownFixType { fix_type },
        }
    }

    async fn remediate_new_agent(&self, fix: &SuggestedFix) -> RemediationOutcome {
        let Some(agent) = fix.resolved_agent_type() else {
            return RemediationOutcome::failed(MISSING_AGENT_TYPE);
        };

        let result = self
            .generator
            .register(&self.registry, &agent, &fix.details, None)
            .await;

        if result.is_success() {
            RemediationOutcome::Fixed {
                action: RemediationAction::GeneratedNewAgent,
                agent: Some(agent),
                file: None,
                result: Some(result),
            }
        } else {
            RemediationOutcome::Proposed {
                action: RemediationAction::GeneratedNewAgent,
                agent: Some(agent),
                file: None,
                code: None,
                message: None,
                result: Some(result),
            }
        }
    }

    async fn remediate_code_change(&self, fix: &SuggestedFix) -> RemediationOutcome {
        let Some(requested) = fix.resolved_file_path() else {
            return RemediationOutcome::failed(MISSING_FILE_PATH);
        };

        let target = match self.guard.resolve(&requested) {
            Ok(target) => target,
            Err(err) => return RemediationOutcome::failed(err.to_string()),
        };

        let code = fix.code_snippet.clone().unwrap_or_default();

        if !FeatureFlag::SelfHealApply.is_enabled() {
            return RemediationOutcome::Proposed {
                action: RemediationAction::UpdateCode,
                agent: None,
                file: Some(target),
                code: Some(code),
                message: Some(format!(
                    "Set {}=1 to allow applying fixes",
                    FeatureFlag::SelfHealApply.env_var()
                )),
                result: None,
            };
        }

        if code.trim().is_empty() {
            return RemediationOutcome::failed(MISSING_CODE);
        }
        if let Err(err) = check_syntax(&self.engine, &code) {
            return RemediationOutcome::failed(err.to_string());
        }

        match write_file(&target, &code).await {
            Ok(()) => {
                info!(file = %target.display(), "code change applied");
                RemediationOutcome::Fixed {
                    action: RemediationAction::UpdatedCode,
                    agent: None,
                    file: Some(target),
                    result: None,
                }
            }
            Err(err) => RemediationOutcome::failed(format!(
                "Failed to write {}: {err}",
                target.display()
            )),
        }
    }
}

async fn write_file(target: &Path, code: &str) -> std::io::Result<()> {
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(target, code).await
}

/// Parse an untrusted model reply into a [`Diagnosis`].
pub fn parse_diagnosis(reply: &str) -> Result<Diagnosis, String> {
    let object = parse_model_json(reply).map_err(|err| err.to_string())?;
    Diagnosis::from_object(object).map_err(|err| format!("Invalid diagnosis record: {err}"))
}

/// Prompt asking for a structured diagnosis of a failed task.
pub fn build_diagnosis_prompt(task: &str, context: &TaskContext, trace: &str) -> String {
    let context = serde_json::to_string_pretty(&Value::Object(context.clone()))
        .unwrap_or_else(|_| "{}".to_string());

    format!(
        "An Omniroute handler failed while processing a task.\n\n\
         Task: {task}\n\
         Context: {context}\n\
         Error trace:\n{trace}\n\n\
         Diagnose the failure and reply with a single JSON object of this shape:\n\
         {{\n  \"error_type\": \"short error category\",\n  \"root_cause\": \"one sentence\",\n  \
         \"fixable\": true,\n  \"suggested_fix\": {{\n    \
         \"type\": \"new_agent | code_change | config_update\",\n    \
         \"details\": \"what to do\",\n    \"agent_type\": \"CamelCase capability name, for new_agent\",\n    \
         \"file_path\": \"path relative to the project root, for code_change\",\n    \
         \"code_snippet\": \"full replacement file content, for code_change\"\n  }}\n}}\n\
         Use \"fixable\": false when no automated fix is possible."
    )
}
