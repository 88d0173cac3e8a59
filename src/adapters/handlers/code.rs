//! Code execution, debugging hints and container builds.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::domain::models::{CodeExecConfig, TaskContext};
use crate::domain::ports::{GenerationClient, Handler};
use crate::services::{FeatureFlag, HandlerGenerator};

const DEFAULT_IMAGE_TAG: &str = "omniroute-app";

/// Handler for code tasks.
///
/// Running snippets and building images are both off unless their feature
/// flag is set. Execution is a plain subprocess, not a sandbox.
pub struct CodeHandler {
    client: Arc<dyn GenerationClient>,
    generator: Arc<HandlerGenerator>,
    exec: CodeExecConfig,
}

impl CodeHandler {
    pub fn new(
        client: Arc<dyn GenerationClient>,
        generator: Arc<HandlerGenerator>,
        exec: CodeExecConfig,
    ) -> Self {
        Self {
            client,
            generator,
            exec,
        }
    }

    async fn run_snippet(&self, code: &str) -> Value {
        if code.is_empty() {
            return json!({ "error": "No code provided." });
        }
        if !FeatureFlag::CodeExec.is_enabled() {
            return json!({
                "error": format!(
                    "Code execution is disabled by default. Set {}=1 to enable.",
                    FeatureFlag::CodeExec.env_var()
                ),
            });
        }

        let child = Command::new(&self.exec.interpreter)
            .arg("-c")
            .arg(code)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let timeout = Duration::from_secs(self.exec.timeout_secs);
        match tokio::time::timeout(timeout, child).await {
            Ok(Ok(output)) => json!({
                "stdout": String::from_utf8_lossy(&output.stdout),
                "stderr": String::from_utf8_lossy(&output.stderr),
                "returncode": output.status.code(),
            }),
            Ok(Err(err)) => {
                warn!(interpreter = %self.exec.interpreter, error = %err, "failed to start interpreter");
                json!({ "error": format!("Failed to start {}: {err}", self.exec.interpreter) })
            }
            Err(_) => json!({ "error": "Execution timed out." }),
        }
    }

    fn debug_hints() -> Value {
        json!({
            "analysis": "Code looks syntactically correct. Add print statements for debugging.",
            "suggested_fixes": ["Add logging.", "Check variable types."],
        })
    }

    async fn improve(&self, code: &str, task: &str) -> Value {
        match self.client.improve_code(code, task).await {
            Ok(improved) => json!({
                "original_code": code,
                "improved_code": improved,
                "status": "success",
            }),
            Err(err) => json!({ "error": err.to_string() }),
        }
    }

    async fn generate_agent(&self, agent_type: &str) -> Value {
        let status = self
            .generator
            .generate(agent_type, "Generated via the code handler.")
            .await;
        serde_json::to_value(&status).unwrap_or_else(|err| json!({ "error": err.to_string() }))
    }

    async fn containerize(&self, context: &TaskContext) -> Value {
        if !FeatureFlag::DockerBuild.is_enabled() {
            return json!({
                "error": format!(
                    "Docker builds are disabled by default. Set {}=1 to enable.",
                    FeatureFlag::DockerBuild.env_var()
                ),
            });
        }

        let text = |key: &str, default: &str| {
            context
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or(default)
                .to_string()
        };
        let path = text("path", ".");
        let dockerfile = text("dockerfile", "Dockerfile");
        let tag = text("tag", DEFAULT_IMAGE_TAG);

        debug!(%path, %dockerfile, %tag, "building docker image");
        let output = Command::new("docker")
            .args(["build", "-f", &dockerfile, "-t", &tag, &path])
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => json!({ "status": "success", "tag": tag }),
            Ok(output) => json!({ "error": String::from_utf8_lossy(&output.stderr).trim() }),
            Err(err) => json!({ "error": format!("Failed to run docker: {err}") }),
        }
    }
}

#[async_trait]
impl Handler for CodeHandler {
    fn name(&self) -> &str {
        "code"
    }

    async fn execute(&self, task: &str, context: &TaskContext) -> anyhow::Result<Value> {
        let lower = task.to_lowercase();
        let code = context.get("code").and_then(Value::as_str).unwrap_or("");

        let result = if lower.contains("execute") || lower.contains("run") {
            self.run_snippet(code).await
        } else if lower.contains("debug") {
            Self::debug_hints()
        } else if lower.contains("improve") {
            self.improve(code, task).await
        } else if lower.contains("generate agent") {
            let agent_type = context
                .get("agent_type")
                .and_then(Value::as_str)
                .unwrap_or("");
            self.generate_agent(agent_type).await
        } else if lower.contains("docker") || lower.contains("container") {
            self.containerize(context).await
        } else {
            json!({ "error": format!("Code task not recognised: '{task}'") })
        };
        Ok(result)
    }
}
