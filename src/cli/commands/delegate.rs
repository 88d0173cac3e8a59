//! `omniroute delegate`

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;
use serde_json::Value;

use crate::application::Orchestrator;
use crate::cli::output::{output, style_status, CommandOutput};
use crate::domain::models::{Config, TaskContext, AGENT_HINT_KEY};

#[derive(Args, Debug)]
pub struct DelegateArgs {
    /// Plain-text task description
    pub task: String,

    /// Task context as a JSON object
    #[arg(short, long, value_name = "JSON")]
    pub context: Option<String>,

    /// Route to this handler key instead of keyword matching
    #[arg(short, long, value_name = "KEY")]
    pub agent: Option<String>,
}

impl DelegateArgs {
    /// Parsed `--context`, with `--agent` folded in as the hint.
    pub fn task_context(&self) -> Result<TaskContext> {
        let mut context = match self.context.as_deref() {
            None => TaskContext::new(),
            Some(raw) => match serde_json::from_str::<Value>(raw).context("--context is not valid JSON")? {
                Value::Object(map) => map,
                _ => bail!("--context must be a JSON object"),
            },
        };

        if let Some(agent) = &self.agent {
            context.insert(AGENT_HINT_KEY.to_string(), Value::String(agent.clone()));
        }
        Ok(context)
    }
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct DelegateOutput {
    pub result: Value,
}

impl CommandOutput for DelegateOutput {
    fn to_human(&self) -> String {
        let body = serde_json::to_string_pretty(&self.result).unwrap_or_default();
        let header = match (
            self.result.get("error"),
            self.result.get("status").and_then(Value::as_str),
        ) {
            (_, Some(status)) => style_status(status).to_string(),
            (Some(_), None) => style_status("error").to_string(),
            (None, None) => style_status("success").to_string(),
        };
        format!("{header}\n{body}")
    }

    fn to_json(&self) -> Value {
        self.result.clone()
    }
}

pub async fn execute(args: DelegateArgs, config: Config, json_mode: bool) -> Result<()> {
    let context = args.task_context()?;
    let orchestrator = Orchestrator::from_config(config).await?;

    let result = orchestrator.delegate(&args.task, context).await;

    output(&DelegateOutput { result }, json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(context: Option<&str>, agent: Option<&str>) -> DelegateArgs {
        DelegateArgs {
            task: "run code".to_string(),
            context: context.map(str::to_string),
            agent: agent.map(str::to_string),
        }
    }

    #[test]
    fn test_context_parsing() {
        let context = args(Some(r#"{"code": "print(1)"}"#), Some("code"))
            .task_context()
            .unwrap();
        assert_eq!(context["code"], json!("print(1)"));
        assert_eq!(context[AGENT_HINT_KEY], json!("code"));
    }

    #[test]
    fn test_context_must_be_object() {
        assert!(args(Some("[1, 2]"), None).task_context().is_err());
        assert!(args(Some("{oops"), None).task_context().is_err());
        assert!(args(None, None).task_context().unwrap().is_empty());
    }
}
