//! `omniroute diagnose`: parse a saved model reply the way recovery does.

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::io::Read;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Diagnosis;
use crate::services::parse_diagnosis;

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct DiagnosisOutput {
    pub diagnosis: Diagnosis,
}

impl CommandOutput for DiagnosisOutput {
    fn to_human(&self) -> String {
        let d = &self.diagnosis;
        let mut lines = vec![
            format!("Error type: {}", d.error_type),
            format!("Root cause: {}", d.root_cause),
            format!("Fixable: {}", d.fixable),
        ];
        if let Some(fix) = &d.suggested_fix {
            lines.push(format!("Suggested fix: {} ({:?})", fix.fix_type, fix.kind()));
            if !fix.details.is_empty() {
                lines.push(format!("  details: {}", fix.details));
            }
            if let Some(agent) = fix.resolved_agent_type() {
                lines.push(format!("  agent type: {agent}"));
            }
            if let Some(path) = fix.resolved_file_path() {
                lines.push(format!("  file path: {path}"));
            }
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.diagnosis).unwrap_or_default()
    }
}

pub fn execute(json_mode: bool) -> Result<()> {
    let mut reply = String::new();
    std::io::stdin()
        .read_to_string(&mut reply)
        .context("Failed to read model reply from stdin")?;

    let diagnosis = parse_diagnosis(&reply).map_err(|reason| anyhow!(reason))?;
    output(&DiagnosisOutput { diagnosis }, json_mode);
    Ok(())
}
