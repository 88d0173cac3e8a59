//! Tagged status payloads returned by the generator and the self-healer.
//!
//! Expected failures never escape as errors; they are reported through these
//! enums, which serialize with a `status` tag so the wire shape is a flat
//! JSON object (`{"status": "proposed", ...}`).

use serde::Serialize;
use std::path::PathBuf;

use super::diagnosis::Diagnosis;

/// Outcome of a handler generation, activation or registration step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GenerationStatus {
    /// Source generated, validated and persisted
    Success {
        capability: String,
        file: PathBuf,
        class: String,
    },

    /// Handler generated, activated and inserted into the registry
    #[serde(rename = "success")]
    Registered { capability: String, key: String },

    /// Activation gate is closed
    PendingApproval {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        capability: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        file: Option<PathBuf>,
        #[serde(skip_serializing_if = "Option::is_none")]
        class: Option<String>,
    },

    Error { message: String },
}

impl GenerationStatus {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. } | Self::Registered { .. })
    }

    /// Wire value of the `status` tag.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success { .. } | Self::Registered { .. } => "success",
            Self::PendingApproval { .. } => "pending_approval",
            Self::Error { .. } => "error",
        }
    }
}

/// Concrete action taken (or proposed) by a remediation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemediationAction {
    GeneratedNewAgent,
    UpdateCode,
    UpdatedCode,
}

/// Terminal state of one recovery cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RemediationOutcome {
    Unfixable {
        error: String,
        diagnosis: Diagnosis,
    },

    Fixed {
        action: RemediationAction,
        #[serde(skip_serializing_if = "Option::is_none")]
        agent: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        file: Option<PathBuf>,
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<GenerationStatus>,
    },

    Proposed {
        action: RemediationAction,
        #[serde(skip_serializing_if = "Option::is_none")]
        agent: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        file: Option<PathBuf>,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<GenerationStatus>,
    },

    Failed {
        error: String,
    },

    NotImplemented {
        fix_type: String,
    },

    UnknownFixType {
        fix_type: String,
    },
}

impl RemediationOutcome {
    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed {
            error: error.into(),
        }
    }

    /// Wire value of the `status` tag.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unfixable { .. } => "unfixable",
            Self::Fixed { .. } => "fixed",
            Self::Proposed { .. } => "proposed",
            Self::Failed { .. } => "failed",
            Self::NotImplemented { .. } => "not_implemented",
            Self::UnknownFixType { .. } => "unknown_fix_type",
        }
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|err| {
            serde_json::json!({
                "status": self.label(),
                "error": format!("failed to serialize remediation outcome: {err}"),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generation_status_wire_shape() {
        let status = GenerationStatus::Success {
            capability: "Voice".to_string(),
            file: PathBuf::from("handlers/voice_agent.rhai"),
            class: "VoiceAgent".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            json!({
                "status": "success",
                "capability": "Voice",
                "file": "handlers/voice_agent.rhai",
                "class": "VoiceAgent"
            })
        );
    }

    #[test]
    fn test_registered_serializes_as_success() {
        let status = GenerationStatus::Registered {
            capability: "Voice".to_string(),
            key: "voice".to_string(),
        };
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["key"], "voice");
        assert!(status.is_success());
    }

    #[test]
    fn test_pending_approval_omits_absent_fields() {
        let status = GenerationStatus::PendingApproval {
            message: "gate closed".to_string(),
            capability: None,
            file: None,
            class: None,
        };
        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            json!({"status": "pending_approval", "message": "gate closed"})
        );
    }

    #[test]
    fn test_remediation_outcome_labels_match_wire_tags() {
        let outcomes = [
            RemediationOutcome::failed("nope"),
            RemediationOutcome::NotImplemented {
                fix_type: "config_update".to_string(),
            },
            RemediationOutcome::UnknownFixType {
                fix_type: "reboot".to_string(),
            },
            RemediationOutcome::Proposed {
                action: RemediationAction::UpdateCode,
                agent: None,
                file: Some(PathBuf::from("handlers/x.rhai")),
                code: Some(String::new()),
                message: None,
                result: None,
            },
        ];

        for outcome in outcomes {
            assert_eq!(outcome.to_value()["status"], outcome.label());
        }
    }

    #[test]
    fn test_fixed_with_nested_generation_result() {
        let outcome = RemediationOutcome::Fixed {
            action: RemediationAction::GeneratedNewAgent,
            agent: Some("Voice".to_string()),
            file: None,
            result: Some(GenerationStatus::Registered {
                capability: "Voice".to_string(),
                key: "voice".to_string(),
            }),
        };
        let value = outcome.to_value();
        assert_eq!(value["status"], "fixed");
        assert_eq!(value["action"], "generated_new_agent");
        assert_eq!(value["result"]["status"], "success");
        assert!(value.get("file").is_none());
    }
}
