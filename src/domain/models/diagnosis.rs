//! Structured interpretation of a handler failure.
//!
//! A [`Diagnosis`] is built from untrusted model output, so every field is
//! lenient: missing or `null` values fall back to their defaults instead of
//! failing the whole record.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// `error_type` used when the diagnosis itself could not be produced.
pub const DIAGNOSIS_FAILED: &str = "DiagnosisFailed";

/// Treat `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Diagnosis of a failed task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnosis {
    #[serde(default, deserialize_with = "null_as_default")]
    pub error_type: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub root_cause: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub fixable: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<SuggestedFix>,
}

impl Diagnosis {
    /// Terminal, non-fixable diagnosis recording why diagnosing failed.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            error_type: DIAGNOSIS_FAILED.to_string(),
            root_cause: reason.into(),
            fixable: false,
            suggested_fix: None,
        }
    }

    /// Interpret a parsed JSON object as a diagnosis.
    pub fn from_object(object: Map<String, Value>) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(object))
    }
}

/// Remediation proposed by the diagnosis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedFix {
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub fix_type: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub details: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_snippet: Option<String>,
}

impl SuggestedFix {
    pub fn kind(&self) -> FixType {
        FixType::parse(&self.fix_type)
    }

    /// Explicit `agent_type`, else the last whitespace-delimited token of `details`.
    pub fn resolved_agent_type(&self) -> Option<String> {
        non_blank(self.agent_type.as_deref())
            .or_else(|| self.details.split_whitespace().last())
            .map(str::to_string)
    }

    /// Explicit `file_path`, else the first whitespace-delimited token of `details`.
    pub fn resolved_file_path(&self) -> Option<String> {
        non_blank(self.file_path.as_deref())
            .or_else(|| self.details.split_whitespace().next())
            .map(str::to_string)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Remediation kinds understood by the self-healer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixType {
    NewAgent,
    CodeChange,
    ConfigUpdate,
    Unknown(String),
}

impl FixType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "new_agent" => Self::NewAgent,
            "code_change" => Self::CodeChange,
            "config_update" => Self::ConfigUpdate,
            other => Self::Unknown(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_full_diagnosis_deserializes() {
        let diagnosis = Diagnosis::from_object(object(json!({
            "error_type": "MissingAgent",
            "root_cause": "no handler",
            "fixable": true,
            "suggested_fix": {
                "type": "new_agent",
                "details": "missing VoiceAgent",
                "agent_type": "Voice"
            }
        })))
        .unwrap();

        assert!(diagnosis.fixable);
        let fix = diagnosis.suggested_fix.unwrap();
        assert_eq!(fix.kind(), FixType::NewAgent);
        assert_eq!(fix.resolved_agent_type().as_deref(), Some("Voice"));
    }

    #[test]
    fn test_nulls_and_missing_fields_default() {
        let diagnosis = Diagnosis::from_object(object(json!({
            "error_type": null,
            "fixable": null
        })))
        .unwrap();

        assert_eq!(diagnosis.error_type, "");
        assert!(!diagnosis.fixable);
        assert!(diagnosis.suggested_fix.is_none());
    }

    #[test]
    fn test_wrong_field_type_is_an_error() {
        let result = Diagnosis::from_object(object(json!({"fixable": "yes"})));
        assert!(result.is_err());
    }

    #[test]
    fn test_agent_type_falls_back_to_last_detail_token() {
        let fix = SuggestedFix {
            fix_type: "new_agent".to_string(),
            details: "create a Translator".to_string(),
            agent_type: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(fix.resolved_agent_type().as_deref(), Some("Translator"));
    }

    #[test]
    fn test_file_path_falls_back_to_first_detail_token() {
        let fix = SuggestedFix {
            fix_type: "code_change".to_string(),
            details: "handlers/web_agent.rhai needs a guard".to_string(),
            ..Default::default()
        };
        assert_eq!(
            fix.resolved_file_path().as_deref(),
            Some("handlers/web_agent.rhai")
        );
    }

    #[test]
    fn test_empty_details_resolve_to_none() {
        let fix = SuggestedFix::default();
        assert!(fix.resolved_agent_type().is_none());
        assert!(fix.resolved_file_path().is_none());
    }

    #[test]
    fn test_fix_type_parse() {
        assert_eq!(FixType::parse("code_change"), FixType::CodeChange);
        assert_eq!(FixType::parse("config_update"), FixType::ConfigUpdate);
        assert_eq!(
            FixType::parse("reboot"),
            FixType::Unknown("reboot".to_string())
        );
    }
}
