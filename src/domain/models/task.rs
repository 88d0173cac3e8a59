//! Task request and the record sent to the memory store.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form parameters that accompany a task.
pub type TaskContext = Map<String, Value>;

/// Context key carrying an explicit handler hint.
pub const AGENT_HINT_KEY: &str = "agent";

/// One incoming unit of work. Lives only for the duration of a `delegate` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskRequest {
    /// Plain-text description of the work
    pub task: String,

    /// Optional parameters for the handler
    #[serde(default)]
    pub context: TaskContext,
}

impl TaskRequest {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            context: TaskContext::new(),
        }
    }

    pub fn with_context(task: impl Into<String>, context: TaskContext) -> Self {
        Self {
            task: task.into(),
            context,
        }
    }

    /// Normalized value of the `agent` hint, if one was given.
    ///
    /// Strings are trimmed and lowercased, `null` and blank values count as
    /// absent, other scalars are stringified.
    pub fn agent_hint(&self) -> Option<String> {
        let raw = match self.context.get(AGENT_HINT_KEY)? {
            Value::Null => return None,
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let hint = raw.trim().to_lowercase();
        (!hint.is_empty()).then_some(hint)
    }
}

/// Entry written to the external memory store after a delegation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task: String,
    pub context: TaskContext,
    pub result: Value,
    pub recorded_at: chrono::DateTime<chrono::Utc>,
}

impl TaskRecord {
    pub fn new(request: &TaskRequest, result: &Value) -> Self {
        Self {
            task: request.task.clone(),
            context: request.context.clone(),
            result: result.clone(),
            recorded_at: chrono::Utc::now(),
        }
    }
}
