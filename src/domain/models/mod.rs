pub mod config;
pub mod diagnosis;
pub mod status;
pub mod task;

pub use config::{
    is_project_subdir, CodeExecConfig, Config, GenerationConfig, LoggingConfig, MemoryConfig, RateLimitConfig,
    RetryConfig,
};
pub use diagnosis::{Diagnosis, FixType, SuggestedFix, DIAGNOSIS_FAILED};
pub use status::{GenerationStatus, RemediationAction, RemediationOutcome};
pub use task::{TaskContext, TaskRecord, TaskRequest, AGENT_HINT_KEY};
