use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Main configuration structure for Omniroute
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Root that generated handlers and remediation writes are resolved against
    #[serde(default = "default_project_root")]
    pub project_root: PathBuf,

    /// Directory (relative to `project_root`) holding generated handler scripts
    #[serde(default = "default_handlers_dir")]
    pub handlers_dir: String,

    /// Directories (relative to `project_root`) remediation may write into
    #[serde(default = "default_writable_dirs")]
    pub writable_dirs: Vec<String>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Generation service configuration
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Retry policy configuration
    #[serde(default)]
    pub retry: RetryConfig,

    /// Task memory sink configuration
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Code handler execution settings
    #[serde(default)]
    pub code_exec: CodeExecConfig,
}

fn default_project_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_handlers_dir() -> String {
    "handlers".to_string()
}

fn default_writable_dirs() -> Vec<String> {
    vec!["handlers".to_string(), "tests".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_root: default_project_root(),
            handlers_dir: default_handlers_dir(),
            writable_dirs: default_writable_dirs(),
            logging: LoggingConfig::default(),
            generation: GenerationConfig::default(),
            rate_limit: RateLimitConfig::default(),
            retry: RetryConfig::default(),
            memory: MemoryConfig::default(),
            code_exec: CodeExecConfig::default(),
        }
    }
}

impl Config {
    /// Default configuration rooted at `project_root`.
    pub fn for_project(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            ..Self::default()
        }
    }

    /// Directory generated handler scripts are written to.
    pub fn handlers_path(&self) -> PathBuf {
        self.project_root.join(&self.handlers_dir)
    }
}

/// Whether `dir` names a directory strictly below the project root.
///
/// Only plain components are accepted: no root, no `.` and no `..`.
pub fn is_project_subdir(dir: &Path) -> bool {
    let mut components = dir.components().peekable();
    components.peek().is_some() && components.all(|c| matches!(c, Component::Normal(_)))
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stdout only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    /// File rotation: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}

/// Generation service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GenerationConfig {
    /// Base URL of the chat-completions service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature (0.0 - 2.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Completion token cap
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// API key (falls back to `MISTRAL_API_KEY`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_base_url() -> String {
    "https://api.mistral.ai".to_string()
}

fn default_model() -> String {
    "mistral-medium".to_string()
}

const fn default_temperature() -> f32 {
    0.3
}

const fn default_max_tokens() -> u32 {
    2048
}

const fn default_timeout_secs() -> u64 {
    60
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            api_key: None,
        }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RateLimitConfig {
    /// Requests per second allowed
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: f64,

    /// Burst size for token bucket
    #[serde(default = "default_burst_size")]
    pub burst_size: u32,
}

const fn default_requests_per_second() -> f64 {
    2.0
}

const fn default_burst_size() -> u32 {
    4
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_requests_per_second(),
            burst_size: default_burst_size(),
        }
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_max_retries() -> u32 {
    2
}

const fn default_initial_backoff_ms() -> u64 {
    1000
}

const fn default_max_backoff_ms() -> u64 {
    8000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Task memory sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MemoryConfig {
    /// Base URL of the memory store; records are dropped when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Object class records are stored under
    #[serde(default = "default_memory_class")]
    pub class_name: String,

    /// Optional bearer token for the store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_memory_class() -> String {
    "TaskHistory".to_string()
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            url: None,
            class_name: default_memory_class(),
            api_key: None,
        }
    }
}

/// Code handler execution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CodeExecConfig {
    /// Interpreter invoked as `<interpreter> -c <code>`
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// Wall-clock limit for one execution
    #[serde(default = "default_exec_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_interpreter() -> String {
    "python3".to_string()
}

const fn default_exec_timeout_secs() -> u64 {
    10
}

impl Default for CodeExecConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            timeout_secs: default_exec_timeout_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.handlers_dir, "handlers");
        assert_eq!(config.writable_dirs, vec!["handlers", "tests"]);
        assert_eq!(config.generation.model, "mistral-medium");
        assert_eq!(config.generation.max_tokens, 2048);
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.memory.class_name, "TaskHistory");
        assert_eq!(config.code_exec.timeout_secs, 10);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "handlers_dir: plugins\ngeneration:\n  model: small\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.handlers_dir, "plugins");
        assert_eq!(config.generation.model, "small");
        assert!((config.generation.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_project_subdir() {
        for dir in ["handlers", "tests/fixtures", "handlers/"] {
            assert!(is_project_subdir(Path::new(dir)), "{dir}");
        }
        for dir in ["", ".", "./", "..", "../handlers", "./handlers", "handlers/../src", "/etc"] {
            assert!(!is_project_subdir(Path::new(dir)), "{dir}");
        }
    }

    #[test]
    fn test_handlers_path_joins_project_root() {
        let config = Config::for_project("/srv/app");
        assert_eq!(config.handlers_path(), PathBuf::from("/srv/app/handlers"));
    }
}
