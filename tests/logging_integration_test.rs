// Installs the global subscriber, so this file holds a single test.

use omniroute::infrastructure::logging::{LogConfig, LogFormat, LoggerImpl, RotationPolicy};
use std::fs;
use tempfile::TempDir;
use tracing::{info, warn};

#[test]
fn test_json_file_logging() {
    let temp_dir = TempDir::new().unwrap();

    let config = LogConfig {
        level: "info".to_string(),
        format: LogFormat::Json,
        log_dir: Some(temp_dir.path().to_path_buf()),
        enable_stdout: false,
        rotation: RotationPolicy::Never,
    };

    let logger = temp_env::with_var_unset("RUST_LOG", || LoggerImpl::init(&config)).unwrap();

    info!(key = "web", "handler selected");
    warn!(hint = "nonexistent", "unknown agent hint");
    tracing::debug!("filtered out at info level");

    // Dropping the guard flushes the non-blocking writer.
    drop(logger);

    let contents = fs::read_to_string(temp_dir.path().join("omniroute.log")).unwrap();
    let lines: Vec<serde_json::Value> = contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert!(lines
        .iter()
        .any(|l| l["fields"]["message"] == "handler selected" && l["fields"]["key"] == "web"));
    assert!(lines.iter().any(|l| l["level"] == "WARN"));
    assert!(!contents.contains("filtered out"));

    // A second global subscriber is refused.
    assert!(LoggerImpl::init(&LogConfig::default()).is_err());
}
