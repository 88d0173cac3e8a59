use regex::Regex;
use std::sync::LazyLock;

static BEARER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Bearer\s+[A-Za-z0-9\-_\.]+").expect("valid regex")
});

static KEY_FIELD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(["']?(?:api_key|apikey|token|secret)["']?\s*[:=]\s*["']?)[A-Za-z0-9\-_\.]{8,}"#)
        .expect("valid regex")
});

/// Short, log-safe rendering of a secret: the first four characters and a marker.
pub fn redact_secret(secret: &str) -> String {
    if secret.chars().count() <= 8 {
        return "[REDACTED]".to_string();
    }
    let prefix: String = secret.chars().take(4).collect();
    format!("{prefix}...[REDACTED]")
}

/// Remove bearer tokens and `api_key=...` style values from free text
/// (response bodies, error messages) before it is logged.
pub fn scrub_secrets(message: &str) -> String {
    let scrubbed = BEARER_PATTERN.replace_all(message, "Bearer [TOKEN_REDACTED]");
    KEY_FIELD_PATTERN
        .replace_all(&scrubbed, "${1}[REDACTED]")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_secret_keeps_short_prefix() {
        assert_eq!(redact_secret("abcd1234efgh5678"), "abcd...[REDACTED]");
        assert_eq!(redact_secret("short"), "[REDACTED]");
    }

    #[test]
    fn test_scrub_bearer_token() {
        let scrubbed = scrub_secrets("Authorization: Bearer abc123def456");
        assert_eq!(scrubbed, "Authorization: Bearer [TOKEN_REDACTED]");
    }

    #[test]
    fn test_scrub_key_fields() {
        let scrubbed = scrub_secrets(r#"{"api_key": "sk-1234567890abcdef"}"#);
        assert!(!scrubbed.contains("sk-1234567890abcdef"));
        assert!(scrubbed.contains("[REDACTED]"));
    }

    #[test]
    fn test_plain_text_is_untouched() {
        assert_eq!(scrub_secrets("model not found"), "model not found");
    }
}
